//! Composable rule directories.
//!
//! A directory inside the template source becomes composable by carrying an
//! `_order.yaml` describing an ordered section list plus per-variant
//! overrides, inserts, and variable files. Composition resolves that plan
//! for one variant (the target tool's name) into a single string.

use crate::error::{InstallError, Result};
use crate::source::TemplateSource;
use crate::utils::path::join_rel;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Marker file that makes a directory composable.
pub const ORDER_FILE: &str = "_order.yaml";

/// Section-list token marking where variant inserts land.
const VARIANT_INSERT: &str = "VARIANT_INSERT";

#[derive(Debug, Deserialize)]
struct OrderFile {
    #[serde(default)]
    #[allow(dead_code)]
    name: String,

    #[serde(default)]
    sections: Vec<String>,

    #[serde(default)]
    variants: BTreeMap<String, VariantSpec>,
}

#[derive(Debug, Deserialize, Default)]
struct VariantSpec {
    /// Frontmatter file prepended verbatim, resolved under the variant dir.
    #[serde(default)]
    frontmatter: Option<String>,

    /// Variables file (YAML string -> string mapping) under the variant dir.
    #[serde(default)]
    variables: Option<String>,

    /// Base section ID -> override file under the variant dir.
    #[serde(default)]
    overrides: BTreeMap<String, String>,

    /// Section IDs resolved from the variant dir, injected in order at the
    /// VARIANT_INSERT position.
    #[serde(default, rename = "inserts_at_VARIANT_INSERT")]
    inserts: Vec<String>,
}

/// Whether the directory at `dir_rel` is composable.
pub fn is_composable(source: &dyn TemplateSource, dir_rel: &str) -> bool {
    source.exists(&join_rel(dir_rel, ORDER_FILE))
}

/// Compose the directory for one variant, applying variable substitutions.
///
/// `extra_vars` overlays the variant's variables file; the caller wins on
/// conflicts. Unknown `{placeholder}` occurrences are left intact.
pub fn compose(
    source: &dyn TemplateSource,
    dir_rel: &str,
    variant: &str,
    extra_vars: &BTreeMap<String, String>,
) -> Result<String> {
    let order_text = source.read_to_string(&join_rel(dir_rel, ORDER_FILE))?;
    let order: OrderFile = serde_yaml::from_str(&order_text).map_err(|e| {
        InstallError::Render(format!("{}/{}: {}", dir_rel, ORDER_FILE, e))
    })?;

    let spec = order.variants.get(variant).ok_or_else(|| {
        InstallError::Render(format!(
            "{}/{}: no variant entry for '{}'",
            dir_rel, ORDER_FILE, variant
        ))
    })?;

    let sections_dir = join_rel(dir_rel, "sections");
    let variant_dir = join_rel(&join_rel(dir_rel, "variants"), variant);

    // Resolve the section list. Missing non-insert sections read as empty.
    let mut parts = Vec::new();
    for entry in &order.sections {
        let id = entry.trim();
        if id == VARIANT_INSERT {
            for insert in &spec.inserts {
                parts.push(read_section(source, &variant_dir, insert.trim()));
            }
        } else if let Some(override_name) = spec.overrides.get(id) {
            parts.push(read_section(source, &variant_dir, override_name.trim()));
        } else {
            parts.push(read_section(source, &sections_dir, id));
        }
    }

    let body = parts
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut composed = match &spec.frontmatter {
        Some(file) => {
            let mut fm = source
                .read_optional(&join_rel(&variant_dir, file))
                .unwrap_or_default();
            if !fm.is_empty() && !fm.ends_with('\n') {
                fm.push('\n');
            }
            format!("{}{}", fm, body)
        }
        None => body,
    };

    let mut vars = load_variables(source, &variant_dir, spec)?;
    for (key, value) in extra_vars {
        vars.insert(key.clone(), value.clone());
    }
    for (key, value) in &vars {
        composed = composed.replace(&format!("{{{}}}", key), value);
    }

    Ok(composed)
}

fn read_section(source: &dyn TemplateSource, dir: &str, id: &str) -> String {
    source
        .read_optional(&join_rel(dir, &format!("{}.md", id)))
        .unwrap_or_default()
}

fn load_variables(
    source: &dyn TemplateSource,
    variant_dir: &str,
    spec: &VariantSpec,
) -> Result<BTreeMap<String, String>> {
    let Some(file) = &spec.variables else {
        return Ok(BTreeMap::new());
    };
    // A declared but missing variables file is treated as empty.
    let Some(text) = source.read_optional(&join_rel(variant_dir, file)) else {
        return Ok(BTreeMap::new());
    };
    let raw: BTreeMap<String, serde_yaml::Value> = serde_yaml::from_str(&text)
        .map_err(|e| InstallError::Render(format!("{}/{}: {}", variant_dir, file, e)))?;

    let mut vars = BTreeMap::new();
    for (key, value) in raw {
        let rendered = match value {
            serde_yaml::Value::String(s) => s,
            serde_yaml::Value::Bool(b) => b.to_string(),
            serde_yaml::Value::Number(n) => n.to_string(),
            serde_yaml::Value::Null => String::new(),
            other => {
                return Err(InstallError::Render(format!(
                    "{}/{}: variable '{}' must be a scalar, got {:?}",
                    variant_dir, file, key, other
                )))
            }
        };
        vars.insert(key, rendered);
    }
    Ok(vars)
}
