//! Descriptor document parsing and validation.
//!
//! Validation is strict and exhaustive: the whole document is checked and
//! every violation reported together, each with a stable `tools.<name>.`
//! message prefix.

use super::definition::{DeliveryStrategy, ToolDescriptor};
use crate::error::{InstallError, Result};
use crate::utils::path::expand_tilde;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Shipped descriptor set, embedded at compile time.
const EMBEDDED_DESCRIPTORS: &str = include_str!("../../descriptors/tools.yaml");

#[derive(Debug, Serialize, Deserialize)]
struct DescriptorDoc {
    tools: BTreeMap<String, ToolDescriptor>,
}

/// Validated set of tool descriptors, keyed by tool name.
#[derive(Debug)]
pub struct DescriptorSet {
    tools: BTreeMap<String, Arc<ToolDescriptor>>,
}

impl DescriptorSet {
    /// Load the descriptor set shipped with the binary.
    pub fn load_embedded() -> Result<Self> {
        Self::from_str(EMBEDDED_DESCRIPTORS)
    }

    /// Load a descriptor document from a file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            InstallError::Source(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_str(&text)
    }

    /// Parse and validate a descriptor document.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Result<Self> {
        let doc: DescriptorDoc = serde_yaml::from_str(text).map_err(|e| {
            InstallError::Validation {
                issues: vec![format!("tools: {}", e)],
            }
        })?;

        let mut issues = Vec::new();
        let mut tools = BTreeMap::new();

        if doc.tools.is_empty() {
            issues.push("tools: at least one tool must be declared".to_string());
        }

        for (name, mut tool) in doc.tools {
            tool.name = name.clone();
            validate_tool(&tool, &mut issues);
            tools.insert(name, Arc::new(tool));
        }

        if issues.is_empty() {
            Ok(Self { tools })
        } else {
            Err(InstallError::Validation { issues })
        }
    }

    /// Serialize back to the document form. `from_str` of the result yields
    /// an equal set.
    pub fn to_yaml(&self) -> Result<String> {
        let doc = DescriptorDoc {
            tools: self
                .tools
                .iter()
                .map(|(k, v)| (k.clone(), (**v).clone()))
                .collect(),
        };
        serde_yaml::to_string(&doc)
            .map_err(|e| InstallError::Render(format!("Cannot serialize descriptors: {}", e)))
    }

    pub fn get(&self, name: &str) -> Option<Arc<ToolDescriptor>> {
        self.tools.get(name).cloned()
    }

    /// All tool names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Arc<ToolDescriptor>)> {
        self.tools.iter()
    }

    /// Resolve a scope name to an absolute path, expanding `~`.
    ///
    /// Scope lookup failure is typed separately from validation failure so
    /// callers can tell a bad flag from a bad descriptor file.
    pub fn resolve_scope(&self, tool: &ToolDescriptor, scope: Option<&str>) -> Result<PathBuf> {
        let scope = scope.unwrap_or(&tool.default_scope);
        let template = tool
            .scopes
            .get(scope)
            .ok_or_else(|| InstallError::UnknownScope {
                tool: tool.name.clone(),
                scope: scope.to_string(),
            })?;
        resolve_path_template(template, &tool.name)
    }

    /// Resolve a tool's config directory, expanding `~`.
    pub fn resolve_config_dir(&self, tool: &ToolDescriptor) -> Result<PathBuf> {
        resolve_path_template(&tool.config_dir, &tool.name)
    }
}

fn resolve_path_template(template: &str, tool: &str) -> Result<PathBuf> {
    expand_tilde(template).ok_or_else(|| {
        InstallError::UnknownScope {
            tool: tool.to_string(),
            scope: template.to_string(),
        }
    })
}

fn validate_tool(tool: &ToolDescriptor, issues: &mut Vec<String>) {
    let mut push = |field: &str, message: &str| {
        issues.push(format!("tools.{}.{}: {}", tool.name, field, message));
    };

    if tool.display_name.trim().is_empty() {
        push("displayName", "must not be empty");
    }
    if tool.config_dir.trim().is_empty() {
        push("configDir", "must not be empty");
    }
    if tool.scopes.is_empty() {
        push("scopes", "must declare at least one scope");
    }
    if !tool.scopes.contains_key(&tool.default_scope) {
        push("defaultScope", "must name a declared scope");
    }
    if tool.agents.frontmatter.is_empty() {
        push("agents.frontmatter", "must list at least one key");
    }
    if !tool.rules.extension.starts_with('.') {
        push("rules.extension", "must begin with '.'");
    }
    if tool.hooks.strategy != DeliveryStrategy::None && tool.hooks.target.trim().is_empty() {
        push("hooks.target", "must be set unless strategy is none");
    }
    if tool.mcp.strategy != DeliveryStrategy::None && tool.mcp.target.trim().is_empty() {
        push("mcp.target", "must be set unless strategy is none");
    }
}
