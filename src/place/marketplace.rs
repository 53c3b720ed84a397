//! Marketplace placement: a single plugin subtree plus one entry in the
//! shared `known_marketplaces.json` registry.

use super::{prune_empty_dirs, remove_file_if_present, write_under, PlaceContext, PlaceOutcome};
use crate::build::BuildOutput;
use crate::error::{InstallError, Result};
use crate::manifest::Manifest;
use crate::merge::to_stable_string;
use crate::BRAIN_ID;
use serde_json::{json, Value};
use std::path::Path;

const REGISTRY_REL: &str = "plugins/known_marketplaces.json";

pub fn place(output: &BuildOutput, ctx: &PlaceContext) -> Result<PlaceOutcome> {
    let mut outcome = PlaceOutcome::default();

    // Content files first; the registry only ever points at a complete
    // plugin root.
    for file in output.all_files() {
        ctx.cancel.check()?;
        let dest = write_under(&ctx.scope_root, &file.relative_path, &file.content)
            .map_err(placement_err)?;
        outcome.files.push(dest);
    }

    ctx.cancel.check()?;
    let registry_path = ctx.config_dir.join(REGISTRY_REL);
    let prior = update_registry(ctx, &registry_path, &ctx.scope_root)?;

    outcome.extras.registry_key = Some(BRAIN_ID.to_string());
    outcome.extras.registry_file = Some(registry_path);
    outcome.extras.prior_registry_value = prior;
    Ok(outcome)
}

pub fn clean(manifest: &Manifest, ctx: &PlaceContext) -> Result<()> {
    for file in &manifest.files {
        ctx.cancel.check()?;
        remove_file_if_present(file).map_err(placement_err)?;
        if let Some(parent) = file.parent() {
            prune_empty_dirs(parent, &ctx.scope_root);
        }
    }
    // The plugin root itself, if nothing else lives there.
    let _ = std::fs::remove_dir(&ctx.scope_root);

    ctx.cancel.check()?;
    let registry_path = manifest
        .extras
        .registry_file
        .clone()
        .unwrap_or_else(|| ctx.config_dir.join(REGISTRY_REL));
    let key = manifest
        .extras
        .registry_key
        .as_deref()
        .unwrap_or(BRAIN_ID)
        .to_string();
    restore_registry(
        ctx,
        &registry_path,
        &key,
        manifest.extras.prior_registry_value.as_ref(),
    )
}

/// Set the brain key in the registry, returning its prior value. The whole
/// read-modify-write runs under the path's lock.
fn update_registry(
    ctx: &PlaceContext,
    registry_path: &Path,
    install_location: &Path,
) -> Result<Option<Value>> {
    let lock = ctx.locks.for_path(registry_path);
    let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

    let mut registry = read_registry(registry_path)?;
    let Some(map) = registry.as_object_mut() else {
        return Err(InstallError::Placement(format!(
            "{} is not a JSON object",
            registry_path.display()
        )));
    };

    let prior = map.get(BRAIN_ID).cloned();
    map.insert(
        BRAIN_ID.to_string(),
        json!({ "installLocation": install_location.to_string_lossy() }),
    );

    if let Some(parent) = registry_path.parent() {
        std::fs::create_dir_all(parent).map_err(placement_err)?;
    }
    std::fs::write(registry_path, to_stable_string(&registry)).map_err(placement_err)?;
    Ok(prior)
}

/// Put the registry key back exactly as it was before install: restore the
/// prior value, or delete the key if there was none.
fn restore_registry(
    ctx: &PlaceContext,
    registry_path: &Path,
    key: &str,
    prior: Option<&Value>,
) -> Result<()> {
    let lock = ctx.locks.for_path(registry_path);
    let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

    if !registry_path.exists() {
        return Ok(());
    }
    let mut registry = read_registry(registry_path)?;
    let Some(map) = registry.as_object_mut() else {
        return Ok(());
    };
    match prior {
        Some(value) => {
            map.insert(key.to_string(), value.clone());
        }
        None => {
            map.remove(key);
        }
    }
    std::fs::write(registry_path, to_stable_string(&registry)).map_err(placement_err)?;
    Ok(())
}

fn read_registry(path: &Path) -> Result<Value> {
    match std::fs::read_to_string(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(json!({})),
        Err(e) => Err(placement_err(e)),
        Ok(text) => serde_json::from_str(&text).map_err(|e| {
            InstallError::Placement(format!("{} is not valid JSON: {}", path.display(), e))
        }),
    }
}

fn placement_err(e: std::io::Error) -> InstallError {
    InstallError::Placement(e.to_string())
}
