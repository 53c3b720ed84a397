//! Copy-and-merge placement: content files land as siblings inside the
//! user's config directory, and merge sidecars fold into files the user
//! also owns.

use super::{prune_empty_dirs, remove_file_if_present, write_under, PlaceContext, PlaceOutcome};
use crate::build::{BuildOutput, MergePayload};
use crate::descriptor::ToolDescriptor;
use crate::error::{InstallError, Result};
use crate::manifest::Manifest;
use crate::merge::{apply_merge, remove_managed_key, to_stable_string};
use std::path::Path;

pub fn place(output: &BuildOutput, ctx: &PlaceContext) -> Result<PlaceOutcome> {
    let mut outcome = PlaceOutcome::default();

    // Content files first, sidecars second: a crash mid-way leaves either
    // untouched targets or a manifest-recoverable state.
    for file in output.all_files() {
        if file.is_merge_sidecar() {
            continue;
        }
        ctx.cancel.check()?;
        let dest = write_under(&ctx.scope_root, &file.relative_path, &file.content)
            .map_err(|e| InstallError::Placement(e.to_string()))?;
        outcome.files.push(dest);
    }

    for file in output.all_files() {
        if !file.is_merge_sidecar() {
            continue;
        }
        ctx.cancel.check()?;
        let payload: MergePayload = serde_json::from_slice(&file.content).map_err(|e| {
            InstallError::Placement(format!(
                "Malformed merge sidecar {}: {}",
                file.relative_path, e
            ))
        })?;
        let target_rel = ToolDescriptor::target_of_sidecar(&file.relative_path).ok_or_else(
            || {
                InstallError::Placement(format!(
                    "Not a merge sidecar path: {}",
                    file.relative_path
                ))
            },
        )?;
        let target = ctx.scope_root.join(&target_rel);
        apply_merge(&target, &payload)?;

        outcome
            .extras
            .managed_keys_by_target
            .insert(target.to_string_lossy().into_owned(), payload.managed_keys);
        outcome.files.push(target);
    }

    Ok(outcome)
}

pub fn clean(manifest: &Manifest, ctx: &PlaceContext) -> Result<()> {
    for file in &manifest.files {
        ctx.cancel.check()?;
        let key = file.to_string_lossy().into_owned();
        match manifest.extras.managed_keys_by_target.get(&key) {
            Some(managed_keys) => unmerge(file, managed_keys)?,
            None => {
                remove_file_if_present(file)
                    .map_err(|e| InstallError::Placement(e.to_string()))?;
                if let Some(parent) = file.parent() {
                    prune_empty_dirs(parent, &ctx.scope_root);
                }
            }
        }
    }
    Ok(())
}

/// Remove only the managed keys from a merge target, preserving everything
/// the user added. The target file itself is never deleted.
fn unmerge(target: &Path, managed_keys: &[String]) -> Result<()> {
    let text = match std::fs::read_to_string(target) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
        Ok(text) => text,
    };
    let mut value: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| InstallError::Merge {
            path: target.to_path_buf(),
            reason: e.to_string(),
        })?;
    for key in managed_keys {
        remove_managed_key(&mut value, key);
    }
    std::fs::write(target, to_stable_string(&value))
        .map_err(|e| InstallError::Placement(e.to_string()))?;
    Ok(())
}
