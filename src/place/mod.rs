//! Placement strategies: turning a `BuildOutput` into bytes on disk.
//!
//! Strategy dispatch is the one place the engine branches, and it branches
//! on the descriptor's `placement` enum, never on tool names.

mod copy_merge;
mod marketplace;

use crate::build::BuildOutput;
use crate::descriptor::{Placement, ToolDescriptor};
use crate::driver::CancelToken;
use crate::error::Result;
use crate::manifest::{Manifest, ManifestExtras};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Everything a strategy needs besides the build output.
pub struct PlaceContext<'a> {
    pub tool: &'a ToolDescriptor,
    /// Resolved scope path: the plugin root (marketplace) or the tool's
    /// config directory (copy_and_merge).
    pub scope_root: PathBuf,
    /// Resolved `configDir`; hosts the shared marketplace registry.
    pub config_dir: PathBuf,
    pub locks: &'a RegistryLocks,
    pub cancel: &'a CancelToken,
}

/// What placement wrote, destined for the manifest.
#[derive(Debug, Default)]
pub struct PlaceOutcome {
    pub files: Vec<PathBuf>,
    pub extras: ManifestExtras,
}

/// Write the build output to disk per the descriptor's strategy.
pub fn place(output: &BuildOutput, ctx: &PlaceContext) -> Result<PlaceOutcome> {
    match ctx.tool.placement {
        Placement::Marketplace => marketplace::place(output, ctx),
        Placement::CopyAndMerge => copy_merge::place(output, ctx),
    }
}

/// Reverse an install using only the manifest and the descriptor.
pub fn clean(manifest: &Manifest, ctx: &PlaceContext) -> Result<()> {
    match ctx.tool.placement {
        Placement::Marketplace => marketplace::clean(manifest, ctx),
        Placement::CopyAndMerge => copy_merge::clean(manifest, ctx),
    }
}

/// Per-path mutexes serializing read-modify-write cycles on shared files
/// (the marketplace registry, when several tools share a config dir).
#[derive(Default)]
pub struct RegistryLocks {
    inner: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl RegistryLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock for one absolute path. Hold its guard across the whole
    /// read-modify-write sequence.
    pub fn for_path(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Write a generated file under `root`, creating parent directories.
pub(crate) fn write_under(root: &Path, rel: &str, content: &[u8]) -> std::io::Result<PathBuf> {
    let dest = root.join(rel);
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&dest, content)?;
    Ok(dest)
}

/// Remove a file, treating "already gone" as success.
pub(crate) fn remove_file_if_present(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Remove now-empty directories from `start` upward, stopping before
/// `stop`.
pub(crate) fn prune_empty_dirs(start: &Path, stop: &Path) {
    let mut current = Some(start.to_path_buf());
    while let Some(dir) = current {
        if dir == stop || !dir.starts_with(stop) {
            break;
        }
        // remove_dir only removes empty directories; a failure means the
        // directory still has user content, so stop climbing.
        if std::fs::remove_dir(&dir).is_err() {
            break;
        }
        current = dir.parent().map(Path::to_path_buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_locks_same_path_same_lock() {
        let locks = RegistryLocks::new();
        let a = locks.for_path(Path::new("/tmp/reg.json"));
        let b = locks.for_path(Path::new("/tmp/reg.json"));
        assert!(Arc::ptr_eq(&a, &b));

        let c = locks.for_path(Path::new("/tmp/other.json"));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_prune_empty_dirs_stops_at_content() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let deep = root.join("a/b/c");
        std::fs::create_dir_all(&deep).unwrap();
        std::fs::write(root.join("a/keep.txt"), "x").unwrap();

        prune_empty_dirs(&deep, root);
        assert!(!root.join("a/b").exists());
        assert!(root.join("a").exists());
    }
}
