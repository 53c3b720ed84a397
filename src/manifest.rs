//! Per-tool install ledgers.
//!
//! One JSON file per installed tool; written only after every placement
//! side-effect succeeded, read back on uninstall, removed once `clean`
//! finishes. The manifest is the authoritative install record.

use crate::error::{InstallError, Result};
use crate::merge::to_stable_string;
use crate::utils::path::expand_tilde;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const MANIFEST_VERSION: u64 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub version: u64,

    pub tool: String,

    /// RFC 3339 install timestamp.
    pub installed_at: String,

    /// Every path the engine wrote or mutated. Merge sidecars are
    /// intermediates and never appear here.
    #[serde(default)]
    pub files: Vec<PathBuf>,

    #[serde(default)]
    pub extras: ManifestExtras,
}

/// Tool-specific reversibility data.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ManifestExtras {
    /// Key this install inserted into the shared marketplace registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_key: Option<String>,

    /// Absolute path of the shared registry file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_file: Option<PathBuf>,

    /// Value the registry key held before install; `None` when the key was
    /// absent, so `clean` can restore exactly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_registry_value: Option<serde_json::Value>,

    /// Merge target path -> keys the engine inserted there. Uninstall
    /// touches only these.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub managed_keys_by_target: BTreeMap<String, Vec<String>>,
}

impl Manifest {
    pub fn new(tool: &str, files: Vec<PathBuf>, extras: ManifestExtras) -> Self {
        Self {
            version: MANIFEST_VERSION,
            tool: tool.to_string(),
            installed_at: chrono::Utc::now().to_rfc3339(),
            files,
            extras,
        }
    }
}

/// Directory of per-tool manifest files.
pub struct ManifestStore {
    dir: PathBuf,
}

impl ManifestStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().join("manifests"),
        }
    }

    /// Default user-scoped state directory.
    pub fn default_store() -> Result<Self> {
        let base = expand_tilde("~/.local/state/brain-install").ok_or_else(|| {
            InstallError::Manifest("Cannot determine HOME for the manifest store".to_string())
        })?;
        Ok(Self::new(base))
    }

    pub fn path_for(&self, tool: &str) -> PathBuf {
        self.dir.join(format!("{}.json", tool))
    }

    pub fn save(&self, manifest: &Manifest) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let value = serde_json::to_value(manifest)
            .map_err(|e| InstallError::Manifest(format!("Cannot encode manifest: {}", e)))?;
        std::fs::write(self.path_for(&manifest.tool), to_stable_string(&value))?;
        Ok(())
    }

    /// Load a tool's manifest; `None` when the tool is not installed.
    pub fn load(&self, tool: &str) -> Result<Option<Manifest>> {
        let path = self.path_for(tool);
        let text = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
            Ok(text) => text,
        };

        // Check the version before committing to the full schema.
        let raw: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| InstallError::Manifest(format!("{}: {}", path.display(), e)))?;
        match raw.get("version").and_then(serde_json::Value::as_u64) {
            Some(MANIFEST_VERSION) => {}
            Some(other) => return Err(InstallError::ManifestVersion(other)),
            None => {
                return Err(InstallError::Manifest(format!(
                    "{}: missing version field",
                    path.display()
                )))
            }
        }

        let manifest: Manifest = serde_json::from_value(raw)
            .map_err(|e| InstallError::Manifest(format!("{}: {}", path.display(), e)))?;
        Ok(Some(manifest))
    }

    pub fn remove(&self, tool: &str) -> Result<()> {
        match std::fs::remove_file(self.path_for(tool)) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => Ok(other?),
        }
    }
}
