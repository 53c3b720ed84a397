//! Read-only views over the canonical agent kit.
//!
//! The engine never touches the kit directly; everything flows through the
//! [`TemplateSource`] trait so a local directory and an embedded archive are
//! interchangeable.

mod dir;
mod memory;

pub use dir::DirSource;
pub use memory::MemorySource;

use crate::error::{InstallError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Well-known path of the kit's global config document.
pub const CONFIG_FILE: &str = "brain.config.json";

/// A directory entry returned by [`TemplateSource::list_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Read-only handle over the canonical kit.
///
/// All paths are `/`-joined and relative to the source root; implementations
/// must refuse to escape it.
pub trait TemplateSource: Send + Sync {
    /// List the entries of a directory, sorted by name.
    fn list_dir(&self, rel: &str) -> Result<Vec<SourceEntry>>;

    /// Read a file's bytes. Missing files are a [`InstallError::Source`].
    fn read(&self, rel: &str) -> Result<Vec<u8>>;

    /// Whether a file or directory exists at the path.
    fn exists(&self, rel: &str) -> bool;

    /// Absolute on-disk path for a relative path, when the source has a
    /// real root. Sources without one (embedded archives) return `None`.
    fn abs_path(&self, rel: &str) -> Option<PathBuf>;

    /// Read a file as UTF-8 text.
    fn read_to_string(&self, rel: &str) -> Result<String> {
        let bytes = self.read(rel)?;
        String::from_utf8(bytes)
            .map_err(|_| InstallError::Source(format!("{} is not valid UTF-8", rel)))
    }

    /// Read an optional file; missing files are treated as absent, not as
    /// errors.
    fn read_optional(&self, rel: &str) -> Option<String> {
        if self.exists(rel) {
            self.read_to_string(rel).ok()
        } else {
            None
        }
    }

    /// Parse the kit's global config document. A missing document yields
    /// the default (empty) config.
    fn config(&self) -> Result<BrainConfig> {
        let Some(text) = self.read_optional(CONFIG_FILE) else {
            return Ok(BrainConfig::default());
        };
        serde_json::from_str(&text)
            .map_err(|e| InstallError::Source(format!("{}: {}", CONFIG_FILE, e)))
    }
}

/// The kit's global config: declared target tools, per-agent frontmatter
/// overrides, and the hook/MCP source locations.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct BrainConfig {
    /// Target tools the kit declares itself for. Empty means "every tool in
    /// the descriptor set".
    #[serde(default)]
    pub tools: Vec<String>,

    /// Frontmatter overrides keyed by agent stem. Unknown keys in an
    /// override record are dropped at load time.
    #[serde(default)]
    pub agents: BTreeMap<String, AgentOverride>,

    #[serde(default)]
    pub hooks: HooksSourceConfig,

    #[serde(default)]
    pub mcp: McpSourceConfig,
}

/// Per-agent frontmatter override record. Only these well-known fields are
/// honored.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AgentOverride {
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub color: Option<String>,

    #[serde(default)]
    pub tools: Option<String>,
}

impl AgentOverride {
    /// Override value for a frontmatter key, if this record carries one.
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "description" => self.description.as_deref(),
            "model" => self.model.as_deref(),
            "color" => self.color.as_deref(),
            "tools" => self.tools.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HooksSourceConfig {
    /// Directory holding `<tool-name>.json` hook documents.
    #[serde(default = "default_hooks_dir")]
    pub dir: String,

    /// Directory of hook scripts, copied with layout preserved.
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: String,
}

impl Default for HooksSourceConfig {
    fn default() -> Self {
        Self {
            dir: default_hooks_dir(),
            scripts_dir: default_scripts_dir(),
        }
    }
}

fn default_hooks_dir() -> String {
    "hooks".to_string()
}

fn default_scripts_dir() -> String {
    "hooks/scripts".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct McpSourceConfig {
    /// Path of the MCP server config document.
    #[serde(default = "default_mcp_source")]
    pub source: String,
}

impl Default for McpSourceConfig {
    fn default() -> Self {
        Self {
            source: default_mcp_source(),
        }
    }
}

fn default_mcp_source() -> String {
    "configs/mcp.json".to_string()
}

/// Reject paths that would escape the source root.
pub(crate) fn check_rel(rel: &str) -> Result<()> {
    if rel.starts_with('/') || rel.split('/').any(|seg| seg == "..") {
        return Err(InstallError::Source(format!(
            "Path escapes the template source: {}",
            rel
        )));
    }
    Ok(())
}
