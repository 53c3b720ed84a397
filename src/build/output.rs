use serde::{Deserialize, Serialize};

/// One file the build produced. A pure value: the placement strategy picks
/// the final root for `relative_path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub relative_path: String,
    pub content: Vec<u8>,
}

impl GeneratedFile {
    pub fn new(relative_path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            relative_path: relative_path.into(),
            content: content.into(),
        }
    }

    /// Whether this file is a merge sidecar rather than real content.
    pub fn is_merge_sidecar(&self) -> bool {
        self.relative_path.ends_with(".merge.json")
    }
}

/// Build result for one tool, bucketed by content category.
#[derive(Debug, Default)]
pub struct BuildOutput {
    pub agents: Vec<GeneratedFile>,
    pub skills: Vec<GeneratedFile>,
    pub commands: Vec<GeneratedFile>,
    pub rules: Vec<GeneratedFile>,
    pub hooks: Vec<GeneratedFile>,
    pub mcp: Vec<GeneratedFile>,
    pub plugin: Vec<GeneratedFile>,
}

impl BuildOutput {
    /// Every generated file, in bucket order.
    pub fn all_files(&self) -> Vec<&GeneratedFile> {
        self.agents
            .iter()
            .chain(self.skills.iter())
            .chain(self.commands.iter())
            .chain(self.rules.iter())
            .chain(self.hooks.iter())
            .chain(self.mcp.iter())
            .chain(self.plugin.iter())
            .collect()
    }
}

/// Sidecar payload emitted for merge-strategy hook/MCP targets. The
/// placement strategy consumes this, never the raw target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergePayload {
    pub managed_keys: Vec<String>,
    pub content: serde_json::Value,
}
