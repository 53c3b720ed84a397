//! Serde schema for the tool-descriptor document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One target tool, loaded once per process and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Stable identifier; also the manifest key. Filled from the document's
    /// map key.
    #[serde(default, skip)]
    pub name: String,

    pub display_name: String,

    /// When true, generated basenames carry the brain prefix so the tool's
    /// config tree can be shared with user-authored files.
    #[serde(default)]
    pub prefix: bool,

    pub config_dir: String,

    /// Named install locations; values are absolute path templates with an
    /// optional `~/` head.
    #[serde(default)]
    pub scopes: BTreeMap<String, String>,

    pub default_scope: String,

    pub agents: AgentRules,

    pub rules: RuleRules,

    pub hooks: JsonDelivery,

    pub mcp: JsonDelivery,

    pub manifest: ManifestRules,

    pub detection: Detection,

    pub placement: Placement,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentRules {
    /// Ordered whitelist of frontmatter keys this tool consumes; everything
    /// else is dropped when rendering agents.
    #[serde(default)]
    pub frontmatter: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RuleRules {
    /// Destination extension for rules, including the leading dot.
    #[serde(default)]
    pub extension: String,

    /// Frontmatter appended to every rule; descriptor values win over the
    /// rule's own keys.
    #[serde(default)]
    pub extra_frontmatter: BTreeMap<String, serde_yaml::Value>,

    /// Source rule stem -> destination subdirectory, overriding the default
    /// `rules/`. `"."` routes to the tool root.
    #[serde(default)]
    pub routing: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonDelivery {
    pub strategy: DeliveryStrategy,

    /// Destination path, relative to the placement root.
    #[serde(default)]
    pub target: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStrategy {
    Direct,
    Merge,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManifestRules {
    #[serde(rename = "type")]
    pub kind: ManifestKind,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ManifestKind {
    /// Emit plugin + marketplace descriptor files alongside the content.
    Marketplace,
    /// No extra files; the install ledger is the only manifest.
    FileList,
}

/// Probe answering "is the brain already installed for this tool?" without
/// consulting the manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Detection {
    JsonKey { file: String, key: String },
    PrefixScan { dirs: Vec<String> },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Marketplace,
    CopyAndMerge,
}

impl ToolDescriptor {
    /// Sidecar path for a merge-strategy target: `hooks.json` becomes
    /// `hooks.merge.json`.
    pub fn sidecar_path(target: &str) -> String {
        match target.strip_suffix(".json") {
            Some(head) => format!("{}.merge.json", head),
            None => format!("{}.merge.json", target),
        }
    }

    /// Invert [`Self::sidecar_path`].
    pub fn target_of_sidecar(sidecar: &str) -> Option<String> {
        sidecar
            .strip_suffix(".merge.json")
            .map(|head| format!("{}.json", head))
    }
}
