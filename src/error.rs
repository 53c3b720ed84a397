use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InstallError {
    #[error("Invalid tool descriptors:\n{}", .issues.join("\n"))]
    Validation { issues: Vec<String> },

    #[error("Tool '{tool}' has no scope named '{scope}'")]
    UnknownScope { tool: String, scope: String },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Template source error: {0}")]
    Source(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Placement error: {0}")]
    Placement(String),

    #[error("Merge target {path} is not valid JSON: {reason}")]
    Merge { path: PathBuf, reason: String },

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Manifest version {0} is not supported")]
    ManifestVersion(u64),

    #[error("Cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, InstallError>;
