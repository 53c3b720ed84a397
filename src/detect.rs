//! Advisory install probes.
//!
//! These answer "does it look like the brain is installed?" without the
//! manifest, so UIs can warn about stale installs from earlier versions.
//! The manifest stays the authoritative record.

use crate::descriptor::{Detection, ToolDescriptor};
use crate::error::Result;
use crate::utils::path::expand_tilde;
use crate::BRAIN_PREFIX;
use std::path::Path;

/// Probe the tool's config directory per its descriptor.
pub fn is_brain_installed(tool: &ToolDescriptor) -> Result<bool> {
    let Some(config_dir) = expand_tilde(&tool.config_dir) else {
        return Ok(false);
    };
    is_brain_installed_at(tool, &config_dir)
}

/// Probe against an explicit config directory (tests point this at a temp
/// dir).
pub fn is_brain_installed_at(tool: &ToolDescriptor, config_dir: &Path) -> Result<bool> {
    match &tool.detection {
        Detection::JsonKey { file, key } => {
            let path = config_dir.join(file);
            let text = match std::fs::read_to_string(&path) {
                Err(_) => return Ok(false),
                Ok(text) => text,
            };
            // Unparsable probe files read as "absent"; detection is
            // advisory.
            let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) else {
                return Ok(false);
            };
            Ok(!lookup(&value, key).unwrap_or(&serde_json::Value::Null).is_null())
        }
        Detection::PrefixScan { dirs } => {
            for dir in dirs {
                let dir = config_dir.join(dir);
                let Ok(entries) = std::fs::read_dir(&dir) else {
                    continue;
                };
                for entry in entries.flatten() {
                    if entry
                        .file_name()
                        .to_string_lossy()
                        .starts_with(BRAIN_PREFIX)
                    {
                        return Ok(true);
                    }
                }
            }
            Ok(false)
        }
    }
}

fn lookup<'a>(value: &'a serde_json::Value, dotted: &str) -> Option<&'a serde_json::Value> {
    let mut current = value;
    for segment in dotted.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}
