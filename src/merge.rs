//! JSON merge against user-owned config files.
//!
//! The contract with uninstall: the engine records the keys it inserted and
//! promises to touch only those on the way out. Objects deep-merge key by
//! key; arrays are replaced, not concatenated, because hook and MCP arrays
//! are ordered tuples.

use crate::build::MergePayload;
use crate::error::{InstallError, Result};
use serde_json::Value;
use std::path::Path;

/// Serialize deterministically: stable key ordering, 2-space indentation,
/// trailing newline.
pub fn to_stable_string(value: &Value) -> String {
    let mut text = serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string());
    text.push('\n');
    text
}

/// Deep-merge `incoming` into `base`. Objects merge recursively; any other
/// value (including arrays) replaces the existing one.
pub fn deep_merge(base: &mut Value, incoming: &Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(incoming_map)) => {
            for (key, value) in incoming_map {
                match base_map.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, incoming) => *base = incoming.clone(),
    }
}

/// Apply a merge payload against the target file.
///
/// A missing target is created from the payload content wholesale. An
/// existing one is parsed, merged in memory, and written in a single write,
/// so a failed parse never damages the file on disk.
pub fn apply_merge(target: &Path, payload: &MergePayload) -> Result<()> {
    let merged = match std::fs::read_to_string(target) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => payload.content.clone(),
        Err(e) => return Err(e.into()),
        Ok(text) => {
            let mut existing: Value =
                serde_json::from_str(&text).map_err(|e| InstallError::Merge {
                    path: target.to_path_buf(),
                    reason: e.to_string(),
                })?;
            deep_merge(&mut existing, &payload.content);
            existing
        }
    };

    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(target, to_stable_string(&merged))?;
    Ok(())
}

/// Remove one dotted managed key (e.g. `mcpServers.brain-memory`) from a
/// JSON tree. Returns whether anything was removed.
pub fn remove_managed_key(root: &mut Value, dotted: &str) -> bool {
    let mut segments = dotted.split('.').peekable();
    let mut current = root;
    while let Some(segment) = segments.next() {
        let Value::Object(map) = current else {
            return false;
        };
        if segments.peek().is_none() {
            return map.remove(segment).is_some();
        }
        match map.get_mut(segment) {
            Some(next) => current = next,
            None => return false,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deep_merge_objects() {
        let mut base = json!({"hooks": {"user": 1}, "keep": true});
        deep_merge(&mut base, &json!({"hooks": {"brain": 2}}));
        assert_eq!(base, json!({"hooks": {"user": 1, "brain": 2}, "keep": true}));
    }

    #[test]
    fn test_arrays_are_replaced() {
        let mut base = json!({"events": [1, 2, 3]});
        deep_merge(&mut base, &json!({"events": [9]}));
        assert_eq!(base, json!({"events": [9]}));
    }

    #[test]
    fn test_scalar_conflict_incoming_wins() {
        let mut base = json!({"a": "old"});
        deep_merge(&mut base, &json!({"a": "new"}));
        assert_eq!(base, json!({"a": "new"}));
    }

    #[test]
    fn test_stable_output_sorted_keys() {
        let text = to_stable_string(&json!({"zeta": 1, "alpha": 2}));
        let zeta = text.find("zeta").unwrap();
        let alpha = text.find("alpha").unwrap();
        assert!(alpha < zeta);
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_apply_merge_creates_missing_target() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("hooks.json");
        let payload = MergePayload {
            managed_keys: vec!["brainHook".to_string()],
            content: json!({"brainHook": {"event": "start"}}),
        };
        apply_merge(&target, &payload).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
        assert_eq!(written, payload.content);
    }

    #[test]
    fn test_apply_merge_preserves_user_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("hooks.json");
        std::fs::write(&target, r#"{"userHook": {"event": "test"}}"#).unwrap();

        let payload = MergePayload {
            managed_keys: vec!["brainHook".to_string()],
            content: json!({"brainHook": {"event": "start"}}),
        };
        apply_merge(&target, &payload).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
        assert_eq!(written["userHook"]["event"], "test");
        assert_eq!(written["brainHook"]["event"], "start");
    }

    #[test]
    fn test_apply_merge_unparsable_target_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("hooks.json");
        std::fs::write(&target, "not json at all").unwrap();

        let payload = MergePayload {
            managed_keys: vec![],
            content: json!({}),
        };
        let err = apply_merge(&target, &payload).unwrap_err();
        assert!(matches!(err, InstallError::Merge { .. }));
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "not json at all");
    }

    #[test]
    fn test_remove_managed_key_nested() {
        let mut root = json!({"mcpServers": {"brain-memory": {}, "user": {}}});
        assert!(remove_managed_key(&mut root, "mcpServers.brain-memory"));
        assert_eq!(root, json!({"mcpServers": {"user": {}}}));
        assert!(!remove_managed_key(&mut root, "mcpServers.brain-memory"));
    }

    #[test]
    fn test_remove_managed_key_top_level() {
        let mut root = json!({"brainHook": 1, "userHook": 2});
        assert!(remove_managed_key(&mut root, "brainHook"));
        assert_eq!(root, json!({"userHook": 2}));
    }
}
