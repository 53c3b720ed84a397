use super::{check_rel, SourceEntry, TemplateSource};
use crate::error::{InstallError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// A [`TemplateSource`] held entirely in memory.
///
/// Stands in for the embedded-archive case and backs the interface contract
/// tests. Has no on-disk root, so `abs_path` always returns `None`.
#[derive(Default)]
pub struct MemorySource {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, replacing any previous content at the path.
    pub fn insert(&mut self, rel: impl Into<String>, content: impl Into<Vec<u8>>) -> &mut Self {
        self.files.insert(rel.into(), content.into());
        self
    }
}

impl TemplateSource for MemorySource {
    fn list_dir(&self, rel: &str) -> Result<Vec<SourceEntry>> {
        check_rel(rel)?;
        let prefix = if rel.is_empty() {
            String::new()
        } else {
            format!("{}/", rel.trim_end_matches('/'))
        };

        let mut seen = BTreeSet::new();
        let mut entries = Vec::new();
        for key in self.files.keys() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            let (name, is_dir) = match rest.split_once('/') {
                Some((head, _)) => (head, true),
                None => (rest, false),
            };
            if seen.insert(name.to_string()) {
                entries.push(SourceEntry {
                    name: name.to_string(),
                    is_dir,
                });
            }
        }
        if entries.is_empty() && !self.exists(rel) {
            return Err(InstallError::Source(format!("Cannot list {}: not found", rel)));
        }
        Ok(entries)
    }

    fn read(&self, rel: &str) -> Result<Vec<u8>> {
        check_rel(rel)?;
        self.files
            .get(rel)
            .cloned()
            .ok_or_else(|| InstallError::Source(format!("Cannot read {}: not found", rel)))
    }

    fn exists(&self, rel: &str) -> bool {
        if check_rel(rel).is_err() {
            return false;
        }
        if rel.is_empty() || self.files.contains_key(rel) {
            return true;
        }
        let prefix = format!("{}/", rel.trim_end_matches('/'));
        self.files.keys().any(|k| k.starts_with(&prefix))
    }

    fn abs_path(&self, _rel: &str) -> Option<PathBuf> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_dir_collapses_subdirs() {
        let mut source = MemorySource::new();
        source
            .insert("agents/architect.md", "a")
            .insert("skills/my-skill/SKILL.md", "s")
            .insert("skills/my-skill/extra/notes.md", "n");

        let top = source.list_dir("skills").unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].name, "my-skill");
        assert!(top[0].is_dir);

        let inner = source.list_dir("skills/my-skill").unwrap();
        let names: Vec<_> = inner.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["SKILL.md", "extra"]);
    }

    #[test]
    fn test_exists_for_implied_dirs() {
        let mut source = MemorySource::new();
        source.insert("hooks/scripts/run.sh", "#!/bin/sh\n");
        assert!(source.exists("hooks"));
        assert!(source.exists("hooks/scripts"));
        assert!(source.exists("hooks/scripts/run.sh"));
        assert!(!source.exists("hooks/other"));
    }

    #[test]
    fn test_abs_path_is_none() {
        let source = MemorySource::new();
        assert!(source.abs_path("configs/mcp.json").is_none());
    }
}
