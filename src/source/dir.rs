use super::{check_rel, SourceEntry, TemplateSource};
use crate::error::{InstallError, Result};
use std::path::{Path, PathBuf};

/// A [`TemplateSource`] backed by a local directory.
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(InstallError::Source(format!(
                "Template source is not a directory: {}",
                root.display()
            )));
        }
        // Canonicalize once so abs_path results are stable regardless of
        // the caller's working directory.
        let root = root.canonicalize()?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, rel: &str) -> Result<PathBuf> {
        check_rel(rel)?;
        Ok(self.root.join(rel))
    }
}

impl TemplateSource for DirSource {
    fn list_dir(&self, rel: &str) -> Result<Vec<SourceEntry>> {
        let dir = self.resolve(rel)?;
        let mut entries = Vec::new();
        let read = std::fs::read_dir(&dir).map_err(|e| {
            InstallError::Source(format!("Cannot list {}: {}", dir.display(), e))
        })?;
        for entry in read {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_dir = entry.file_type()?.is_dir();
            entries.push(SourceEntry { name, is_dir });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read(&self, rel: &str) -> Result<Vec<u8>> {
        let path = self.resolve(rel)?;
        std::fs::read(&path)
            .map_err(|e| InstallError::Source(format!("Cannot read {}: {}", rel, e)))
    }

    fn exists(&self, rel: &str) -> bool {
        match self.resolve(rel) {
            Ok(path) => path.exists(),
            Err(_) => false,
        }
    }

    fn abs_path(&self, rel: &str) -> Option<PathBuf> {
        self.resolve(rel).ok()
    }
}
