//! The parallel driver: one worker thread per tool, errors aggregated per
//! tool, cooperative cancellation.

use crate::build;
use crate::descriptor::DescriptorSet;
use crate::error::{InstallError, Result};
use crate::manifest::{Manifest, ManifestStore};
use crate::place::{self, PlaceContext, RegistryLocks};
use crate::source::TemplateSource;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag shared between the driver and its
/// workers. Workers check it before each placement step; long individual
/// writes are not interrupted.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Error out if cancellation was observed.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(InstallError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Per-tool outcome of a batch run. One failing tool never aborts its
/// siblings.
pub struct ToolReport {
    pub name: String,
    pub result: Result<Outcome>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Installed,
    Uninstalled,
    /// Uninstall found no manifest; reported as a warning, not an error.
    NoManifest,
}

pub struct Driver<'a> {
    pub descriptors: &'a DescriptorSet,
    pub store: &'a ManifestStore,
    pub locks: RegistryLocks,
    pub cancel: CancelToken,
}

impl<'a> Driver<'a> {
    pub fn new(descriptors: &'a DescriptorSet, store: &'a ManifestStore) -> Self {
        Self {
            descriptors,
            store,
            locks: RegistryLocks::new(),
            cancel: CancelToken::new(),
        }
    }

    /// Tools to operate on: the explicit list, else the kit's declared
    /// tools, else every descriptor.
    pub fn select_tools(&self, requested: &[String], declared: &[String]) -> Vec<String> {
        if !requested.is_empty() {
            requested.to_vec()
        } else if !declared.is_empty() {
            declared.to_vec()
        } else {
            self.descriptors.names()
        }
    }

    /// Build and place each tool concurrently.
    pub fn install_all(
        &self,
        source: &dyn TemplateSource,
        tools: &[String],
        scope: Option<&str>,
    ) -> Vec<ToolReport> {
        self.run_batch(tools, |name| self.install_one(source, name, scope))
    }

    /// Clean each tool concurrently, using only manifests and descriptors.
    pub fn uninstall_all(&self, tools: &[String], scope: Option<&str>) -> Vec<ToolReport> {
        self.run_batch(tools, |name| self.uninstall_one(name, scope))
    }

    fn run_batch<F>(&self, tools: &[String], work: F) -> Vec<ToolReport>
    where
        F: Fn(&str) -> Result<Outcome> + Sync,
    {
        let mut reports = Vec::with_capacity(tools.len());
        std::thread::scope(|scope| {
            let handles: Vec<_> = tools
                .iter()
                .map(|name| (name.clone(), scope.spawn(|| work(name))))
                .collect();
            for (name, handle) in handles {
                let result = match handle.join() {
                    Ok(result) => result,
                    Err(_) => Err(InstallError::Placement(format!(
                        "Worker for '{}' panicked",
                        name
                    ))),
                };
                reports.push(ToolReport { name, result });
            }
        });
        reports
    }

    fn install_one(
        &self,
        source: &dyn TemplateSource,
        name: &str,
        scope: Option<&str>,
    ) -> Result<Outcome> {
        self.cancel.check()?;
        let tool = self
            .descriptors
            .get(name)
            .ok_or_else(|| InstallError::UnknownTool(name.to_string()))?;
        let scope_root = self.descriptors.resolve_scope(&tool, scope)?;
        let config_dir = self.descriptors.resolve_config_dir(&tool)?;
        let config = source.config()?;

        // Build is pure; placement does the I/O; the manifest lands last so
        // a failure never leaves an orphan ledger.
        let output = build::build(source, &tool, &config)?;
        self.cancel.check()?;

        let ctx = PlaceContext {
            tool: tool.as_ref(),
            scope_root,
            config_dir,
            locks: &self.locks,
            cancel: &self.cancel,
        };
        let placed = place::place(&output, &ctx)?;

        self.cancel.check()?;
        let manifest = Manifest::new(name, placed.files, placed.extras);
        self.store.save(&manifest)?;
        Ok(Outcome::Installed)
    }

    fn uninstall_one(&self, name: &str, scope: Option<&str>) -> Result<Outcome> {
        self.cancel.check()?;
        let tool = self
            .descriptors
            .get(name)
            .ok_or_else(|| InstallError::UnknownTool(name.to_string()))?;
        let Some(manifest) = self.store.load(name)? else {
            return Ok(Outcome::NoManifest);
        };
        let scope_root = self.descriptors.resolve_scope(&tool, scope)?;
        let config_dir = self.descriptors.resolve_config_dir(&tool)?;

        let ctx = PlaceContext {
            tool: tool.as_ref(),
            scope_root,
            config_dir,
            locks: &self.locks,
            cancel: &self.cancel,
        };
        // A failing clean leaves the manifest in place so a retry can
        // finish the job.
        place::clean(&manifest, &ctx)?;
        self.store.remove(name)?;
        Ok(Outcome::Uninstalled)
    }
}
