pub mod detect;
pub mod install;
pub mod list;
pub mod uninstall;
pub mod validate;

use crate::cli::CommonArgs;
use crate::descriptor::DescriptorSet;
use crate::error::Result;
use crate::manifest::ManifestStore;

/// Load the descriptor set named by the CLI, or the embedded default.
pub fn load_descriptors(common: &CommonArgs) -> Result<DescriptorSet> {
    match &common.descriptors {
        Some(path) => DescriptorSet::from_path(path),
        None => DescriptorSet::load_embedded(),
    }
}

/// Open the manifest store named by the CLI, or the default user-scoped
/// one.
pub fn open_store(common: &CommonArgs) -> Result<ManifestStore> {
    match &common.state_dir {
        Some(dir) => Ok(ManifestStore::new(dir)),
        None => ManifestStore::default_store(),
    }
}
