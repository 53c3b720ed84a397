use super::load_descriptors;
use crate::cli::CommonArgs;
use crate::detect::is_brain_installed;
use crate::error::Result;

/// Print one `tool: installed|absent` row per descriptor.
pub fn execute(common: &CommonArgs) -> Result<i32> {
    let descriptors = load_descriptors(common)?;
    for (name, tool) in descriptors.iter() {
        let installed = is_brain_installed(tool).unwrap_or(false);
        println!("{}: {}", name, if installed { "installed" } else { "absent" });
    }
    Ok(0)
}
