use super::load_descriptors;
use crate::cli::CommonArgs;
use crate::error::Result;

/// List the declared target tools.
pub fn execute(common: &CommonArgs) -> Result<i32> {
    let descriptors = load_descriptors(common)?;
    for (name, tool) in descriptors.iter() {
        println!("{}\t{}", name, tool.display_name);
    }
    Ok(0)
}
