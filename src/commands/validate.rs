use super::load_descriptors;
use crate::cli::CommonArgs;
use crate::error::{InstallError, Result};

/// Validate the descriptor document, printing every accumulated issue.
pub fn execute(common: &CommonArgs) -> Result<i32> {
    match load_descriptors(common) {
        Ok(set) => {
            println!("OK: {} tool(s) declared", set.names().len());
            Ok(0)
        }
        Err(InstallError::Validation { issues }) => {
            for issue in issues {
                eprintln!("{}", issue);
            }
            Ok(1)
        }
        Err(other) => Err(other),
    }
}
