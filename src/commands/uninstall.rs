use super::{load_descriptors, open_store};
use crate::cli::CommonArgs;
use crate::driver::{Driver, Outcome};
use crate::error::Result;

/// Run `clean` for each tool. Missing manifests are warnings, not errors;
/// the exit code is non-zero only when a clean itself failed.
pub fn execute(tools: &[String], scope: Option<&str>, common: &CommonArgs) -> Result<i32> {
    let descriptors = load_descriptors(common)?;
    let store = open_store(common)?;
    let driver = Driver::new(&descriptors, &store);

    let selected = if tools.is_empty() {
        descriptors.names()
    } else {
        tools.to_vec()
    };
    let reports = driver.uninstall_all(&selected, scope);

    let mut failed = false;
    for report in &reports {
        match &report.result {
            Ok(Outcome::NoManifest) => {
                eprintln!(
                    "Warning: no manifest for {}; nothing to uninstall",
                    report.name
                );
            }
            Ok(_) => println!("Uninstalled brain for {}", report.name),
            Err(e) => {
                failed = true;
                eprintln!("{}:", report.name);
                for line in e.to_string().lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }
    Ok(if failed { 2 } else { 0 })
}
