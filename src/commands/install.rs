use super::{load_descriptors, open_store};
use crate::cli::CommonArgs;
use crate::driver::Driver;
use crate::error::Result;
use crate::source::{DirSource, TemplateSource};
use std::path::PathBuf;

/// Run build + place for the requested tools. Returns the process exit
/// code: 0 when every tool succeeded, 2 when any failed.
pub fn execute(
    tools: &[String],
    scope: Option<&str>,
    source_dir: Option<PathBuf>,
    common: &CommonArgs,
) -> Result<i32> {
    let descriptors = load_descriptors(common)?;
    let store = open_store(common)?;

    let source_dir = match source_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let source = DirSource::new(&source_dir)?;
    let config = source.config()?;

    let driver = Driver::new(&descriptors, &store);

    // Ctrl-C trips the token; workers stop at their next placement step
    // and already-written files stay for a later uninstall to reverse.
    let cancel = driver.cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || cancel.cancel()) {
        eprintln!("Warning: cannot install interrupt handler: {}", e);
    }

    let selected = driver.select_tools(tools, &config.tools);
    let reports = driver.install_all(&source, &selected, scope);

    let mut failed = false;
    for report in &reports {
        match &report.result {
            Ok(_) => println!("Installed brain for {}", report.name),
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
