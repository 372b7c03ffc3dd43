//! Preflight command - checks host tool availability.

use anyhow::{bail, Result};
use std::path::Path;

use crate::preflight;
use crate::request::Distro;

/// Execute the preflight command.
pub fn cmd_preflight(distro: Distro, remote: bool, kernel_src: &Path, strict: bool) -> Result<()> {
    let report = preflight::run_preflight(distro, remote, kernel_src);
    report.print();

    if !report.all_passed() {
        if strict {
            bail!("{} preflight check(s) failed", report.fail_count());
        }
        println!("Some checks failed. Use --strict to fail with a non-zero exit.");
    }
    Ok(())
}
