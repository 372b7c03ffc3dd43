//! Build command - runs one kernel package build.

use anyhow::Result;

use crate::distro;
use crate::request::BuildRequest;

/// Execute the build command. Returns the wrapped tool's exit code.
pub fn cmd_build(request: &BuildRequest) -> Result<i32> {
    let code = distro::build(request)?;
    if code == 0 {
        println!("\nBuild complete.");
    }
    Ok(code)
}
