//! Per-distro build invokers.
//!
//! Each submodule knows one native packaging tool: how to derive its
//! environment and arguments from a [`BuildRequest`](crate::request::BuildRequest),
//! where it leaves artifacts, and what its transient build state looks like
//! for cleaning.

pub mod arch;
pub mod debian;
pub mod fedora;

use anyhow::Result;
use std::path::Path;

use crate::request::{BuildRequest, Distro};

/// Run one package build. Returns the wrapped tool's exit code.
pub fn build(request: &BuildRequest) -> Result<i32> {
    match request.distro {
        Distro::Arch => arch::build(request),
        Distro::Debian => debian::build(request),
        Distro::Fedora => fedora::build(request),
    }
}

/// Remove transient packaging state for a distro.
pub fn clean(distro: Distro, base_dir: &Path) -> Result<()> {
    match distro {
        Distro::Arch => arch::clean(base_dir),
        Distro::Debian => debian::clean(base_dir),
        Distro::Fedora => fedora::clean(base_dir),
    }
}

/// [`clean`] plus the out/ directory.
pub fn clean_all(distro: Distro, base_dir: &Path) -> Result<()> {
    clean(distro, base_dir)?;
    let out = base_dir.join("out");
    if out.exists() {
        println!("Removing {}...", out.display());
        std::fs::remove_dir_all(&out)?;
    }
    Ok(())
}

/// Toolchain prefix for a cross-compile target (e.g. "aarch64" becomes
/// "aarch64-linux-gnu-").
pub fn toolchain_prefix(target: &str) -> String {
    format!("{}-linux-gnu-", target)
}
