//! Clean command - removes transient packaging state.

use anyhow::Result;
use std::path::Path;

use crate::distro;
use crate::request::Distro;

/// Clean target for the clean command.
pub enum CleanTarget {
    /// Transient packaging state only (default).
    Packaging,
    /// Packaging state plus the out/ directory.
    All,
}

/// Execute the clean command.
pub fn cmd_clean(distro: Distro, base_dir: &Path, target: CleanTarget) -> Result<()> {
    match target {
        CleanTarget::Packaging => distro::clean(distro, base_dir),
        CleanTarget::All => distro::clean_all(distro, base_dir),
    }
}
