//! Kernel .config adjustments.
//!
//! Debian builds pin the package version through KDEB_PKGVERSION, so the
//! kernel's own localversion machinery has to be silenced first: an enabled
//! CONFIG_LOCALVERSION or CONFIG_LOCALVERSION_AUTO would leak into the
//! release string and break the computed version.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// The same rewrite as [`disable_localversion`], as a sed expression for
/// remote execution inside a container.
pub const LOCALVERSION_SED_EXPR: &str = concat!(
    r#"s|CONFIG_LOCALVERSION=.*|CONFIG_LOCALVERSION=\"\"|g"#,
    ";",
    r#"s|CONFIG_LOCALVERSION_AUTO=.*|CONFIG_LOCALVERSION_AUTO=n|g"#,
);

/// Rewrite .config content so the kernel adds no localversion of its own.
/// Only the two localversion keys are touched; every other line passes
/// through unchanged.
pub fn disable_localversion(content: &str) -> String {
    let mut result = String::with_capacity(content.len());
    for line in content.lines() {
        if line.starts_with("CONFIG_LOCALVERSION=") {
            result.push_str("CONFIG_LOCALVERSION=\"\"");
        } else if line.starts_with("CONFIG_LOCALVERSION_AUTO=") {
            result.push_str("CONFIG_LOCALVERSION_AUTO=n");
        } else {
            result.push_str(line);
        }
        result.push('\n');
    }
    result
}

/// Apply [`disable_localversion`] to `<kernel_src>/.config` in place.
pub fn disable_localversion_in(kernel_src: &Path) -> Result<()> {
    let config_path = kernel_src.join(".config");
    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    fs::write(&config_path, disable_localversion(&content))
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_localversion_keys() {
        let input = "\
CONFIG_LOCALVERSION=\"-surface\"
CONFIG_LOCALVERSION_AUTO=y
CONFIG_DEFAULT_HOSTNAME=\"(none)\"
";
        let out = disable_localversion(input);
        assert!(out.contains("CONFIG_LOCALVERSION=\"\"\n"));
        assert!(out.contains("CONFIG_LOCALVERSION_AUTO=n\n"));
        assert!(out.contains("CONFIG_DEFAULT_HOSTNAME=\"(none)\"\n"));
    }

    #[test]
    fn leaves_comments_and_unset_markers_alone() {
        let input = "\
# CONFIG_LOCALVERSION_AUTO is not set
CONFIG_WERROR=y
";
        let out = disable_localversion(input);
        assert_eq!(out, input);
    }

    #[test]
    fn does_not_touch_similar_prefixes() {
        // A hypothetical key that merely starts similarly must pass through.
        let input = "CONFIG_LOCALVERSION_FOO=y\n";
        assert_eq!(disable_localversion(input), input);
    }
}
