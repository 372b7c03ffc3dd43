//! Package artifact discovery and relocation.
//!
//! Every distro variant ends the same way: the wrapped tool leaves package
//! files (archives, signatures, changes/buildinfo metadata) next to the
//! build, and kpkg moves them into out/. Discovery is a non-recursive
//! directory scan by filename suffix; nothing else in the directory is
//! touched.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Files produced by makepkg in the packaging directory.
pub const ARCH_SUFFIXES: &[&str] = &[".pkg.tar.xz", ".pkg.tar.zst", ".sig"];

/// Files produced by a Debian kernel package build, dropped in the parent
/// of the kernel source tree.
pub const DEB_SUFFIXES: &[&str] = &[".deb", ".changes", ".buildinfo"];

/// Files produced by rpmbuild under RPMS/<arch>/.
pub const RPM_SUFFIXES: &[&str] = &[".rpm"];

/// List regular files in `dir` (non-recursive) whose names end in one of
/// `suffixes`. Returns an empty list if the directory does not exist.
pub fn collect(dir: &Path, suffixes: &[&str]) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    if !dir.is_dir() {
        return Ok(found);
    }

    for entry in fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if suffixes.iter().any(|s| name.ends_with(s)) {
            found.push(entry.path());
        }
    }

    found.sort();
    Ok(found)
}

/// Move every matching file from `dir` into `out_dir`, creating `out_dir`
/// if needed. Returns the destination paths.
pub fn relocate(dir: &Path, suffixes: &[&str], out_dir: &Path) -> Result<Vec<PathBuf>> {
    let files = collect(dir, suffixes)?;
    if files.is_empty() {
        return Ok(Vec::new());
    }

    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let mut moved = Vec::new();
    for src in files {
        // file_name is always present: collect() only yields files
        let name = src.file_name().unwrap();
        let dst = out_dir.join(name);
        println!("  {}", dst.display());
        move_file(&src, &dst)?;
        moved.push(dst);
    }

    Ok(moved)
}

/// Move a single file, falling back to copy+remove when rename crosses a
/// filesystem boundary.
pub fn move_file(src: &Path, dst: &Path) -> Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(src, dst).with_context(|| {
                format!("Failed to move {} to {}", src.display(), dst.display())
            })?;
            fs::remove_file(src)
                .with_context(|| format!("Failed to remove {}", src.display()))?;
            Ok(())
        }
    }
}

/// Delete matching files from `dir` (non-recursive). Used by clean.
pub fn remove_matching(dir: &Path, suffixes: &[&str]) -> Result<()> {
    for file in collect(dir, suffixes)? {
        fs::remove_file(&file)
            .with_context(|| format!("Failed to remove {}", file.display()))?;
    }
    Ok(())
}
