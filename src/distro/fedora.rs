//! Fedora variant: wraps rpmbuild.
//!
//! kernel.spec in the packaging directory consumes the KBUILD_* variables;
//! rpmbuild gets its directory layout through --define so the build tree
//! lands under <base>/build and sources stay in the kernel tree.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use crate::artifact;
use crate::distro::toolchain_prefix;
use crate::process::Cmd;
use crate::request::BuildRequest;

/// Base kernel version (VERSION.PATCHLEVEL.SUBLEVEL) from the kernel
/// Makefile header.
pub fn base_version(makefile: &str) -> Result<String> {
    let mut version = None;
    let mut patchlevel = None;
    let mut sublevel = None;

    for line in makefile.lines() {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("VERSION") {
            version = split_assignment(value);
        } else if let Some(value) = line.strip_prefix("PATCHLEVEL") {
            patchlevel = split_assignment(value);
        } else if let Some(value) = line.strip_prefix("SUBLEVEL") {
            sublevel = split_assignment(value);
        }

        if let (Some(v), Some(p), Some(s)) = (&version, &patchlevel, &sublevel) {
            return Ok(format!("{}.{}.{}", v, p, s));
        }
    }

    bail!("VERSION/PATCHLEVEL/SUBLEVEL not found in kernel Makefile")
}

fn split_assignment(rest: &str) -> Option<String> {
    let rest = rest.trim_start();
    let value = rest.strip_prefix('=')?.trim();
    Some(value.to_string())
}

fn read_base_version(kernel_src: &Path) -> Result<String> {
    let makefile = kernel_src.join("Makefile");
    let content = fs::read_to_string(&makefile)
        .with_context(|| format!("Failed to read {}", makefile.display()))?;
    base_version(&content)
}

/// Environment consumed by kernel.spec and rpmbuild.
pub fn build_env(request: &BuildRequest, version: &str) -> Result<Vec<(String, String)>> {
    let mut env = vec![
        ("LANGUAGE".to_string(), "C".to_string()),
        ("LANG".to_string(), "C".to_string()),
        (
            "RPM_BUILD_NCPUS".to_string(),
            request.local_jobs().to_string(),
        ),
        ("KBUILD_VERSION".to_string(), version.to_string()),
        ("KBUILD_RELEASE".to_string(), request.pkgrel.to_string()),
        ("KBUILD_SUFFIX".to_string(), request.suffix.clone()),
    ];

    if let Some(key) = &request.sb_key {
        let key = fs::canonicalize(key)
            .with_context(|| format!("Secure-boot key not found: {}", key.display()))?;
        env.push((
            "KBUILD_SB_KEY".to_string(),
            key.to_string_lossy().into_owned(),
        ));
    }
    if let Some(cert) = &request.sb_cert {
        let cert = fs::canonicalize(cert)
            .with_context(|| format!("Secure-boot cert not found: {}", cert.display()))?;
        env.push((
            "KBUILD_SB_CERT".to_string(),
            cert.to_string_lossy().into_owned(),
        ));
    }

    if let Some(target) = &request.cross_target {
        env.push(("KBUILD_TOOLCHAIN".to_string(), toolchain_prefix(target)));
    }

    Ok(env)
}

/// Arguments for the rpmbuild invocation.
pub fn rpmbuild_args(request: &BuildRequest) -> Vec<String> {
    let build_dir = request.base_dir.join("build");

    let mut args = vec![
        "--define".to_string(),
        format!("_topdir {}", build_dir.display()),
        "--define".to_string(),
        format!("_specdir {}", request.base_dir.display()),
        "--define".to_string(),
        format!("_builddir {}", request.kernel_src.display()),
    ];

    if let Some(target) = &request.cross_target {
        args.push("--target".to_string());
        args.push(target.clone());
    }

    args.push("-ba".to_string());
    args.push("kernel.spec".to_string());
    args
}

/// Run rpmbuild and relocate the produced RPMs into out/.
pub fn build(request: &BuildRequest) -> Result<i32> {
    println!("=== Building Fedora kernel package ===");

    let version = read_base_version(&request.kernel_src)?;
    println!("Base kernel version: {}", version);

    let status = Cmd::new("rpmbuild")
        .args(rpmbuild_args(request))
        .envs(build_env(request, &version)?)
        .dir(&request.base_dir)
        .allow_fail()
        .run_interactive()?;

    if !status.success() {
        return Ok(status.code().unwrap_or(-1));
    }

    // rpmbuild sorts output into per-arch subdirectories of RPMS
    println!("Moving packages to out/");
    let rpms_dir = request.base_dir.join("build").join("RPMS");
    let out_dir = request.out_dir();
    if rpms_dir.is_dir() {
        for entry in fs::read_dir(&rpms_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                artifact::relocate(&entry.path(), artifact::RPM_SUFFIXES, &out_dir)?;
            }
        }
    }

    Ok(0)
}

/// Remove the rpmbuild working tree.
pub fn clean(base_dir: &Path) -> Result<()> {
    let build_dir = base_dir.join("build");
    if build_dir.exists() {
        println!("Removing {}...", build_dir.display());
        fs::remove_dir_all(&build_dir)
            .with_context(|| format!("Failed to remove {}", build_dir.display()))?;
    }
    println!("Packaging state cleaned.");
    Ok(())
}
