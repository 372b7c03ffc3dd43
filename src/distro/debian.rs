//! Debian variant: wraps the kernel's own deb packaging (make bindeb-pkg).
//!
//! Runs in the kernel tree itself. The package version is pinned through
//! KDEB_PKGVERSION, computed from `make kernelrelease`, so the .config's
//! localversion options are neutralized first. With a container configured
//! the whole flow runs remotely instead (see [`crate::remote`]).

use anyhow::{bail, Context, Result};

use crate::artifact;
use crate::distro::toolchain_prefix;
use crate::kconfig;
use crate::process::Cmd;
use crate::remote;
use crate::request::BuildRequest;

/// Kernel make ARCH value for a cross-compile target.
pub fn arch_for_target(target: &str) -> Result<&'static str> {
    match target {
        "aarch64" => Ok("arm64"),
        "x86_64" => Ok("x86"),
        _ => bail!("Unsupported cross-compile target: {}", target),
    }
}

/// Environment for the kernel make invocations (without KDEB_PKGVERSION,
/// which depends on the computed kernelrelease).
pub fn build_env(request: &BuildRequest) -> Result<Vec<(String, String)>> {
    // An empty suffix must not become LOCALVERSION="-", which would leak a
    // trailing dash into the package version.
    let localversion = if request.suffix.is_empty() {
        String::new()
    } else {
        format!("-{}", request.suffix)
    };

    let mut env = vec![
        ("LANGUAGE".to_string(), "C".to_string()),
        ("LANG".to_string(), "C".to_string()),
        ("EXTRAVERSION".to_string(), String::new()),
        ("LOCALVERSION".to_string(), localversion),
    ];

    if let Some(target) = &request.cross_target {
        env.push(("CROSS_COMPILE".to_string(), toolchain_prefix(target)));
        env.push(("ARCH".to_string(), arch_for_target(target)?.to_string()));
    }

    Ok(env)
}

/// Capture `make -s kernelrelease` from the kernel tree.
fn kernelrelease(request: &BuildRequest, env: &[(String, String)]) -> Result<String> {
    let result = Cmd::new("make")
        .args(["-s", &format!("-j{}", request.local_jobs()), "kernelrelease"])
        .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .dir(&request.kernel_src)
        .error_msg("make kernelrelease failed")
        .run()?;
    Ok(result.stdout_trimmed().to_string())
}

/// Run the deb package build and relocate the produced files into out/.
pub fn build(request: &BuildRequest) -> Result<i32> {
    if request.remote.is_some() {
        return remote::build(request);
    }

    println!("=== Building Debian kernel package ===");

    let env = build_env(request)?;

    if let Some(clean_target) = &request.clean {
        println!("Cleaning kernel source using {}", clean_target);
        let status = Cmd::new("make")
            .args([&format!("-j{}", request.local_jobs()), clean_target])
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .dir(&request.kernel_src)
            .allow_fail()
            .run_interactive()?;
        if !status.success() {
            return Ok(status.code().unwrap_or(-1));
        }
    }

    if let Some(config) = &request.config {
        println!("Applying config file '{}'", config.display());
        std::fs::copy(config, request.kernel_src.join(".config"))
            .with_context(|| format!("Failed to apply {}", config.display()))?;
    }

    // The kernel would otherwise append its own localversion on top of the
    // LOCALVERSION we pass, doubling the suffix.
    kconfig::disable_localversion_in(&request.kernel_src)?;

    let krel = kernelrelease(request, &env)?;
    let pkgversion = format!("{}-{}", krel, request.pkgrel);
    println!("Package version: {}", pkgversion);

    let status = Cmd::new("make")
        .args([&format!("-j{}", request.local_jobs()), &request.make_target])
        .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .env("KDEB_PKGVERSION", &pkgversion)
        .dir(&request.kernel_src)
        .allow_fail()
        .run_interactive()?;

    if !status.success() {
        return Ok(status.code().unwrap_or(-1));
    }

    // bindeb-pkg drops packages in the parent of the kernel tree
    println!("Moving packages to out/");
    if let Some(parent) = request.kernel_src.parent() {
        artifact::relocate(parent, artifact::DEB_SUFFIXES, &request.out_dir())?;
    }

    Ok(0)
}

/// The deb build keeps no transient state in the packaging directory.
pub fn clean(_base_dir: &std::path::Path) -> Result<()> {
    println!("Nothing to clean for Debian (build state lives in the kernel tree).");
    Ok(())
}
