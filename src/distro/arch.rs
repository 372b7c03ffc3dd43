//! Arch Linux variant: wraps makepkg.
//!
//! The PKGBUILD in the packaging directory reads the KBUILD_* variables to
//! locate the kernel tree and pick up build options; kpkg only sets them
//! and launches makepkg.

use anyhow::{Context, Result};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use crate::artifact;
use crate::process::Cmd;
use crate::request::BuildRequest;

/// Leftover install script makepkg copies next to the package.
const INSTALL_SCRIPT: &str = "linux.install.pkg";

/// Environment consumed by the PKGBUILD.
pub fn build_env(request: &BuildRequest) -> Result<Vec<(String, String)>> {
    let config = match &request.config {
        Some(path) => fs::canonicalize(path)
            .with_context(|| format!("Config file not found: {}", path.display()))?
            .to_string_lossy()
            .into_owned(),
        None => String::new(),
    };

    Ok(vec![
        (
            "KBUILD_KERNELSRC".to_string(),
            request.kernel_src.to_string_lossy().into_owned(),
        ),
        ("KBUILD_SUFFIX".to_string(), request.suffix.clone()),
        ("KBUILD_RELEASE".to_string(), request.pkgrel.to_string()),
        ("KBUILD_CONFIG".to_string(), config),
        (
            "KBUILD_CLEAN".to_string(),
            request.clean.clone().unwrap_or_default(),
        ),
        (
            "KBUILD_HTMLDOCS".to_string(),
            if request.htmldocs { "y" } else { "n" }.to_string(),
        ),
    ])
}

/// Arguments for the makepkg invocation.
pub fn makepkg_args(request: &BuildRequest) -> Vec<String> {
    let mut args = vec!["-fs".to_string()];

    if request.sign {
        args.push("--sign".to_string());
    }
    if let Some(key) = &request.sign_key {
        args.push("--key".to_string());
        args.push(key.clone());
    }

    args.push(format!("MAKEFLAGS=-j{}", request.local_jobs()));
    args
}

/// Run makepkg and relocate the produced packages into out/.
pub fn build(request: &BuildRequest) -> Result<i32> {
    println!("=== Building Arch kernel package ===");

    let status = Cmd::new("makepkg")
        .args(makepkg_args(request))
        .envs(build_env(request)?)
        .dir(&request.base_dir)
        .allow_fail()
        .run_interactive()?;

    if !status.success() {
        return Ok(status.code().unwrap_or(-1));
    }

    println!("Moving packages to out/");
    artifact::relocate(&request.base_dir, artifact::ARCH_SUFFIXES, &request.out_dir())?;

    let leftover = request.base_dir.join(INSTALL_SCRIPT);
    if leftover.exists() {
        fs::remove_file(&leftover)?;
    }

    Ok(0)
}

/// Remove makepkg's transient state: src/, pkg/, stray packages and the
/// copied install script.
pub fn clean(base_dir: &Path) -> Result<()> {
    let pkg_dir = base_dir.join("pkg");
    if pkg_dir.exists() {
        // makepkg leaves pkg/ read-only; make it removable first
        fs::set_permissions(&pkg_dir, fs::Permissions::from_mode(0o700))?;
    }

    remove_dir_if_present(&base_dir.join("src"))?;
    remove_dir_if_present(&pkg_dir)?;

    artifact::remove_matching(base_dir, artifact::ARCH_SUFFIXES)?;

    let leftover = base_dir.join(INSTALL_SCRIPT);
    if leftover.exists() {
        fs::remove_file(&leftover)?;
    }

    println!("Packaging state cleaned.");
    Ok(())
}

fn remove_dir_if_present(dir: &Path) -> Result<()> {
    if dir.exists() {
        println!("Removing {}...", dir.display());
        fs::remove_dir_all(dir)
            .with_context(|| format!("Failed to remove {}", dir.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Distro;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn request(base: &Path) -> BuildRequest {
        BuildRequest {
            distro: Distro::Arch,
            base_dir: base.to_path_buf(),
            kernel_src: base.join("linux"),
            jobs: Some(8),
            suffix: "lts".to_string(),
            pkgrel: 2,
            config: None,
            clean: None,
            htmldocs: false,
            sign: false,
            sign_key: None,
            sb_key: None,
            sb_cert: None,
            cross_target: None,
            make_target: "bindeb-pkg".to_string(),
            remote: None,
        }
    }

    fn env_get<'a>(env: &'a [(String, String)], key: &str) -> &'a str {
        &env.iter().find(|(k, _)| k == key).unwrap().1
    }

    #[test]
    fn env_mapping_defaults() {
        let tmp = TempDir::new().unwrap();
        let req = request(tmp.path());
        let env = build_env(&req).unwrap();

        assert_eq!(
            env_get(&env, "KBUILD_KERNELSRC"),
            tmp.path().join("linux").to_string_lossy()
        );
        assert_eq!(env_get(&env, "KBUILD_SUFFIX"), "lts");
        assert_eq!(env_get(&env, "KBUILD_RELEASE"), "2");
        assert_eq!(env_get(&env, "KBUILD_CONFIG"), "");
        assert_eq!(env_get(&env, "KBUILD_CLEAN"), "");
        assert_eq!(env_get(&env, "KBUILD_HTMLDOCS"), "n");
    }

    #[test]
    fn env_mapping_with_options() {
        let tmp = TempDir::new().unwrap();
        let config = tmp.path().join("surface.config");
        fs::write(&config, "CONFIG_X=y\n").unwrap();

        let mut req = request(tmp.path());
        req.config = Some(config.clone());
        req.clean = Some("mrproper".to_string());
        req.htmldocs = true;

        let env = build_env(&req).unwrap();
        assert_eq!(
            env_get(&env, "KBUILD_CONFIG"),
            fs::canonicalize(&config).unwrap().to_string_lossy()
        );
        assert_eq!(env_get(&env, "KBUILD_CLEAN"), "mrproper");
        assert_eq!(env_get(&env, "KBUILD_HTMLDOCS"), "y");
    }

    #[test]
    fn env_mapping_missing_config_fails() {
        let tmp = TempDir::new().unwrap();
        let mut req = request(tmp.path());
        req.config = Some(PathBuf::from("/nonexistent/surface.config"));
        assert!(build_env(&req).is_err());
    }

    #[test]
    fn makepkg_args_plain() {
        let tmp = TempDir::new().unwrap();
        let req = request(tmp.path());
        assert_eq!(makepkg_args(&req), vec!["-fs", "MAKEFLAGS=-j8"]);
    }

    #[test]
    fn makepkg_args_signing() {
        let tmp = TempDir::new().unwrap();
        let mut req = request(tmp.path());
        req.sign = true;
        req.sign_key = Some("56C464BAAC421453".to_string());
        assert_eq!(
            makepkg_args(&req),
            vec!["-fs", "--sign", "--key", "56C464BAAC421453", "MAKEFLAGS=-j8"]
        );
    }

    #[test]
    fn clean_removes_transient_state() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("src")).unwrap();
        let pkg = tmp.path().join("pkg");
        fs::create_dir(&pkg).unwrap();
        fs::set_permissions(&pkg, fs::Permissions::from_mode(0o500)).unwrap();
        fs::write(tmp.path().join("linux-5.9.pkg.tar.zst"), b"x").unwrap();
        fs::write(tmp.path().join(INSTALL_SCRIPT), b"x").unwrap();
        fs::write(tmp.path().join("PKGBUILD"), b"x").unwrap();

        clean(tmp.path()).unwrap();

        assert!(!tmp.path().join("src").exists());
        assert!(!pkg.exists());
        assert!(!tmp.path().join("linux-5.9.pkg.tar.zst").exists());
        assert!(!tmp.path().join(INSTALL_SCRIPT).exists());
        assert!(tmp.path().join("PKGBUILD").exists());
    }
}
