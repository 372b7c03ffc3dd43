//! Configuration layering tests.
//!
//! Config::load reads the process environment, so these tests are
//! serialized and clean up the variables they set.

use kpkg::config::Config;
use kpkg::request::Distro;
use serial_test::serial;
use std::fs;
use tempfile::TempDir;

fn clear_kpkg_env() {
    for key in [
        "KPKG_DISTRO",
        "KPKG_KERNEL_SRC",
        "KPKG_SUFFIX",
        "KPKG_CONTAINER",
        "KPKG_CONTAINER_USER",
        "KPKG_REMOTE_KERNEL_SRC",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn defaults_without_env_file() {
    clear_kpkg_env();
    let tmp = TempDir::new().unwrap();

    let config = Config::load(tmp.path());
    assert_eq!(config.distro, None);
    assert_eq!(config.kernel_src, tmp.path().join("linux"));
    assert_eq!(config.suffix, "");
    assert_eq!(config.container, None);
    assert_eq!(config.container_user, "build");
    assert_eq!(config.remote_kernel_src, "devel/linux");
}

#[test]
#[serial]
fn env_file_is_read() {
    clear_kpkg_env();
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".env"),
        "# kpkg settings\nKPKG_DISTRO=fedora\nKPKG_SUFFIX=\"surface\"\nKPKG_CONTAINER=kdev-deb10\n",
    )
    .unwrap();

    let config = Config::load(tmp.path());
    assert_eq!(config.distro, Some(Distro::Fedora));
    assert_eq!(config.suffix, "surface");
    assert_eq!(config.container.as_deref(), Some("kdev-deb10"));
}

#[test]
#[serial]
fn process_env_overrides_env_file() {
    clear_kpkg_env();
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".env"), "KPKG_SUFFIX=from-file\n").unwrap();

    std::env::set_var("KPKG_SUFFIX", "from-env");
    let config = Config::load(tmp.path());
    std::env::remove_var("KPKG_SUFFIX");

    assert_eq!(config.suffix, "from-env");
}

#[test]
#[serial]
fn relative_kernel_src_is_anchored_to_base() {
    clear_kpkg_env();
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".env"), "KPKG_KERNEL_SRC=src/linux\n").unwrap();

    let config = Config::load(tmp.path());
    assert_eq!(config.kernel_src, tmp.path().join("src/linux"));
}

#[test]
#[serial]
fn absolute_kernel_src_is_kept() {
    clear_kpkg_env();
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".env"), "KPKG_KERNEL_SRC=/opt/linux\n").unwrap();

    let config = Config::load(tmp.path());
    assert_eq!(config.kernel_src, std::path::PathBuf::from("/opt/linux"));
}

#[test]
#[serial]
fn default_suffix_reaches_debian_localversion() {
    clear_kpkg_env();
    let tmp = TempDir::new().unwrap();

    let config = Config::load(tmp.path());
    let request = kpkg::request::BuildRequest {
        distro: Distro::Debian,
        base_dir: tmp.path().to_path_buf(),
        kernel_src: config.kernel_src.clone(),
        jobs: Some(1),
        suffix: kpkg::request::resolve_suffix(None, &config.suffix, Distro::Debian),
        pkgrel: 1,
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
    };

    let env = kpkg::distro::debian::build_env(&request).unwrap();
    let localversion = env
        .iter()
        .find(|(k, _)| k == "LOCALVERSION")
        .map(|(_, v)| v.as_str());
    assert_eq!(localversion, Some("-surface"));

    // Fedora picks up the same default through KBUILD_SUFFIX
    let mut request = request;
    request.distro = Distro::Fedora;
    request.suffix = kpkg::request::resolve_suffix(None, &config.suffix, Distro::Fedora);
    let env = kpkg::distro::fedora::build_env(&request, "5.9.1").unwrap();
    let suffix = env
        .iter()
        .find(|(k, _)| k == "KBUILD_SUFFIX")
        .map(|(_, v)| v.as_str());
    assert_eq!(suffix, Some("surface"));
}

#[test]
#[serial]
fn unknown_distro_name_is_ignored() {
    clear_kpkg_env();
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".env"), "KPKG_DISTRO=gentoo\n").unwrap();

    let config = Config::load(tmp.path());
    assert_eq!(config.distro, None);
}
