//! Cleanup behavior tests: clean removes exactly the transient packaging
//! state it claims to, and clean-all additionally removes out/.

use kpkg::distro;
use kpkg::request::Distro;
use std::fs;
use tempfile::TempDir;

#[test]
fn arch_clean_all_removes_out() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("src")).unwrap();
    fs::create_dir(tmp.path().join("out")).unwrap();
    fs::write(tmp.path().join("out/linux-5.9.pkg.tar.zst"), b"x").unwrap();
    fs::write(tmp.path().join("PKGBUILD"), b"x").unwrap();

    distro::clean_all(Distro::Arch, tmp.path()).unwrap();

    assert!(!tmp.path().join("src").exists());
    assert!(!tmp.path().join("out").exists());
    assert!(tmp.path().join("PKGBUILD").exists());
}

#[test]
fn arch_clean_preserves_out() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("pkg")).unwrap();
    fs::create_dir(tmp.path().join("out")).unwrap();
    fs::write(tmp.path().join("out/linux-5.9.pkg.tar.zst"), b"x").unwrap();

    distro::clean(Distro::Arch, tmp.path()).unwrap();

    assert!(!tmp.path().join("pkg").exists());
    assert!(tmp.path().join("out/linux-5.9.pkg.tar.zst").exists());
}

#[test]
fn fedora_clean_removes_only_build_tree() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("build/RPMS/x86_64")).unwrap();
    fs::create_dir(tmp.path().join("out")).unwrap();
    fs::write(tmp.path().join("kernel.spec"), b"x").unwrap();

    distro::clean(Distro::Fedora, tmp.path()).unwrap();

    assert!(!tmp.path().join("build").exists());
    assert!(tmp.path().join("out").exists());
    assert!(tmp.path().join("kernel.spec").exists());
}

#[test]
fn debian_clean_is_a_no_op() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("out")).unwrap();

    distro::clean(Distro::Debian, tmp.path()).unwrap();
    assert!(tmp.path().join("out").exists());
}

#[test]
fn debian_clean_all_removes_out() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("out")).unwrap();
    fs::write(tmp.path().join("out/linux-image.deb"), b"x").unwrap();

    distro::clean_all(Distro::Debian, tmp.path()).unwrap();
    assert!(!tmp.path().join("out").exists());
}

#[test]
fn clean_all_with_no_state_succeeds() {
    let tmp = TempDir::new().unwrap();
    for d in [Distro::Arch, Distro::Debian, Distro::Fedora] {
        distro::clean_all(d, tmp.path()).unwrap();
    }
}
