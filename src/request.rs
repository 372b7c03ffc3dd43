//! The parsed parameters for one build invocation.

use clap::ValueEnum;
use std::path::PathBuf;

/// Target distribution for a package build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Distro {
    /// Arch Linux (makepkg)
    Arch,
    /// Debian (make bindeb-pkg, locally or in an LXD container)
    Debian,
    /// Fedora (rpmbuild)
    Fedora,
}

impl Distro {
    pub fn name(&self) -> &'static str {
        match self {
            Distro::Arch => "arch",
            Distro::Debian => "debian",
            Distro::Fedora => "fedora",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "arch" => Some(Distro::Arch),
            "debian" => Some(Distro::Debian),
            "fedora" => Some(Distro::Fedora),
            _ => None,
        }
    }

    /// Suffix used when neither --suffix nor KPKG_SUFFIX is set. Debian and
    /// Fedora embed the suffix directly in the package version string, so
    /// they carry the surface branding; the Arch PKGBUILD handles an empty
    /// suffix itself.
    pub fn default_suffix(&self) -> &'static str {
        match self {
            Distro::Arch => "",
            Distro::Debian | Distro::Fedora => "surface",
        }
    }
}

/// Effective version suffix for a build: the --suffix flag wins, then a
/// non-empty KPKG_SUFFIX, then the distro default.
pub fn resolve_suffix(flag: Option<String>, config_suffix: &str, distro: Distro) -> String {
    if let Some(suffix) = flag {
        return suffix;
    }
    if !config_suffix.is_empty() {
        return config_suffix.to_string();
    }
    distro.default_suffix().to_string()
}

/// Remote build parameters for the Debian-in-LXD variant.
#[derive(Debug, Clone)]
pub struct RemoteSpec {
    /// LXD container name.
    pub container: String,
    /// SSH user inside the container.
    pub user: String,
    /// Kernel tree path inside the container, relative to the user's home.
    pub kernel_src: String,
    /// KDEB_SOURCENAME for the Debian package build.
    pub sourcename: String,
    /// KDEB_CHANGELOG_DIST for the Debian package build.
    pub changelog_dist: String,
}

/// Everything one `kpkg build` invocation needs, assembled from CLI flags
/// and config. Constructed once, passed to the matching distro module,
/// discarded when the process exits.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub distro: Distro,
    /// Packaging directory: where PKGBUILD / kernel.spec live and where
    /// out/ is created.
    pub base_dir: PathBuf,
    /// Kernel source tree.
    pub kernel_src: PathBuf,
    /// Parallel job count; None means "decide later" (host CPU count, or
    /// remote nproc for container builds).
    pub jobs: Option<usize>,
    /// Kernel version suffix (e.g. "surface").
    pub suffix: String,
    /// Package release number.
    pub pkgrel: u32,
    /// Kernel config file to apply before building.
    pub config: Option<PathBuf>,
    /// Clean target to run before building (e.g. "clean", "mrproper").
    pub clean: Option<String>,
    /// Build HTML documentation (Arch only).
    pub htmldocs: bool,
    /// Sign the package (makepkg --sign).
    pub sign: bool,
    /// GPG key for makepkg --key.
    pub sign_key: Option<String>,
    /// Secure-boot signing key (Fedora).
    pub sb_key: Option<PathBuf>,
    /// Secure-boot signing certificate (Fedora).
    pub sb_cert: Option<PathBuf>,
    /// Cross-compile target prefix (e.g. "aarch64").
    pub cross_target: Option<String>,
    /// Debian make target (bindeb-pkg / deb-pkg).
    pub make_target: String,
    /// Set for remote Debian builds.
    pub remote: Option<RemoteSpec>,
}

impl BuildRequest {
    /// Output directory for relocated artifacts.
    pub fn out_dir(&self) -> PathBuf {
        self.base_dir.join("out")
    }

    /// Job count for local builds, defaulting to host parallelism.
    pub fn local_jobs(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}
