//! kpkg - kernel package build helper.
//!
//! Wraps the native packaging tool of each supported distribution (makepkg,
//! rpmbuild, the kernel's own deb-pkg targets) and relocates the produced
//! packages into out/. Debian builds can run inside a remote LXD container
//! reached over SSH.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use kpkg::commands;
use kpkg::config::Config;
use kpkg::request::{resolve_suffix, BuildRequest, Distro, RemoteSpec};

#[derive(Parser)]
#[command(name = "kpkg")]
#[command(about = "Kernel package build helper for Arch, Debian and Fedora")]
#[command(
    after_help = "QUICK START:\n  kpkg -d arch preflight      Check build tools\n  kpkg -d arch build          Build a kernel package\n  kpkg -d arch clean          Remove packaging state\n  kpkg kernel menuconfig      Forward a target to the kernel's make"
)]
struct Cli {
    /// Target distribution (default: KPKG_DISTRO from .env/environment)
    #[arg(short, long, value_enum, global = true)]
    distro: Option<Distro>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a kernel package for the selected distro
    Build {
        /// Kernel version suffix
        #[arg(short, long)]
        suffix: Option<String>,

        /// Kernel config file to apply before building
        #[arg(short = 'k', long)]
        config: Option<PathBuf>,

        /// Clean target to run first (bare flag means "clean")
        #[arg(short, long, num_args = 0..=1, default_missing_value = "clean")]
        clean: Option<String>,

        /// Also build HTML documentation (Arch)
        #[arg(long)]
        htmldocs: bool,

        /// Sign the package (makepkg --sign)
        #[arg(long)]
        sign: bool,

        /// GPG key for package signing
        #[arg(long)]
        key: Option<String>,

        /// Secure-boot signing key (Fedora)
        #[arg(long)]
        sbsign_key: Option<PathBuf>,

        /// Secure-boot signing certificate (Fedora)
        #[arg(long)]
        sbsign_cert: Option<PathBuf>,

        /// Cross-compile target (e.g. aarch64)
        #[arg(short, long)]
        target: Option<String>,

        /// Debian package make target
        #[arg(short, long, default_value = "bindeb-pkg")]
        maketarget: String,

        /// Package release number
        #[arg(long, default_value_t = 1)]
        pkgrel: u32,

        /// Parallel jobs (default: host CPU count, or remote nproc)
        #[arg(short)]
        jobs: Option<usize>,

        /// Build in this LXD container instead of locally (Debian)
        #[arg(long)]
        container: Option<String>,
    },

    /// Remove transient packaging state (default: preserves out/)
    Clean {
        #[command(subcommand)]
        what: Option<CleanTarget>,
    },

    /// Pass arguments through to `make -C <kernel-src>`
    Kernel {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Check that the selected distro's build tools are installed
    Preflight {
        /// Fail with exit code 1 if any check fails
        #[arg(long)]
        strict: bool,
    },

    /// Show information
    Show {
        #[command(subcommand)]
        what: ShowTarget,
    },
}

#[derive(Subcommand)]
enum CleanTarget {
    /// Clean packaging state and the out/ directory
    All,
}

#[derive(Subcommand)]
enum ShowTarget {
    /// Show the effective configuration
    Config,
}

fn selected_distro(cli_distro: Option<Distro>, config: &Config) -> Result<Distro> {
    match cli_distro.or(config.distro) {
        Some(distro) => Ok(distro),
        None => bail!("No distro selected. Pass --distro or set KPKG_DISTRO."),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let base_dir = std::env::current_dir()?;

    // Load .env if present
    dotenvy::dotenv().ok();
    let config = Config::load(&base_dir);

    match cli.command {
        Commands::Build {
            suffix,
            config: kernel_config,
            clean,
            htmldocs,
            sign,
            key,
            sbsign_key,
            sbsign_cert,
            target,
            maketarget,
            pkgrel,
            jobs,
            container,
        } => {
            let distro = selected_distro(cli.distro, &config)?;

            let container = container.or_else(|| config.container.clone());
            if container.is_some() && distro != Distro::Debian {
                bail!("Container builds are only supported for --distro debian.");
            }
            let remote = container.map(|name| RemoteSpec {
                container: name,
                user: config.container_user.clone(),
                kernel_src: config.remote_kernel_src.clone(),
                sourcename: kpkg::remote::DEFAULT_SOURCENAME.to_string(),
                changelog_dist: kpkg::remote::DEFAULT_CHANGELOG_DIST.to_string(),
            });

            let request = BuildRequest {
                distro,
                base_dir,
                kernel_src: config.kernel_src.clone(),
                jobs,
                suffix: resolve_suffix(suffix, &config.suffix, distro),
                pkgrel,
                config: kernel_config,
                clean,
                htmldocs,
                sign,
                sign_key: key,
                sb_key: sbsign_key,
                sb_cert: sbsign_cert,
                cross_target: target,
                make_target: maketarget,
                remote,
            };

            let code = commands::cmd_build(&request)?;
            if code != 0 {
                std::process::exit(code);
            }
        }

        Commands::Clean { what } => {
            let distro = selected_distro(cli.distro, &config)?;
            let clean_target = match what {
                None => commands::clean::CleanTarget::Packaging,
                Some(CleanTarget::All) => commands::clean::CleanTarget::All,
            };
            commands::cmd_clean(distro, &base_dir, clean_target)?;
        }

        Commands::Kernel { args } => {
            let code = commands::cmd_kernel(&config.kernel_src, &args)?;
            if code != 0 {
                std::process::exit(code);
            }
        }

        Commands::Preflight { strict } => {
            let distro = selected_distro(cli.distro, &config)?;
            let remote = distro == Distro::Debian && config.container.is_some();
            commands::cmd_preflight(distro, remote, &config.kernel_src, strict)?;
        }

        Commands::Show { what } => {
            let show_target = match what {
                ShowTarget::Config => commands::show::ShowTarget::Config,
            };
            commands::cmd_show(show_target, &config)?;
        }
    }

    Ok(())
}
