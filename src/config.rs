//! Configuration management for kpkg.
//!
//! Reads configuration from a .env file in the packaging directory and from
//! environment variables. Environment variables take precedence over .env.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::request::Distro;

/// Default SSH user inside a build container.
pub const DEFAULT_CONTAINER_USER: &str = "build";

/// Default kernel tree location inside a build container, relative to the
/// remote user's home directory.
pub const DEFAULT_REMOTE_KERNEL_SRC: &str = "devel/linux";

/// kpkg configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default distro variant when --distro is not given.
    pub distro: Option<Distro>,
    /// Path to the kernel source tree (default: <base>/linux).
    pub kernel_src: PathBuf,
    /// Default kernel version suffix.
    pub suffix: String,
    /// LXD container for remote Debian builds, if any.
    pub container: Option<String>,
    /// SSH user inside the container.
    pub container_user: String,
    /// Kernel tree location inside the container.
    pub remote_kernel_src: String,
}

impl Config {
    /// Load configuration from `<base>/.env` and the process environment.
    pub fn load(base_dir: &Path) -> Self {
        let mut env_vars = HashMap::new();

        let env_path = base_dir.join(".env");
        if env_path.exists() {
            if let Ok(content) = fs::read_to_string(&env_path) {
                for line in content.lines() {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if let Some((key, value)) = line.split_once('=') {
                        let key = key.trim();
                        let value = value.trim();
                        let value = value.trim_matches('"').trim_matches('\'');
                        env_vars.insert(key.to_string(), value.to_string());
                    }
                }
            }
        }

        // Environment variables override the .env file.
        for (key, value) in std::env::vars() {
            env_vars.insert(key, value);
        }

        let distro = env_vars
            .get("KPKG_DISTRO")
            .and_then(|s| Distro::from_name(s));

        let kernel_src = env_vars
            .get("KPKG_KERNEL_SRC")
            .map(|s| {
                let path = PathBuf::from(s);
                if path.is_absolute() {
                    path
                } else {
                    base_dir.join(path)
                }
            })
            .unwrap_or_else(|| base_dir.join("linux"));

        let suffix = env_vars
            .get("KPKG_SUFFIX")
            .cloned()
            .unwrap_or_default();

        let container = env_vars
            .get("KPKG_CONTAINER")
            .filter(|s| !s.is_empty())
            .cloned();

        let container_user = env_vars
            .get("KPKG_CONTAINER_USER")
            .cloned()
            .unwrap_or_else(|| DEFAULT_CONTAINER_USER.to_string());

        let remote_kernel_src = env_vars
            .get("KPKG_REMOTE_KERNEL_SRC")
            .cloned()
            .unwrap_or_else(|| DEFAULT_REMOTE_KERNEL_SRC.to_string());

        Self {
            distro,
            kernel_src,
            suffix,
            container,
            container_user,
            remote_kernel_src,
        }
    }

    /// Check if the kernel source tree is present.
    pub fn has_kernel_src(&self) -> bool {
        self.kernel_src.join("Makefile").exists()
    }

    /// Print configuration for debugging.
    pub fn print(&self) {
        println!("Configuration:");
        match self.distro {
            Some(d) => println!("  KPKG_DISTRO: {}", d.name()),
            None => println!("  KPKG_DISTRO: (unset)"),
        }
        println!("  KPKG_KERNEL_SRC: {}", self.kernel_src.display());
        println!("  KPKG_SUFFIX: {}", self.suffix);
        match &self.container {
            Some(c) => println!("  KPKG_CONTAINER: {}", c),
            None => println!("  KPKG_CONTAINER: (unset, Debian builds run locally)"),
        }
        println!("  KPKG_CONTAINER_USER: {}", self.container_user);
        println!("  KPKG_REMOTE_KERNEL_SRC: {}", self.remote_kernel_src);
        if self.has_kernel_src() {
            println!("  Kernel source: FOUND");
        } else {
            println!("  Kernel source: NOT FOUND");
        }
    }
}
