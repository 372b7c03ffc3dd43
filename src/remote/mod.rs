//! Remote Debian builds inside an LXD container.
//!
//! The container is reached over SSH at the address LXD reports. Every
//! remote step is an ssh/scp child process; build steps that stream make
//! output request a pseudo-terminal. Artifacts are pulled back to the host
//! and deleted remotely afterwards.

pub mod lxd;

use anyhow::{Context, Result};
use std::path::Path;

use crate::process::{Cmd, CommandResult};
use crate::request::{BuildRequest, RemoteSpec};

/// KDEB_SOURCENAME default for remote builds.
pub const DEFAULT_SOURCENAME: &str = "linux-surface";

/// KDEB_CHANGELOG_DIST default for remote builds.
pub const DEFAULT_CHANGELOG_DIST: &str = "unstable";

/// LOCALVERSION string for a remote build.
pub fn localversion(suffix: &str) -> String {
    if suffix.is_empty() {
        "-surface".to_string()
    } else {
        format!("-surface-{}", suffix)
    }
}

/// An SSH session to a build container.
pub struct Session {
    host: String,
    user: String,
}

impl Session {
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
        }
    }

    fn target(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// Run a remote command and capture its output.
    pub fn run(&self, command: &str) -> Result<CommandResult> {
        Cmd::new("ssh")
            .arg(self.target())
            .arg(command)
            .error_msg(format!("remote command failed: {}", command))
            .run()
    }

    /// Run a remote command under a pseudo-terminal with streamed output.
    pub fn run_interactive(&self, command: &str) -> Result<std::process::ExitStatus> {
        Cmd::new("ssh")
            .args(["-t", &self.target()])
            .arg(command)
            .allow_fail()
            .run_interactive()
    }

    /// Copy a local file to the remote host.
    pub fn push(&self, local: &Path, remote: &str) -> Result<()> {
        Cmd::new("scp")
            .arg(local.to_string_lossy())
            .arg(format!("{}:{}", self.target(), remote))
            .error_msg(format!("failed to push {}", local.display()))
            .run()?;
        Ok(())
    }

    /// Copy a remote file to the local host.
    pub fn pull(&self, remote: &str, local: &Path) -> Result<()> {
        Cmd::new("scp")
            .arg(format!("{}:{}", self.target(), remote))
            .arg(local.to_string_lossy())
            .error_msg(format!("failed to pull {}", remote))
            .run()?;
        Ok(())
    }
}

/// Assemble the remote make invocation for a target.
pub fn make_command(
    kernel_src: &str,
    jobs: usize,
    localversion: &str,
    extra_vars: &[(&str, &str)],
    target: &str,
) -> String {
    assemble_make(false, kernel_src, jobs, localversion, extra_vars, target)
}

/// Like [`make_command`] but silent, for captured version queries.
pub fn make_command_silent(
    kernel_src: &str,
    jobs: usize,
    localversion: &str,
    target: &str,
) -> String {
    assemble_make(true, kernel_src, jobs, localversion, &[], target)
}

fn assemble_make(
    silent: bool,
    kernel_src: &str,
    jobs: usize,
    localversion: &str,
    extra_vars: &[(&str, &str)],
    target: &str,
) -> String {
    let mut parts = vec!["make".to_string()];
    if silent {
        parts.push("-s".to_string());
    }
    parts.push(format!("-C {}", kernel_src));
    parts.push(format!("-j{}", jobs));
    parts.push(format!("LOCALVERSION=\"{}\"", localversion));
    parts.push("EXTRAVERSION=\"\"".to_string());
    for (key, value) in extra_vars {
        parts.push(format!("{}=\"{}\"", key, value));
    }
    parts.push(target.to_string());
    parts.join(" ")
}

/// Remote artifact discovery: maxdepth-1 find in the parent of the kernel
/// tree, matching the Debian package suffixes.
fn find_command(remote_out: &str) -> String {
    format!(
        "cd {} && find . -maxdepth 1 -type f \\( -name \"*.deb\" -o -name \"*.changes\" -o -name \"*.buildinfo\" \\)",
        remote_out
    )
}

/// Run the full remote Debian build flow. Returns the remote build's exit
/// code.
pub fn build(request: &BuildRequest) -> Result<i32> {
    let spec = request
        .remote
        .as_ref()
        .context("remote build requested without a container")?;

    println!("=== Building Debian kernel package in '{}' ===", spec.container);

    lxd::start(&spec.container)?;
    let address = lxd::ipv4_address(&spec.container)?;
    println!("Container address: {}", address);

    let session = Session::new(address, spec.user.clone());

    let jobs = match request.jobs {
        Some(jobs) => jobs,
        None => remote_nproc(&session)?,
    };

    let local = localversion(&request.suffix);

    if let Some(clean_target) = &request.clean {
        println!("Cleaning kernel source using {}", clean_target);
        let cmd = make_command(&spec.kernel_src, jobs, &local, &[], clean_target);
        let status = session.run_interactive(&cmd)?;
        if !status.success() {
            return Ok(status.code().unwrap_or(-1));
        }
    }

    if let Some(config) = &request.config {
        println!("Applying config file '{}'", config.display());
        session.push(config, &format!("{}/.config", spec.kernel_src))?;
    }

    println!("Forcing config options for version");
    session.run(&format!(
        "sed -i \"{}\" \"{}/.config\"",
        crate::kconfig::LOCALVERSION_SED_EXPR,
        spec.kernel_src
    ))?;

    println!("Configuring...");
    for target in ["oldconfig", "prepare"] {
        let cmd = make_command(&spec.kernel_src, jobs, &local, &[], target);
        let status = session.run_interactive(&cmd)?;
        if !status.success() {
            return Ok(status.code().unwrap_or(-1));
        }
    }

    println!("Getting kernelrelease version");
    let krel_cmd = make_command_silent(&spec.kernel_src, jobs, &local, "kernelrelease");
    let krel = session.run(&krel_cmd)?.stdout_trimmed().to_string();
    let pkgversion = format!("{}-{}", krel, request.pkgrel);
    println!("  {}", pkgversion);

    println!("Building kernel package in {}", spec.kernel_src);
    let build_cmd = make_command(
        &spec.kernel_src,
        jobs,
        &local,
        &[
            ("KDEB_PKGVERSION", &pkgversion),
            ("KDEB_SOURCENAME", &spec.sourcename),
            ("KDEB_CHANGELOG_DIST", &spec.changelog_dist),
        ],
        &request.make_target,
    );
    let status = session.run_interactive(&build_cmd)?;
    if !status.success() {
        return Ok(status.code().unwrap_or(-1));
    }

    println!("Moving package files back to host");
    transfer_artifacts(&session, spec, request)?;

    Ok(0)
}

fn remote_nproc(session: &Session) -> Result<usize> {
    let result = session.run("nproc")?;
    result
        .stdout_trimmed()
        .parse()
        .context("Failed to parse remote nproc output")
}

fn transfer_artifacts(session: &Session, spec: &RemoteSpec, request: &BuildRequest) -> Result<()> {
    let remote_out = Path::new(&spec.kernel_src)
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| ".".to_string());

    let listing = session.run(&find_command(&remote_out))?;
    let files: Vec<&str> = listing.stdout.split_whitespace().collect();

    if files.is_empty() {
        println!("  (no package files found)");
        return Ok(());
    }

    let out_dir = request.out_dir();
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    for file in files {
        let name = file.trim_start_matches("./");
        let remote_path = format!("{}/{}", remote_out, name);
        println!("  {}", name);
        session.pull(&remote_path, &out_dir.join(name))?;
        session.run(&format!("rm -f \"{}\"", remote_path))?;
    }

    Ok(())
}
