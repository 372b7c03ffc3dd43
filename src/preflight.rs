//! Host tool availability checks.
//!
//! kpkg is only plumbing around native tools, so the useful failure mode is
//! telling the user which tool is missing before a build starts.

use std::path::Path;

use crate::request::Distro;

/// Result of a single preflight check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Fail,
    Warn,
}

impl CheckResult {
    pub fn pass_with(name: &str, details: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Pass,
            details: Some(details.to_string()),
        }
    }

    pub fn fail(name: &str, details: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Fail,
            details: Some(details.to_string()),
        }
    }

    pub fn warn(name: &str, details: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warn,
            details: Some(details.to_string()),
        }
    }
}

/// Results of all preflight checks.
pub struct PreflightReport {
    pub checks: Vec<CheckResult>,
}

impl PreflightReport {
    pub fn all_passed(&self) -> bool {
        !self.checks.iter().any(|c| c.status == CheckStatus::Fail)
    }

    pub fn fail_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.status == CheckStatus::Fail)
            .count()
    }

    /// Print the report to stdout.
    pub fn print(&self) {
        println!("=== Preflight Check Results ===\n");

        for check in &self.checks {
            let status_str = match check.status {
                CheckStatus::Pass => "PASS",
                CheckStatus::Fail => "FAIL",
                CheckStatus::Warn => "WARN",
            };

            print!("  [{}] {}", status_str, check.name);
            if let Some(details) = &check.details {
                println!(": {}", details);
            } else {
                println!();
            }
        }

        println!();
        let failed = self.fail_count();
        println!(
            "Summary: {}/{} passed",
            self.checks.len() - failed,
            self.checks.len()
        );
        if failed > 0 {
            println!("         {} FAILED - builds will not succeed", failed);
        }
    }
}

/// Tools each distro variant needs on the host.
pub fn required_tools(distro: Distro, remote: bool) -> Vec<(&'static str, &'static str)> {
    let mut tools = vec![("make", "Required for the kernel pass-through command")];

    match distro {
        Distro::Arch => {
            tools.push(("makepkg", "Required to build Arch packages"));
        }
        Distro::Fedora => {
            tools.push(("rpmbuild", "Required to build Fedora packages"));
        }
        Distro::Debian => {
            if remote {
                tools.push(("lxc", "Required to reach the build container"));
                tools.push(("ssh", "Required to run commands in the container"));
                tools.push(("scp", "Required to transfer files and packages"));
            } else {
                tools.push(("dpkg-buildpackage", "Used by the kernel's deb-pkg targets"));
            }
        }
    }

    tools
}

/// Check that the selected distro's tools are installed.
pub fn run_preflight(distro: Distro, remote: bool, kernel_src: &Path) -> PreflightReport {
    let mut checks = Vec::new();

    for (tool, purpose) in required_tools(distro, remote) {
        checks.push(check_tool(tool, purpose));
    }

    // Optional signing helper, only ever warned about
    if distro == Distro::Fedora {
        match which::which("sbsign") {
            Ok(path) => checks.push(CheckResult::pass_with("sbsign", &path.to_string_lossy())),
            Err(_) => checks.push(CheckResult::warn(
                "sbsign",
                "Not found. Needed only for secure-boot signed kernels.",
            )),
        }
    }

    if kernel_src.join("Makefile").exists() {
        checks.push(CheckResult::pass_with(
            "kernel source",
            &kernel_src.to_string_lossy(),
        ));
    } else if remote {
        checks.push(CheckResult::warn(
            "kernel source",
            "No local tree (remote builds use the container's tree).",
        ));
    } else {
        checks.push(CheckResult::fail(
            "kernel source",
            &format!("No Makefile in {}", kernel_src.display()),
        ));
    }

    PreflightReport { checks }
}

fn check_tool(tool: &str, purpose: &str) -> CheckResult {
    match which::which(tool) {
        Ok(path) => CheckResult::pass_with(tool, &path.to_string_lossy()),
        Err(_) => CheckResult::fail(tool, &format!("Not found in PATH. {}", purpose)),
    }
}
