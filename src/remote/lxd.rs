//! LXD container plumbing via the lxc CLI.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;

use crate::process::Cmd;

/// Subset of `lxc list --format json` that address resolution needs.
#[derive(Debug, Deserialize)]
pub struct Instance {
    pub name: String,
    pub state: Option<InstanceState>,
}

#[derive(Debug, Deserialize)]
pub struct InstanceState {
    #[serde(default)]
    pub network: Option<HashMap<String, Interface>>,
}

#[derive(Debug, Deserialize)]
pub struct Interface {
    #[serde(default)]
    pub addresses: Vec<Address>,
}

#[derive(Debug, Deserialize)]
pub struct Address {
    pub family: String,
    pub scope: String,
    pub address: String,
}

/// Start a container. Starting one that is already running is fine.
pub fn start(name: &str) -> Result<()> {
    let result = Cmd::new("lxc").args(["start", name]).allow_fail().run()?;
    if !result.success() {
        let stderr = result.stderr_trimmed();
        if !stderr.contains("already running") {
            bail!("Failed to start container '{}': {}", name, stderr);
        }
    }
    Ok(())
}

/// Resolve a container's global IPv4 address.
pub fn ipv4_address(name: &str) -> Result<String> {
    let result = Cmd::new("lxc")
        .args(["list", name, "--format", "json"])
        .error_msg("lxc list failed")
        .run()?;

    let instances: Vec<Instance> = serde_json::from_str(result.stdout_trimmed())
        .context("Failed to parse lxc list output")?;

    let instance = instances
        .iter()
        .find(|i| i.name == name)
        .with_context(|| format!("Container '{}' not found", name))?;

    find_global_inet(instance)
        .with_context(|| format!("Container '{}' has no global IPv4 address", name))
}

/// First global-scope inet address on any non-loopback interface.
fn find_global_inet(instance: &Instance) -> Option<String> {
    let network = instance.state.as_ref()?.network.as_ref()?;

    let mut ifaces: Vec<_> = network.iter().filter(|(name, _)| *name != "lo").collect();
    ifaces.sort_by_key(|(name, _)| name.to_string());

    for (_, iface) in ifaces {
        for addr in &iface.addresses {
            if addr.family == "inet" && addr.scope == "global" {
                return Some(addr.address.clone());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Vec<Instance> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn picks_global_inet_skipping_loopback() {
        let instances = parse(
            r#"[{
                "name": "kdev-deb10",
                "state": {
                    "network": {
                        "lo": {
                            "addresses": [
                                {"family": "inet", "scope": "local", "address": "127.0.0.1"}
                            ]
                        },
                        "eth0": {
                            "addresses": [
                                {"family": "inet6", "scope": "link", "address": "fe80::1"},
                                {"family": "inet", "scope": "global", "address": "10.4.0.17"}
                            ]
                        }
                    }
                }
            }]"#,
        );

        assert_eq!(find_global_inet(&instances[0]).unwrap(), "10.4.0.17");
    }

    #[test]
    fn no_address_when_stopped() {
        let instances = parse(r#"[{"name": "kdev-deb10", "state": null}]"#);
        assert!(find_global_inet(&instances[0]).is_none());
    }

    #[test]
    fn tolerates_extra_fields() {
        let instances = parse(
            r#"[{
                "name": "kdev-deb10",
                "status": "Running",
                "type": "container",
                "state": {
                    "status": "Running",
                    "network": {
                        "eth0": {
                            "hwaddr": "00:16:3e:aa:bb:cc",
                            "addresses": [
                                {"family": "inet", "scope": "global", "address": "10.4.0.17", "netmask": "24"}
                            ]
                        }
                    }
                }
            }]"#,
        );

        assert_eq!(find_global_inet(&instances[0]).unwrap(), "10.4.0.17");
    }
}
