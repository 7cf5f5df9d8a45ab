use std::fmt;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::azure::{AzureCli, SshConfigRequest, SubscriptionContext};
use crate::{EntraSshError, Result};

static HOST_LINE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Host\s+(\S+)").expect("Invalid host line regex"));

/// Where the generated config and certificate material live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshPaths {
    pub config_file: PathBuf,
    pub keys_dir: PathBuf,
}

impl SshPaths {
    pub fn new(config_file: PathBuf, keys_dir: PathBuf) -> Self {
        Self {
            config_file,
            keys_dir,
        }
    }

    /// Create the config directory and keys directory if missing
    pub fn ensure(&self) -> Result<()> {
        if let Some(parent) = self.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::create_dir_all(&self.keys_dir)?;
        Ok(())
    }
}

/// Resource group and VM to connect to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub resource_group: String,
    pub vm_name: String,
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_group, self.vm_name)
    }
}

/// Name of the `Host` stanza to connect with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostAlias(String);

impl HostAlias {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// First `Host <alias>` line of an ssh config
pub fn parse_host_alias(content: &str) -> Option<HostAlias> {
    content.lines().find_map(|line| {
        HOST_LINE_REGEX
            .captures(line)
            .map(|caps| HostAlias(caps[1].to_string()))
    })
}

/// Read a generated config and extract its host alias
pub fn read_host_alias(config_file: &Path) -> Result<HostAlias> {
    let content = match std::fs::read_to_string(config_file) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(EntraSshError::host_alias(config_file))
        }
        Err(e) => return Err(e.into()),
    };

    parse_host_alias(&content).ok_or_else(|| EntraSshError::host_alias(config_file))
}

/// Mints a fresh config + certificate through the Azure CLI
pub struct CredentialProvisioner<'a> {
    az: &'a dyn AzureCli,
    paths: &'a SshPaths,
}

impl<'a> CredentialProvisioner<'a> {
    pub fn new(az: &'a dyn AzureCli, paths: &'a SshPaths) -> Self {
        Self { az, paths }
    }

    /// Overwrites the config file and keys on every call, so repeating it is safe
    pub fn provision(
        &self,
        target: &ConnectionTarget,
        subscription: &SubscriptionContext,
        prefer_private_ip: bool,
    ) -> Result<HostAlias> {
        let request = SshConfigRequest {
            config_file: self.paths.config_file.clone(),
            keys_dir: self.paths.keys_dir.clone(),
            resource_group: target.resource_group.clone(),
            vm_name: target.vm_name.clone(),
            prefer_private_ip,
            subscription: subscription.clone(),
        };

        info!(%target, subscription = subscription.describe(), "issuing SSH certificate");
        self.az.generate_ssh_config(&request)?;

        let alias = read_host_alias(&self.paths.config_file)?;
        debug!(%alias, config = %self.paths.config_file.display(), "found host alias");
        Ok(alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::azure::fake::FakeAzure;

    const GENERATED: &str = "\
Host my-vm01-eastus
\tUser alice@contoso.com
\tHostName 20.1.2.3
\tCertificateFile \"/home/u/.ssh/az_ssh_config/keys/id_rsa.pub-aadcert.pub\"
\tIdentityFile \"/home/u/.ssh/az_ssh_config/keys/id_rsa\"
";

    #[test]
    fn test_parse_host_alias() {
        let alias = parse_host_alias(GENERATED).unwrap();
        assert_eq!(alias.as_str(), "my-vm01-eastus");
    }

    #[test]
    fn test_parse_first_host_wins() {
        let content = "# generated\nHost first\n\tHostName a\nHost second\n";
        assert_eq!(parse_host_alias(content).unwrap().as_str(), "first");
    }

    #[test]
    fn test_parse_ignores_hostname_and_indented() {
        assert!(parse_host_alias("HostName 1.2.3.4\n  Host indented\n").is_none());
        assert!(parse_host_alias("").is_none());
        assert!(parse_host_alias("Host\n").is_none());
    }

    #[test]
    fn test_read_host_alias_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(
            read_host_alias(&missing),
            Err(EntraSshError::HostAlias(_))
        ));

        let empty = dir.path().join("empty");
        std::fs::write(&empty, "").unwrap();
        assert!(matches!(
            read_host_alias(&empty),
            Err(EntraSshError::HostAlias(_))
        ));
    }

    #[test]
    fn test_ensure_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join(".ssh").join("az_ssh_config");
        let paths = SshPaths::new(base.join("config"), base.join("keys"));

        paths.ensure().unwrap();
        paths.ensure().unwrap();
        assert!(base.is_dir());
        assert!(paths.keys_dir.is_dir());
    }

    fn temp_paths(dir: &Path) -> SshPaths {
        let paths = SshPaths::new(dir.join("config"), dir.join("keys"));
        paths.ensure().unwrap();
        paths
    }

    fn target() -> ConnectionTarget {
        ConnectionTarget {
            resource_group: "RG1".to_string(),
            vm_name: "vm01".to_string(),
        }
    }

    #[test]
    fn test_provision_returns_alias_from_generated_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths = temp_paths(dir.path());
        let az = FakeAzure {
            config_content: GENERATED.to_string(),
            ..Default::default()
        };

        let alias = CredentialProvisioner::new(&az, &paths)
            .provision(&target(), &SubscriptionContext::new("sub-1"), true)
            .unwrap();

        assert_eq!(alias.as_str(), "my-vm01-eastus");
        let requests = az.ssh_requests.borrow();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].prefer_private_ip);
        assert_eq!(requests[0].subscription, SubscriptionContext::new("sub-1"));
        assert_eq!(requests[0].keys_dir, paths.keys_dir);
    }

    #[test]
    fn test_provision_twice_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let paths = temp_paths(dir.path());
        let az = FakeAzure::default();
        let provisioner = CredentialProvisioner::new(&az, &paths);

        let first = provisioner
            .provision(&target(), &SubscriptionContext::active(), false)
            .unwrap();
        let second = provisioner
            .provision(&target(), &SubscriptionContext::active(), false)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(az.called("generate_ssh_config"), 2);
    }

    #[test]
    fn test_provision_without_host_stanza_fails() {
        let dir = tempfile::tempdir().unwrap();
        let paths = temp_paths(dir.path());
        let az = FakeAzure {
            config_content: "# nothing useful\n\tHostName 1.2.3.4\n".to_string(),
            ..Default::default()
        };

        let result = CredentialProvisioner::new(&az, &paths).provision(
            &target(),
            &SubscriptionContext::active(),
            false,
        );
        assert!(matches!(result, Err(EntraSshError::HostAlias(_))));
    }
}
