use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EntraSshError {
    // Prerequisite Errors
    #[error("Azure CLI (az) not found. Install from: https://learn.microsoft.com/cli/azure/install-azure-cli")]
    AzureCliNotFound,

    #[error("Not logged in to Azure. Run 'az login' and try again.")]
    NotLoggedIn,

    #[error("Failed to install Azure CLI extension '{name}': {reason}")]
    ExtensionInstall { name: String, reason: String },

    #[error("Azure CLI error: {0}")]
    AzureCli(String),

    // Selection Errors
    #[error("No Azure subscriptions found for the signed-in account")]
    NoSubscriptions,

    #[error("No virtual machines found in subscription {0}")]
    NoVirtualMachines(String),

    #[error("Nothing to choose from: {0}")]
    EmptySelection(String),

    // Client Errors
    #[error("{0} cannot authenticate with Entra ID SSH certificates")]
    IncompatibleClient(String),

    #[error("No supported SSH client found. Install OpenSSH or MobaXterm.")]
    NoClient,

    #[error("Unrecognized SSH client: {0} (expected auto, winssh or mobaxterm)")]
    UnknownClient(String),

    // SSH Errors
    #[error("Could not determine host alias from {0}")]
    HostAlias(String),

    #[error("SSH command failed: {0}")]
    SshCommand(String),

    // Config Errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read input: {0}")]
    Input(String),

    // File/IO Errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EntraSshError {
    pub fn azure_cli(err: impl std::fmt::Display) -> Self {
        EntraSshError::AzureCli(err.to_string())
    }

    pub fn input(err: impl std::fmt::Display) -> Self {
        EntraSshError::Input(err.to_string())
    }

    pub fn host_alias(path: &Path) -> Self {
        EntraSshError::HostAlias(path.display().to_string())
    }

    /// Extra advice printed after the error line, if any.
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            EntraSshError::IncompatibleClient(_) => Some(concat!(
                "PuTTY does not understand the OpenSSH certificates issued by 'az ssh config'.\n",
                "Use the OpenSSH client (ssh) or MobaXterm instead:\n",
                "  entra-ssh --client winssh\n",
                "  entra-ssh --client mobaxterm"
            )),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, EntraSshError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guidance_only_for_incompatible_client() {
        assert!(EntraSshError::IncompatibleClient("PuTTY".to_string())
            .guidance()
            .is_some());
        assert!(EntraSshError::NoClient.guidance().is_none());
    }

    #[test]
    fn test_no_client_and_incompatible_messages_differ() {
        let incompatible = EntraSshError::IncompatibleClient("PuTTY".to_string()).to_string();
        let none = EntraSshError::NoClient.to_string();
        assert_ne!(incompatible, none);
        assert!(incompatible.contains("PuTTY"));
    }
}
