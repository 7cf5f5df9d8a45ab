use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use super::models::{Account, Subscription, SubscriptionContext, VirtualMachine};
use crate::{EntraSshError, Result};

/// JMESPath projection keeping only the fields we display and connect with
const VM_QUERY: &str = "[].{name:name, resourceGroup:resourceGroup, location:location, \
                        powerState:powerState, publicIps:publicIps, privateIps:privateIps}";

/// Everything `az ssh config` needs to mint a certificate for one VM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshConfigRequest {
    pub config_file: PathBuf,
    pub keys_dir: PathBuf,
    pub resource_group: String,
    pub vm_name: String,
    pub prefer_private_ip: bool,
    pub subscription: SubscriptionContext,
}

impl SshConfigRequest {
    /// Arguments for `az`. `--overwrite` keeps repeated runs from failing on
    /// files left by the previous certificate.
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "ssh".into(),
            "config".into(),
            "--file".into(),
            self.config_file.clone().into(),
            "--name".into(),
            self.vm_name.clone().into(),
            "--resource-group".into(),
            self.resource_group.clone().into(),
            "--keys-destination-folder".into(),
            self.keys_dir.clone().into(),
            "--overwrite".into(),
        ];

        if self.prefer_private_ip {
            args.push("--prefer-private-ip".into());
        }

        args.extend(self.subscription.args().into_iter().map(OsString::from));
        args
    }
}

/// Operations consumed from the Azure CLI
pub trait AzureCli {
    /// Whether the `az` executable could be found
    fn is_available(&self) -> bool;

    /// Currently signed-in account, `None` if there is no session
    fn account(&self) -> Result<Option<Account>>;

    /// Run the login step once
    fn login(&self) -> Result<()>;

    fn list_subscriptions(&self) -> Result<Vec<Subscription>>;

    fn set_subscription(&self, id: &str) -> Result<()>;

    fn extension_installed(&self, name: &str) -> Result<bool>;

    fn install_extension(&self, name: &str) -> Result<()>;

    fn list_vms(&self, subscription: &SubscriptionContext) -> Result<Vec<VirtualMachine>>;

    /// Write the SSH config file and issue key/certificate material
    fn generate_ssh_config(&self, request: &SshConfigRequest) -> Result<()>;
}

/// `AzureCli` backed by the real `az` executable
#[derive(Debug, Clone)]
pub struct AzCli {
    program: Option<PathBuf>,
}

impl AzCli {
    /// Locate `az` on PATH (resolves `az.cmd` on Windows)
    pub fn locate() -> Self {
        let program = which::which("az").ok();
        debug!(program = ?program, "located Azure CLI");
        Self { program }
    }

    fn command(&self) -> Result<Command> {
        let program = self
            .program
            .as_deref()
            .ok_or(EntraSshError::AzureCliNotFound)?;
        Ok(Command::new(program))
    }

    /// Run az capturing output
    fn output(&self, args: &[OsString]) -> Result<Output> {
        debug!(command = %display_command(args), "running az");
        let output = self
            .command()?
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(EntraSshError::azure_cli)?;
        debug!(status = ?output.status.code(), "az finished");
        Ok(output)
    }

    /// Run az and fail with its stderr when it exits non-zero
    fn run(&self, args: &[OsString]) -> Result<Output> {
        let output = self.output(args)?;
        if !output.status.success() {
            return Err(EntraSshError::AzureCli(failure_message(args, &output)));
        }
        Ok(output)
    }

    fn run_json<T: serde::de::DeserializeOwned>(&self, args: &[OsString]) -> Result<T> {
        let output = self.run(args)?;
        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

impl AzureCli for AzCli {
    fn is_available(&self) -> bool {
        self.program.is_some()
    }

    fn account(&self) -> Result<Option<Account>> {
        let output = self.output(&os_args(&["account", "show", "--output", "json"]))?;
        if !output.status.success() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&output.stdout)?))
    }

    fn login(&self) -> Result<()> {
        // Attached to the terminal so device-code or browser prompts reach the user
        debug!("running az login");
        let status = self
            .command()?
            .args(["login", "--output", "none"])
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(EntraSshError::azure_cli)?;

        if !status.success() {
            debug!(code = ?status.code(), "az login did not succeed");
        }
        Ok(())
    }

    fn list_subscriptions(&self) -> Result<Vec<Subscription>> {
        self.run_json(&os_args(&["account", "list", "--output", "json"]))
    }

    fn set_subscription(&self, id: &str) -> Result<()> {
        self.run(&os_args(&["account", "set", "--subscription", id]))?;
        Ok(())
    }

    fn extension_installed(&self, name: &str) -> Result<bool> {
        let output = self.output(&os_args(&["extension", "show", "--name", name, "--output", "json"]))?;
        Ok(output.status.success())
    }

    fn install_extension(&self, name: &str) -> Result<()> {
        let args = os_args(&["extension", "add", "--name", name, "--yes", "--output", "none"]);
        let output = self.output(&args)?;
        if !output.status.success() {
            return Err(EntraSshError::ExtensionInstall {
                name: name.to_string(),
                reason: failure_message(&args, &output),
            });
        }
        Ok(())
    }

    fn list_vms(&self, subscription: &SubscriptionContext) -> Result<Vec<VirtualMachine>> {
        let mut args = os_args(&["vm", "list", "--show-details", "--query", VM_QUERY, "--output", "json"]);
        args.extend(subscription.args().into_iter().map(OsString::from));

        let spinner = create_spinner("Listing virtual machines...");
        let result = self.run_json(&args);
        spinner.finish_and_clear();
        result
    }

    fn generate_ssh_config(&self, request: &SshConfigRequest) -> Result<()> {
        let spinner = create_spinner(&format!(
            "Issuing SSH certificate for {}/{}...",
            request.resource_group, request.vm_name
        ));
        let result = self.run(&request.args());
        spinner.finish_and_clear();
        result.map(|_| ())
    }
}

fn os_args(args: &[&str]) -> Vec<OsString> {
    args.iter().map(OsString::from).collect()
}

fn display_command(args: &[OsString]) -> String {
    let mut line = String::from("az");
    for arg in args {
        line.push(' ');
        line.push_str(&shell_escape::unix::escape(arg.to_string_lossy()));
    }
    line
}

fn failure_message(args: &[OsString], output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!(
            "'{}' exited with code {:?}",
            display_command(args),
            output.status.code()
        )
    } else {
        stderr.to_string()
    }
}

fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
