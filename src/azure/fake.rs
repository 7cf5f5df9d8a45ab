//! In-memory `AzureCli` for tests.

use std::cell::{Cell, RefCell};

use super::cli::{AzureCli, SshConfigRequest};
use super::models::{Account, Subscription, SubscriptionContext, VirtualMachine};
use crate::{EntraSshError, Result};

pub(crate) struct FakeAzure {
    pub available: bool,
    pub logged_in: Cell<bool>,
    pub login_succeeds: bool,
    pub extension: Cell<bool>,
    pub install_fails: bool,
    pub subscriptions: Vec<Subscription>,
    pub vms: Vec<VirtualMachine>,
    /// Text written as the generated ssh config
    pub config_content: String,
    pub calls: RefCell<Vec<String>>,
    pub ssh_requests: RefCell<Vec<SshConfigRequest>>,
}

impl Default for FakeAzure {
    fn default() -> Self {
        Self {
            available: true,
            logged_in: Cell::new(true),
            login_succeeds: true,
            extension: Cell::new(true),
            install_fails: false,
            subscriptions: vec![subscription("sub-1", "Dev")],
            vms: vec![vm("vm01", "RG1")],
            config_content: "Host RG1-vm01\n\tHostName 10.0.0.4\n".to_string(),
            calls: RefCell::new(Vec::new()),
            ssh_requests: RefCell::new(Vec::new()),
        }
    }
}

impl FakeAzure {
    fn record(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }

    pub fn called(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

pub(crate) fn subscription(id: &str, name: &str) -> Subscription {
    Subscription {
        id: id.to_string(),
        name: name.to_string(),
        is_default: false,
    }
}

pub(crate) fn vm(name: &str, resource_group: &str) -> VirtualMachine {
    VirtualMachine {
        name: name.to_string(),
        resource_group: resource_group.to_string(),
        location: "eastus".to_string(),
        power_state: Some("VM running".to_string()),
        public_ips: None,
        private_ips: Some("10.0.0.4".to_string()),
    }
}

impl AzureCli for FakeAzure {
    fn is_available(&self) -> bool {
        self.available
    }

    fn account(&self) -> Result<Option<Account>> {
        self.record("account");
        Ok(self.logged_in.get().then(|| Account {
            name: "Dev".to_string(),
            user: None,
        }))
    }

    fn login(&self) -> Result<()> {
        self.record("login");
        if self.login_succeeds {
            self.logged_in.set(true);
        }
        Ok(())
    }

    fn list_subscriptions(&self) -> Result<Vec<Subscription>> {
        self.record("list_subscriptions");
        Ok(self.subscriptions.clone())
    }

    fn set_subscription(&self, id: &str) -> Result<()> {
        self.record(format!("set_subscription {}", id));
        Ok(())
    }

    fn extension_installed(&self, _name: &str) -> Result<bool> {
        self.record("extension_installed");
        Ok(self.extension.get())
    }

    fn install_extension(&self, name: &str) -> Result<()> {
        self.record("install_extension");
        if self.install_fails {
            return Err(EntraSshError::ExtensionInstall {
                name: name.to_string(),
                reason: "network unreachable".to_string(),
            });
        }
        self.extension.set(true);
        Ok(())
    }

    fn list_vms(&self, subscription: &SubscriptionContext) -> Result<Vec<VirtualMachine>> {
        self.record(format!("list_vms {}", subscription.describe()));
        Ok(self.vms.clone())
    }

    fn generate_ssh_config(&self, request: &SshConfigRequest) -> Result<()> {
        self.record("generate_ssh_config");
        self.ssh_requests.borrow_mut().push(request.clone());

        // Like az, refuse to clobber existing files unless asked to
        let overwrite = request.args().iter().any(|a| a == "--overwrite");
        if request.config_file.exists() && !overwrite {
            return Err(EntraSshError::AzureCli("config file already exists".to_string()));
        }

        std::fs::write(&request.config_file, &self.config_content)?;
        std::fs::write(request.keys_dir.join("id_rsa"), "private")?;
        std::fs::write(request.keys_dir.join("id_rsa.pub-aadcert.pub"), "cert")?;
        Ok(())
    }
}
