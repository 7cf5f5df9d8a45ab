use tracing::{info, warn};

use crate::azure::{AzureCli, Subscription, SubscriptionContext, VirtualMachine};
use crate::cli::select::{ask_required, select, Prompt};
use crate::ssh::{
    choose_client, resolve_client, ClientChoice, ClientProbe, ConnectionTarget,
    CredentialProvisioner, SessionLauncher, SshPaths,
};
use crate::{EntraSshError, Result};

pub const SUBSCRIPTION_MENU: &str = "Select subscription";
pub const RESOURCE_GROUP_MENU: &str = "Select resource group";
pub const VM_MENU: &str = "Select virtual machine";

/// Options from the command line
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    pub resource_group: Option<String>,
    pub vm_name: Option<String>,
    pub client: ClientChoice,
    pub interactive: bool,
    pub prefer_private_ip: bool,
    pub subscription: Option<String>,
}

/// External collaborators of the connect flow
pub struct Collaborators<'a> {
    pub az: &'a dyn AzureCli,
    pub probe: &'a dyn ClientProbe,
    pub launcher: &'a dyn SessionLauncher,
    pub prompt: &'a mut dyn Prompt,
}

/// Check prerequisites, pick a VM and client, mint a certificate and connect.
/// Returns the SSH session's exit status; the first failure aborts the run.
pub fn execute(
    env: Collaborators<'_>,
    paths: &SshPaths,
    extension: &str,
    options: ConnectOptions,
) -> Result<i32> {
    let Collaborators {
        az,
        probe,
        launcher,
        prompt,
    } = env;

    if !az.is_available() {
        return Err(EntraSshError::AzureCliNotFound);
    }
    ensure_logged_in(az, prompt)?;
    ensure_extension(az, prompt, extension)?;
    paths.ensure()?;

    let availability = probe.detect();

    let (target, subscription, client) = if options.interactive {
        let (target, subscription) = select_target(az, prompt)?;
        let client = choose_client(prompt, availability, options.client)?;
        (target, subscription, client)
    } else {
        let target = direct_target(prompt, &options)?;
        let subscription = options
            .subscription
            .clone()
            .map(SubscriptionContext::new)
            .unwrap_or_else(SubscriptionContext::active);
        let client = resolve_client(availability, options.client)?;
        (target, subscription, client)
    };

    let alias = CredentialProvisioner::new(az, paths).provision(
        &target,
        &subscription,
        options.prefer_private_ip,
    )?;

    prompt.show(&format!("Connecting to {} ({}) with {}...", target, alias, client));
    launcher.launch(client, &paths.config_file, &alias)
}

/// One retry through `az login`, then give up
fn ensure_logged_in(az: &dyn AzureCli, prompt: &mut dyn Prompt) -> Result<()> {
    let account = match az.account()? {
        Some(account) => account,
        None => {
            prompt.show("Not logged in to Azure, starting 'az login'...");
            az.login()?;
            az.account()?.ok_or(EntraSshError::NotLoggedIn)?
        }
    };

    info!(user = account.user_name(), subscription = %account.name, "signed in");
    Ok(())
}

fn ensure_extension(az: &dyn AzureCli, prompt: &mut dyn Prompt, name: &str) -> Result<()> {
    if az.extension_installed(name)? {
        return Ok(());
    }

    prompt.show(&format!("Installing Azure CLI extension '{}'...", name));
    az.install_extension(name)
}

fn direct_target(prompt: &mut dyn Prompt, options: &ConnectOptions) -> Result<ConnectionTarget> {
    let resource_group = match &options.resource_group {
        Some(rg) => rg.clone(),
        None => ask_required(prompt, "Resource group")?,
    };
    let vm_name = match &options.vm_name {
        Some(name) => name.clone(),
        None => ask_required(prompt, "VM name")?,
    };

    Ok(ConnectionTarget {
        resource_group,
        vm_name,
    })
}

/// Subscription, then resource group (only when there are several), then VM
fn select_target(
    az: &dyn AzureCli,
    prompt: &mut dyn Prompt,
) -> Result<(ConnectionTarget, SubscriptionContext)> {
    let subscriptions = az.list_subscriptions()?;
    if subscriptions.is_empty() {
        return Err(EntraSshError::NoSubscriptions);
    }

    let subscription = select(prompt, SUBSCRIPTION_MENU, &subscriptions, Subscription::label)?;
    az.set_subscription(&subscription.id)?;
    let context = SubscriptionContext::new(subscription.id.clone());

    let vms = az.list_vms(&context)?;
    if vms.is_empty() {
        return Err(EntraSshError::NoVirtualMachines(subscription.name.clone()));
    }

    let groups = resource_groups(&vms);
    let group = match groups.as_slice() {
        [only] => only.clone(),
        _ => select(prompt, RESOURCE_GROUP_MENU, &groups, String::clone)?.clone(),
    };

    let candidates: Vec<&VirtualMachine> = vms
        .iter()
        .filter(|vm| vm.resource_group.eq_ignore_ascii_case(&group))
        .collect();
    let vm = *select(prompt, VM_MENU, &candidates, |vm| vm.label())?;

    if !vm.is_running() {
        warn!(vm = %vm.name, state = ?vm.power_state, "VM does not report running");
    }

    let target = ConnectionTarget {
        resource_group: vm.resource_group.clone(),
        vm_name: vm.name.clone(),
    };
    Ok((target, context))
}

/// Distinct resource groups, sorted case-insensitively
fn resource_groups(vms: &[VirtualMachine]) -> Vec<String> {
    let mut groups: Vec<String> = vms.iter().map(|vm| vm.resource_group.clone()).collect();
    groups.sort_by_key(|g| g.to_lowercase());
    groups.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
    groups
}
