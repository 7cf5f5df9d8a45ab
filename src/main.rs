use clap::Parser;

mod azure;
mod cli;
mod config;
mod error;
mod logging;
mod ssh;

pub use error::{EntraSshError, Result};

use crate::azure::AzCli;
use crate::cli::commands::connect::{self, Collaborators, ConnectOptions};
use crate::cli::select::TerminalPrompt;
use crate::config::Settings;
use crate::ssh::{ClientChoice, ProcessLauncher, Probe};

#[derive(Parser)]
#[command(name = "entra-ssh")]
#[command(about = "SSH into Azure VMs with short-lived Entra ID certificates")]
#[command(version)]
struct Cli {
    /// Resource group of the VM (prompted if omitted)
    #[arg(short = 'g', long)]
    resource_group: Option<String>,

    /// VM name (prompted if omitted)
    #[arg(short, long)]
    name: Option<String>,

    /// SSH client to use; falls back automatically if unavailable
    #[arg(short, long, value_enum)]
    client: Option<ClientChoice>,

    /// Pick subscription, resource group and VM from menus
    #[arg(short, long)]
    interactive: bool,

    /// Connect to the VM's private IP (e.g. over VPN)
    #[arg(long)]
    prefer_private_ip: bool,

    /// Folder under the SSH config directory receiving keys and certificates
    #[arg(long, value_name = "NAME")]
    keys_folder: Option<String>,

    /// Subscription to use without changing the active one (ignored with --interactive)
    #[arg(short, long)]
    subscription: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Some(guidance) = e.guidance() {
                eprintln!();
                eprintln!("{}", guidance);
            }
            1
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    let settings = Settings::load()?;
    let paths = settings.ssh_paths(cli.keys_folder.as_deref())?;
    let client = match cli.client {
        Some(client) => client,
        None => settings.client_choice()?.unwrap_or_default(),
    };

    let options = ConnectOptions {
        resource_group: cli.resource_group,
        vm_name: cli.name,
        client,
        interactive: cli.interactive,
        prefer_private_ip: cli.prefer_private_ip,
        subscription: cli.subscription,
    };

    let az = AzCli::locate();
    let probe = Probe::from_env();
    let launcher = ProcessLauncher::new(&probe);
    let mut prompt = TerminalPrompt;

    connect::execute(
        Collaborators {
            az: &az,
            probe: &probe,
            launcher: &launcher,
            prompt: &mut prompt,
        },
        &paths,
        settings.extension_name(),
        options,
    )
}
