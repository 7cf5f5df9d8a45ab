use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use tracing::{info, warn};

use super::probe::ClientAvailability;
use crate::cli::select::{select, Prompt};
use crate::{EntraSshError, Result};

/// Client requested on the command line or in settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ClientChoice {
    /// Pick the best detected client
    #[default]
    Auto,
    /// OpenSSH ssh
    Winssh,
    /// MobaXterm's built-in ssh
    Mobaxterm,
}

impl FromStr for ClientChoice {
    type Err = EntraSshError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(ClientChoice::Auto),
            "winssh" => Ok(ClientChoice::Winssh),
            "mobaxterm" => Ok(ClientChoice::Mobaxterm),
            _ => Err(EntraSshError::UnknownClient(s.to_string())),
        }
    }
}

impl fmt::Display for ClientChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientChoice::Auto => write!(f, "auto"),
            ClientChoice::Winssh => write!(f, "winssh"),
            ClientChoice::Mobaxterm => write!(f, "mobaxterm"),
        }
    }
}

/// A concrete client found on this machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SshClient {
    WindowsSsh,
    MobaXterm,
    Putty,
}

impl SshClient {
    pub fn name(&self) -> &'static str {
        match self {
            SshClient::WindowsSsh => "OpenSSH",
            SshClient::MobaXterm => "MobaXterm",
            SshClient::Putty => "PuTTY",
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, SshClient::Putty)
    }

    pub fn label(&self) -> String {
        if self.is_supported() {
            self.name().to_string()
        } else {
            format!("{} (unsupported)", self.name())
        }
    }
}

impl fmt::Display for SshClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Detected clients in preference order
pub fn detected_clients(availability: ClientAvailability) -> Vec<SshClient> {
    let mut clients = Vec::new();
    if availability.mobaxterm {
        clients.push(SshClient::MobaXterm);
    }
    if availability.winssh {
        clients.push(SshClient::WindowsSsh);
    }
    if availability.putty {
        clients.push(SshClient::Putty);
    }
    clients
}

/// Map a client request onto one usable client.
///
/// An explicit choice that is not installed falls back to automatic selection.
pub fn resolve_client(availability: ClientAvailability, choice: ClientChoice) -> Result<SshClient> {
    match choice {
        ClientChoice::Winssh if availability.winssh => return Ok(SshClient::WindowsSsh),
        ClientChoice::Mobaxterm if availability.mobaxterm => return Ok(SshClient::MobaXterm),
        ClientChoice::Winssh | ClientChoice::Mobaxterm => {
            warn!(requested = %choice, "requested client not found, selecting automatically");
        }
        ClientChoice::Auto => {}
    }

    let client = auto_select(availability)?;
    info!(client = %client, "selected SSH client");
    Ok(client)
}

fn auto_select(availability: ClientAvailability) -> Result<SshClient> {
    if availability.mobaxterm {
        Ok(SshClient::MobaXterm)
    } else if availability.winssh {
        Ok(SshClient::WindowsSsh)
    } else if availability.putty {
        Err(EntraSshError::IncompatibleClient(SshClient::Putty.name().to_string()))
    } else {
        Err(EntraSshError::NoClient)
    }
}

/// Interactive variant: offer every detected client, PuTTY included, and
/// reject an unsupported pick before anything is provisioned.
pub fn choose_client(
    prompt: &mut dyn Prompt,
    availability: ClientAvailability,
    choice: ClientChoice,
) -> Result<SshClient> {
    if choice != ClientChoice::Auto {
        return resolve_client(availability, choice);
    }

    let clients = detected_clients(availability);
    let client = match clients.as_slice() {
        [] => return Err(EntraSshError::NoClient),
        [only] => *only,
        _ => *select(prompt, "Select SSH client", &clients, SshClient::label)?,
    };

    if !client.is_supported() {
        return Err(EntraSshError::IncompatibleClient(client.name().to_string()));
    }
    Ok(client)
}
