//! Detection of locally installed SSH clients.
//!
//! Absence of a client is a normal outcome; probing never fails.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use directories::UserDirs;
use tracing::debug;

/// Which SSH-capable clients were found on this machine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientAvailability {
    /// OpenSSH `ssh` on PATH
    pub winssh: bool,
    /// MobaXterm install or profile directory
    pub mobaxterm: bool,
    /// PuTTY or plink on PATH (cannot use the issued certificates)
    pub putty: bool,
}

pub trait ClientProbe {
    fn detect(&self) -> ClientAvailability;

    /// Executable used to launch MobaXterm sessions, when one is known
    fn mobaxterm_executable(&self) -> Option<PathBuf> {
        None
    }
}

#[derive(Debug, Clone, Default)]
pub struct Probe {
    /// PATH override; `None` uses the process environment
    search_path: Option<OsString>,
    mobaxterm_dirs: Vec<PathBuf>,
    mobaxterm_profile: Option<PathBuf>,
}

impl Probe {
    /// Probe using PATH and the well-known MobaXterm locations
    pub fn from_env() -> Self {
        let mobaxterm_dirs = ["ProgramFiles(x86)", "ProgramFiles"]
            .iter()
            .filter_map(std::env::var_os)
            .map(|root| PathBuf::from(root).join("Mobatek").join("MobaXterm"))
            .collect();

        let mobaxterm_profile = UserDirs::new()
            .and_then(|dirs| dirs.document_dir().map(|d| d.join("MobaXterm")));

        Self {
            search_path: None,
            mobaxterm_dirs,
            mobaxterm_profile,
        }
    }

    fn find(&self, name: &str) -> Option<PathBuf> {
        let found = match &self.search_path {
            Some(path) => {
                let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
                which::which_in(name, Some(path), cwd)
            }
            None => which::which(name),
        };
        found.ok()
    }

    pub fn has_winssh(&self) -> bool {
        self.find("ssh").is_some()
    }

    pub fn has_mobaxterm(&self) -> bool {
        self.mobaxterm_dirs.iter().any(|d| d.is_dir())
            || self.mobaxterm_profile.as_deref().is_some_and(Path::is_dir)
    }

    pub fn has_putty(&self) -> bool {
        self.find("putty").is_some() || self.find("plink").is_some()
    }
}

impl ClientProbe for Probe {
    fn detect(&self) -> ClientAvailability {
        let availability = ClientAvailability {
            winssh: self.has_winssh(),
            mobaxterm: self.has_mobaxterm(),
            putty: self.has_putty(),
        };
        debug!(?availability, "detected SSH clients");
        availability
    }

    fn mobaxterm_executable(&self) -> Option<PathBuf> {
        self.mobaxterm_dirs
            .iter()
            .map(|d| d.join("MobaXterm.exe"))
            .find(|exe| exe.is_file())
            .or_else(|| self.find("MobaXterm"))
    }
}
