use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::ssh::{ClientChoice, SshPaths};
use crate::{EntraSshError, Result};

pub const DEFAULT_CONFIG_FILE: &str = "config";
pub const DEFAULT_KEYS_FOLDER: &str = "keys";
pub const DEFAULT_EXTENSION: &str = "ssh";

/// Global settings for entra-ssh
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Directory holding the generated config and keys (default ~/.ssh/az_ssh_config)
    #[serde(default)]
    pub ssh_dir: Option<PathBuf>,

    /// File name of the generated SSH config inside `ssh_dir`
    #[serde(default)]
    pub config_file: Option<String>,

    /// Sub-folder of `ssh_dir` receiving keys and certificates
    #[serde(default)]
    pub keys_folder: Option<String>,

    /// Azure CLI extension providing `az ssh`
    #[serde(default)]
    pub extension: Option<String>,

    /// Client used when --client is not given
    #[serde(default)]
    pub default_client: Option<String>,
}

impl Settings {
    /// Get the path to the config file
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "entra-ssh").map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load settings from the config file
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load settings from an explicit path; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content).map_err(|e| {
            EntraSshError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn extension_name(&self) -> &str {
        self.extension.as_deref().unwrap_or(DEFAULT_EXTENSION)
    }

    /// Client preference from the settings file, if one is set
    pub fn client_choice(&self) -> Result<Option<ClientChoice>> {
        self.default_client
            .as_deref()
            .map(str::parse::<ClientChoice>)
            .transpose()
    }

    /// Resolve the generated config file and keys directory.
    /// `keys_override` (from --keys-folder) wins over the settings file.
    pub fn ssh_paths(&self, keys_override: Option<&str>) -> Result<SshPaths> {
        let dir = match &self.ssh_dir {
            Some(dir) => dir.clone(),
            None => default_ssh_dir()?,
        };

        let config_file = self.config_file.as_deref().unwrap_or(DEFAULT_CONFIG_FILE);
        validate_folder_name(config_file)?;

        let keys_folder = keys_override
            .or(self.keys_folder.as_deref())
            .unwrap_or(DEFAULT_KEYS_FOLDER);
        validate_folder_name(keys_folder)?;

        Ok(SshPaths::new(
            dir.join(config_file),
            dir.join(keys_folder),
        ))
    }
}

/// ~/.ssh/az_ssh_config
fn default_ssh_dir() -> Result<PathBuf> {
    let home = BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .ok_or_else(|| EntraSshError::Config("Cannot determine home directory".to_string()))?;

    Ok(home.join(".ssh").join("az_ssh_config"))
}

/// Names placed under the SSH directory must be a single plain path segment
pub fn validate_folder_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(EntraSshError::Config(format!(
            "'{}' must be a single folder name inside the SSH directory",
            name
        ))),
    }
}
