use std::borrow::Cow;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use shell_escape::escape;
use tracing::{debug, info};

use super::client::SshClient;
use super::probe::ClientProbe;
use super::provision::HostAlias;
use crate::{EntraSshError, Result};

/// Program and arguments that start an interactive session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshInvocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl SshInvocation {
    /// `ssh -F <config> <alias>`
    pub fn openssh(config_file: &Path, alias: &HostAlias) -> Self {
        Self {
            program: PathBuf::from("ssh"),
            args: vec![
                "-F".into(),
                config_file.as_os_str().to_os_string(),
                alias.as_str().into(),
            ],
        }
    }

    /// MobaXterm opens a new tab running its bundled ssh against the same config.
    /// The tab runs a POSIX shell, hence unix quoting on every platform.
    pub fn mobaxterm(executable: PathBuf, config_file: &Path, alias: &HostAlias) -> Self {
        let config = config_file.to_string_lossy();
        let command = format!(
            "ssh -F {} {}",
            shell_escape::unix::escape(Cow::Borrowed(config.as_ref())),
            shell_escape::unix::escape(Cow::Borrowed(alias.as_str()))
        );

        Self {
            program: executable,
            args: vec!["-newtab".into(), command.into()],
        }
    }

    pub fn display(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&escape(arg.to_string_lossy()));
        }
        line
    }
}

/// Starts the SSH session and returns its exit status
pub trait SessionLauncher {
    fn launch(&self, client: SshClient, config_file: &Path, alias: &HostAlias) -> Result<i32>;
}

/// Runs the client as a child process attached to this terminal
pub struct ProcessLauncher<'a> {
    probe: &'a dyn ClientProbe,
}

impl<'a> ProcessLauncher<'a> {
    pub fn new(probe: &'a dyn ClientProbe) -> Self {
        Self { probe }
    }

    pub fn invocation(
        &self,
        client: SshClient,
        config_file: &Path,
        alias: &HostAlias,
    ) -> Result<SshInvocation> {
        match client {
            SshClient::WindowsSsh => Ok(SshInvocation::openssh(config_file, alias)),
            SshClient::MobaXterm => {
                let executable = self
                    .probe
                    .mobaxterm_executable()
                    .unwrap_or_else(|| PathBuf::from("MobaXterm"));
                Ok(SshInvocation::mobaxterm(executable, config_file, alias))
            }
            SshClient::Putty => Err(EntraSshError::IncompatibleClient(client.name().to_string())),
        }
    }
}

impl SessionLauncher for ProcessLauncher<'_> {
    fn launch(&self, client: SshClient, config_file: &Path, alias: &HostAlias) -> Result<i32> {
        let invocation = self.invocation(client, config_file, alias)?;
        info!(%client, %alias, "connecting");
        debug!(command = %invocation.display(), "starting SSH client");

        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| {
                EntraSshError::SshCommand(format!("{}: {}", invocation.program.display(), e))
            })?;

        debug!(code = ?status.code(), "SSH session ended");
        // Killed by a signal: no code to forward
        Ok(status.code().unwrap_or(1))
    }
}
