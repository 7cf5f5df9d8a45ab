pub mod client;
pub mod connect;
pub mod probe;
pub mod provision;

pub use client::{choose_client, resolve_client, ClientChoice};
pub use connect::{ProcessLauncher, SessionLauncher};
pub use probe::{ClientProbe, Probe};
pub use provision::{ConnectionTarget, CredentialProvisioner, SshPaths};
