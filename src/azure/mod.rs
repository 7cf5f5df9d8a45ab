pub mod cli;
pub mod models;

#[cfg(test)]
pub(crate) mod fake;

pub use cli::{AzCli, AzureCli, SshConfigRequest};
pub use models::{Subscription, SubscriptionContext, VirtualMachine};
