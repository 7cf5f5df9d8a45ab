use serde::Deserialize;

/// Signed-in identity from `az account show`
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub name: String,
    #[serde(default)]
    pub user: Option<AccountUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountUser {
    pub name: String,
}

impl Account {
    pub fn user_name(&self) -> &str {
        self.user.as_ref().map(|u| u.name.as_str()).unwrap_or("unknown")
    }
}

/// Entry of `az account list`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
}

impl Subscription {
    pub fn label(&self) -> String {
        if self.is_default {
            format!("{} ({}) [current]", self.name, self.id)
        } else {
            format!("{} ({})", self.name, self.id)
        }
    }
}

/// VM record projected from `az vm list --show-details`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachine {
    pub name: String,
    pub resource_group: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub power_state: Option<String>,
    #[serde(default)]
    pub public_ips: Option<String>,
    #[serde(default)]
    pub private_ips: Option<String>,
}

impl VirtualMachine {
    pub fn is_running(&self) -> bool {
        self.power_state.as_deref() == Some("VM running")
    }

    pub fn label(&self) -> String {
        let mut label = format!(
            "{} ({}, {}) - {}",
            self.name,
            self.resource_group,
            self.location,
            self.power_state.as_deref().unwrap_or("unknown state")
        );

        if let Some(ip) = non_empty(&self.public_ips) {
            label.push_str(&format!(" public {}", ip));
        }
        if let Some(ip) = non_empty(&self.private_ips) {
            label.push_str(&format!(" private {}", ip));
        }

        label
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Explicit subscription scope passed to every subscription-bound az call.
/// `None` means whatever subscription is active in the az session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionContext {
    pub id: Option<String>,
}

impl SubscriptionContext {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()) }
    }

    pub fn active() -> Self {
        Self::default()
    }

    pub fn args(&self) -> Vec<String> {
        match &self.id {
            Some(id) => vec!["--subscription".to_string(), id.clone()],
            None => Vec::new(),
        }
    }

    pub fn describe(&self) -> &str {
        self.id.as_deref().unwrap_or("(active)")
    }
}
