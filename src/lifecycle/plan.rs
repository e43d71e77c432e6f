use crate::arm::models::{KeyPermission, Permissions, SecretPermission, Tags};

pub const WESTUS: &str = "westus";
pub const EASTUS: &str = "eastus";

/// How the run proceeds once the vaults have been listed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownMode {
    /// Wait for the operator to press enter
    Interactive,
    /// Delete straight away
    Automatic,
}

/// A vault the run creates, with the permissions of its first policy
#[derive(Debug, Clone, PartialEq)]
pub struct VaultSpec {
    pub name: String,
    /// Falls back to the group location
    pub location: Option<String>,
    pub permissions: Permissions,
}

impl VaultSpec {
    /// Minimal read access: get and list on keys and secrets
    pub fn primary(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: None,
            permissions: Permissions {
                keys: vec![KeyPermission::Get, KeyPermission::List],
                secrets: vec![SecretPermission::Get, SecretPermission::List],
            },
        }
    }

    pub fn secondary(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: Some(location.into()),
            permissions: Permissions {
                keys: vec![
                    KeyPermission::List,
                    KeyPermission::Get,
                    KeyPermission::Decrypt,
                ],
                secrets: vec![SecretPermission::Get],
            },
        }
    }
}

/// Everything one lifecycle run creates and how it ends
#[derive(Debug, Clone, PartialEq)]
pub struct LifecyclePlan {
    pub group_name: String,
    pub location: String,
    pub tags: Option<Tags>,
    pub primary: VaultSpec,
    pub secondary: Option<VaultSpec>,
    pub teardown: TeardownMode,
    /// Principal granted access; defaults to the client identity
    pub object_id: Option<String>,
}

impl LifecyclePlan {
    /// Two vaults in two regions, pause before teardown
    pub fn walkthrough() -> Self {
        Self {
            group_name: "keyvault-rs-sample-group".to_string(),
            location: WESTUS.to_string(),
            tags: None,
            primary: VaultSpec::primary("keyvaultrs1"),
            secondary: Some(VaultSpec::secondary("keyvaultrs2", EASTUS)),
            teardown: TeardownMode::Interactive,
            object_id: None,
        }
    }

    /// One vault, unattended teardown
    pub fn quickstart() -> Self {
        Self {
            group_name: "vaultSampleResourceGroup".to_string(),
            location: WESTUS.to_string(),
            tags: None,
            primary: VaultSpec::primary("myvault"),
            secondary: None,
            teardown: TeardownMode::Automatic,
            object_id: None,
        }
    }

    pub fn vault_location<'a>(&'a self, spec: &'a VaultSpec) -> &'a str {
        spec.location.as_deref().unwrap_or(&self.location)
    }

    /// Names of every vault the plan creates, in creation order
    pub fn vault_names(&self) -> Vec<&str> {
        std::iter::once(&self.primary)
            .chain(self.secondary.as_ref())
            .map(|spec| spec.name.as_str())
            .collect()
    }
}
