use crate::arm::models::{KeyPermission, SecretPermission, Tags, Vault};
use crate::arm::models::VaultCreateOrUpdateParameters;
use crate::utils::errors::{KeyVaultCliError, Result};

/// Field changes applied on top of a vault's current state.
///
/// Unset fields keep their current value. Permission changes apply to the
/// first access policy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VaultUpdate {
    pub enabled_for_deployment: Option<bool>,
    pub enabled_for_template_deployment: Option<bool>,
    pub enabled_for_disk_encryption: Option<bool>,
    pub key_permissions: Option<Vec<KeyPermission>>,
    pub secret_permissions: Option<Vec<SecretPermission>>,
    pub tags: Option<Tags>,
}

impl VaultUpdate {
    /// Enable VM and template deployment and grant every secret operation
    pub fn enable_deployment() -> Self {
        Self {
            enabled_for_deployment: Some(true),
            enabled_for_template_deployment: Some(true),
            secret_permissions: Some(vec![SecretPermission::All]),
            ..Self::default()
        }
    }

    fn touches_policy(&self) -> bool {
        self.key_permissions.is_some() || self.secret_permissions.is_some()
    }
}

/// Build the full replacement object from the current vault plus `update`.
///
/// The service has no partial update, so everything the update does not
/// name is copied from `current`.
pub fn merge_update(current: &Vault, update: &VaultUpdate) -> Result<VaultCreateOrUpdateParameters> {
    let mut params = VaultCreateOrUpdateParameters::from(current);
    let properties = &mut params.properties;

    if let Some(enabled) = update.enabled_for_deployment {
        properties.enabled_for_deployment = Some(enabled);
    }
    if let Some(enabled) = update.enabled_for_template_deployment {
        properties.enabled_for_template_deployment = Some(enabled);
    }
    if let Some(enabled) = update.enabled_for_disk_encryption {
        properties.enabled_for_disk_encryption = Some(enabled);
    }

    if update.touches_policy() {
        let policy = properties.access_policies.first_mut().ok_or_else(|| {
            KeyVaultCliError::InvalidInput(format!(
                "Key vault '{}' has no access policy to update",
                current.display_name()
            ))
        })?;
        if let Some(keys) = &update.key_permissions {
            policy.permissions.keys = keys.clone();
        }
        if let Some(secrets) = &update.secret_permissions {
            policy.permissions.secrets = secrets.clone();
        }
    }

    if let Some(tags) = &update.tags {
        params.tags = Some(tags.clone());
    }

    Ok(params)
}
