use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const VAULT_RESOURCE_TYPE: &str = "Microsoft.KeyVault/vaults";

pub type Tags = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<ResourceGroupProperties>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroupProperties {
    pub provisioning_state: Option<String>,
}

impl ResourceGroup {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            id: None,
            name: None,
            location: location.into(),
            tags: None,
            properties: None,
        }
    }
}

/// Any resource as returned by the subscription or group listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericResource {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    pub location: Option<String>,
    pub tags: Option<Tags>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkuFamily {
    A,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkuName {
    Standard,
    Premium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sku {
    pub family: SkuFamily,
    pub name: SkuName,
}

impl Default for Sku {
    fn default() -> Self {
        Self {
            family: SkuFamily::A,
            name: SkuName::Standard,
        }
    }
}

/// Permission on keys.
///
/// Names are matched case-insensitively. Names this crate does not know are
/// kept verbatim, so a policy read back and resubmitted is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum KeyPermission {
    All,
    Get,
    List,
    Create,
    Update,
    Import,
    Delete,
    Backup,
    Restore,
    Recover,
    Purge,
    Encrypt,
    Decrypt,
    WrapKey,
    UnwrapKey,
    Sign,
    Verify,
    Other(String),
}

impl KeyPermission {
    const KNOWN: [KeyPermission; 17] = [
        KeyPermission::All,
        KeyPermission::Get,
        KeyPermission::List,
        KeyPermission::Create,
        KeyPermission::Update,
        KeyPermission::Import,
        KeyPermission::Delete,
        KeyPermission::Backup,
        KeyPermission::Restore,
        KeyPermission::Recover,
        KeyPermission::Purge,
        KeyPermission::Encrypt,
        KeyPermission::Decrypt,
        KeyPermission::WrapKey,
        KeyPermission::UnwrapKey,
        KeyPermission::Sign,
        KeyPermission::Verify,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            KeyPermission::All => "all",
            KeyPermission::Get => "get",
            KeyPermission::List => "list",
            KeyPermission::Create => "create",
            KeyPermission::Update => "update",
            KeyPermission::Import => "import",
            KeyPermission::Delete => "delete",
            KeyPermission::Backup => "backup",
            KeyPermission::Restore => "restore",
            KeyPermission::Recover => "recover",
            KeyPermission::Purge => "purge",
            KeyPermission::Encrypt => "encrypt",
            KeyPermission::Decrypt => "decrypt",
            KeyPermission::WrapKey => "wrapKey",
            KeyPermission::UnwrapKey => "unwrapKey",
            KeyPermission::Sign => "sign",
            KeyPermission::Verify => "verify",
            KeyPermission::Other(name) => name,
        }
    }
}

impl From<String> for KeyPermission {
    fn from(name: String) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|known| known.as_str().eq_ignore_ascii_case(&name))
            .unwrap_or(KeyPermission::Other(name))
    }
}

impl From<KeyPermission> for String {
    fn from(permission: KeyPermission) -> Self {
        match permission {
            KeyPermission::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for KeyPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission on secrets; same matching rules as [`KeyPermission`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SecretPermission {
    All,
    Get,
    List,
    Set,
    Delete,
    Backup,
    Restore,
    Recover,
    Purge,
    Other(String),
}

impl SecretPermission {
    const KNOWN: [SecretPermission; 9] = [
        SecretPermission::All,
        SecretPermission::Get,
        SecretPermission::List,
        SecretPermission::Set,
        SecretPermission::Delete,
        SecretPermission::Backup,
        SecretPermission::Restore,
        SecretPermission::Recover,
        SecretPermission::Purge,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            SecretPermission::All => "all",
            SecretPermission::Get => "get",
            SecretPermission::List => "list",
            SecretPermission::Set => "set",
            SecretPermission::Delete => "delete",
            SecretPermission::Backup => "backup",
            SecretPermission::Restore => "restore",
            SecretPermission::Recover => "recover",
            SecretPermission::Purge => "purge",
            SecretPermission::Other(name) => name,
        }
    }
}

impl From<String> for SecretPermission {
    fn from(name: String) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|known| known.as_str().eq_ignore_ascii_case(&name))
            .unwrap_or(SecretPermission::Other(name))
    }
}

impl From<SecretPermission> for String {
    fn from(permission: SecretPermission) -> Self {
        match permission {
            SecretPermission::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for SecretPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(default)]
    pub keys: Vec<KeyPermission>,
    #[serde(default)]
    pub secrets: Vec<SecretPermission>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessPolicyEntry {
    pub tenant_id: String,
    pub object_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
    pub permissions: Permissions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultProperties {
    pub tenant_id: String,
    pub sku: Sku,
    #[serde(default)]
    pub access_policies: Vec<AccessPolicyEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled_for_deployment: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled_for_disk_encryption: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled_for_template_deployment: Option<bool>,
}

impl VaultProperties {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            sku: Sku::default(),
            access_policies: Vec::new(),
            vault_uri: None,
            enabled_for_deployment: None,
            enabled_for_disk_encryption: None,
            enabled_for_template_deployment: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vault {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    pub location: String,
    pub tags: Option<Tags>,
    pub properties: VaultProperties,
}

/// Request body for a vault upsert. Always the whole object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultCreateOrUpdateParameters {
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
    pub properties: VaultProperties,
}

impl From<&Vault> for VaultCreateOrUpdateParameters {
    fn from(vault: &Vault) -> Self {
        Self {
            location: vault.location.clone(),
            tags: vault.tags.clone(),
            properties: vault.properties.clone(),
        }
    }
}

impl Vault {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("-")
    }
}

/// One page of an ARM list response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    pub next_link: Option<String>,
}
