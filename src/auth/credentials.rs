use crate::utils::errors::{KeyVaultCliError, Result};
use std::env;
use std::fmt;
use uuid::Uuid;

pub const TENANT_ID_VAR: &str = "AZURE_TENANT_ID";
pub const CLIENT_ID_VAR: &str = "AZURE_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "AZURE_CLIENT_SECRET";
pub const SUBSCRIPTION_ID_VAR: &str = "AZURE_SUBSCRIPTION_ID";

/// Required variables, in the order they are reported when missing
pub const REQUIRED_VARS: [&str; 4] = [
    TENANT_ID_VAR,
    CLIENT_ID_VAR,
    CLIENT_SECRET_VAR,
    SUBSCRIPTION_ID_VAR,
];

/// Service principal identity loaded once at startup
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    tenant_id: String,
    client_id: String,
    client_secret: String,
    subscription_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("subscription_id", &self.subscription_id)
            .finish()
    }
}

impl Credentials {
    /// Read credentials from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read credentials through an arbitrary lookup.
    ///
    /// Every missing or blank variable is collected before failing, so the
    /// error names all of them at once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut values = Vec::with_capacity(REQUIRED_VARS.len());
        let mut missing = Vec::new();

        for key in REQUIRED_VARS {
            match lookup(key) {
                // The secret is sent as given; identifiers are trimmed
                Some(value) if key == CLIENT_SECRET_VAR && !value.trim().is_empty() => {
                    values.push(value)
                }
                Some(value) if !value.trim().is_empty() => values.push(value.trim().to_string()),
                _ => {
                    missing.push(key.to_string());
                    values.push(String::new());
                }
            }
        }

        if !missing.is_empty() {
            return Err(KeyVaultCliError::MissingCredentials(missing));
        }

        let mut values = values.into_iter();
        let tenant_id = normalize_identifier(TENANT_ID_VAR, &values.next().unwrap_or_default())?;
        let client_id = normalize_identifier(CLIENT_ID_VAR, &values.next().unwrap_or_default())?;
        let client_secret = values.next().unwrap_or_default();
        let subscription_id =
            normalize_identifier(SUBSCRIPTION_ID_VAR, &values.next().unwrap_or_default())?;

        tracing::debug!("Loaded credentials for tenant {tenant_id}, client {client_id}");

        Ok(Self {
            tenant_id,
            client_id,
            client_secret,
            subscription_id,
        })
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }
}

/// Accept a GUID (normalised to lowercase hyphenated form) or a DNS-style
/// name such as a tenant domain.
pub fn normalize_identifier(field: &'static str, value: &str) -> Result<String> {
    if let Ok(guid) = Uuid::parse_str(value) {
        return Ok(guid.hyphenated().to_string());
    }

    let mut chars = value.chars();
    let well_formed = match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        }
        _ => false,
    };

    if well_formed {
        Ok(value.to_string())
    } else {
        Err(KeyVaultCliError::MalformedIdentifier {
            field,
            value: value.to_string(),
        })
    }
}
