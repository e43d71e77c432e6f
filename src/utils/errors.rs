use std::fmt;
use thiserror::Error;

/// Kind of managed resource a remote call was aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    ResourceGroup,
    Vault,
    Resource,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::ResourceGroup => "resource group",
            ResourceKind::Vault => "key vault",
            ResourceKind::Resource => "resource",
        };
        f.write_str(name)
    }
}

/// Remote verb exposed by the management clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateOrUpdate,
    Get,
    ListByGroup,
    ListBySubscription,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::CreateOrUpdate => "create-or-update",
            Operation::Get => "get",
            Operation::ListByGroup => "list-by-group",
            Operation::ListBySubscription => "list-by-subscription",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum KeyVaultCliError {
    #[error("Missing environment variables: {}", .0.join(", "))]
    MissingCredentials(Vec<String>),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("{kind} {operation} failed: {cause}")]
    RemoteOperationFailed {
        kind: ResourceKind,
        operation: Operation,
        cause: String,
    },

    #[error("Malformed identifier for {field}: '{value}'")]
    MalformedIdentifier { field: &'static str, value: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl KeyVaultCliError {
    pub fn remote(kind: ResourceKind, operation: Operation, cause: impl Into<String>) -> Self {
        KeyVaultCliError::RemoteOperationFailed {
            kind,
            operation,
            cause: cause.into(),
        }
    }

    /// True for a remote failure that the service reported as 404
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            KeyVaultCliError::RemoteOperationFailed { cause, .. } if cause.starts_with("404")
        )
    }
}

pub type Result<T> = std::result::Result<T, KeyVaultCliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_lists_every_key() {
        let err = KeyVaultCliError::MissingCredentials(vec![
            "AZURE_TENANT_ID".to_string(),
            "AZURE_CLIENT_SECRET".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "Missing environment variables: AZURE_TENANT_ID, AZURE_CLIENT_SECRET"
        );
    }

    #[test]
    fn test_remote_failure_names_step() {
        let err = KeyVaultCliError::remote(
            ResourceKind::Vault,
            Operation::Delete,
            "409 Conflict: vault is locked",
        );
        assert_eq!(
            err.to_string(),
            "key vault delete failed: 409 Conflict: vault is locked"
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found_detection() {
        let err = KeyVaultCliError::remote(
            ResourceKind::ResourceGroup,
            Operation::Get,
            "404 Not Found: ResourceGroupNotFound",
        );
        assert!(err.is_not_found());
    }
}
