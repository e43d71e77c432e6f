use crate::auth::credentials::Credentials;
use crate::utils::config::Settings;
use crate::utils::errors::{KeyVaultCliError, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::fmt;

const DEFAULT_LIFETIME_SECS: i64 = 3600;

/// Bearer token for the management endpoint.
///
/// Held for one run and shared read-only by every client. Never refreshed.
#[derive(Clone)]
pub struct SessionToken {
    access_token: String,
    token_type: String,
    expires_at: DateTime<Utc>,
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionToken")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

impl SessionToken {
    pub fn new(access_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "Bearer".to_string(),
            expires_at,
        }
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Value for the Authorization header
    pub fn authorization(&self) -> Result<String> {
        if self.is_expired() {
            return Err(KeyVaultCliError::AuthenticationFailed(format!(
                "session token expired at {}; acquire a new one",
                self.expires_at.format("%Y-%m-%d %H:%M:%S UTC")
            )));
        }
        Ok(format!("Bearer {}", self.access_token))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Seconds {
    Number(i64),
    Text(String),
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    token_type: Option<String>,
    expires_in: Option<Seconds>,
}

#[derive(Deserialize)]
struct AuthorityError {
    error: Option<String>,
    error_description: Option<String>,
}

/// Resolve the token endpoint of the identity authority for a tenant
pub fn authority_endpoint(authority_host: &str, tenant: &str) -> Result<Url> {
    let mut url = Url::parse(authority_host).map_err(|e| {
        KeyVaultCliError::AuthenticationFailed(format!(
            "invalid authority host '{authority_host}': {e}"
        ))
    })?;

    url.path_segments_mut()
        .map_err(|_| {
            KeyVaultCliError::AuthenticationFailed(format!(
                "authority host '{authority_host}' cannot carry a tenant path"
            ))
        })?
        .pop_if_empty()
        .extend([tenant, "oauth2", "token"]);
    url.set_query(Some("api-version=1.0"));

    Ok(url)
}

/// Absolute expiry for a lifetime reported by the authority
fn expiry_after(lifetime: i64) -> Result<DateTime<Utc>> {
    if lifetime < 0 {
        return Err(KeyVaultCliError::AuthenticationFailed(format!(
            "invalid expires_in: {lifetime}"
        )));
    }
    Duration::try_seconds(lifetime)
        .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
        .ok_or_else(|| {
            KeyVaultCliError::AuthenticationFailed(format!("invalid expires_in: {lifetime}"))
        })
}

/// Exchanges service principal credentials for a management token
pub struct TokenProvider {
    client: Client,
    authority_host: String,
    resource: String,
}

impl TokenProvider {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = crate::arm::create_http_client(settings)?;

        Ok(Self {
            client,
            authority_host: settings.authority_host.clone(),
            resource: settings.resource_manager_endpoint.clone(),
        })
    }

    /// Client-credentials grant against the tenant's authority
    pub async fn acquire(&self, credentials: &Credentials) -> Result<SessionToken> {
        let url = authority_endpoint(&self.authority_host, credentials.tenant_id())?;
        tracing::debug!("Requesting token from {url}");

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", credentials.client_id()),
            ("client_secret", credentials.client_secret()),
            ("resource", self.resource.as_str()),
        ];

        let response = self
            .client
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                KeyVaultCliError::AuthenticationFailed(format!("token request failed: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            KeyVaultCliError::AuthenticationFailed(format!("failed to read token response: {e}"))
        })?;

        if !status.is_success() {
            let detail = serde_json::from_str::<AuthorityError>(&body)
                .ok()
                .and_then(|err| match (err.error, err.error_description) {
                    (Some(code), Some(description)) => Some(format!("{code}: {description}")),
                    (Some(code), None) => Some(code),
                    (None, description) => description,
                })
                .unwrap_or(body);
            return Err(KeyVaultCliError::AuthenticationFailed(format!(
                "{status} - {detail}"
            )));
        }

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            KeyVaultCliError::AuthenticationFailed(format!("invalid token response: {e}"))
        })?;

        let access_token = parsed
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                KeyVaultCliError::AuthenticationFailed(
                    "token response did not contain an access token".to_string(),
                )
            })?;

        let lifetime = match parsed.expires_in {
            Some(Seconds::Number(secs)) => secs,
            Some(Seconds::Text(text)) => text.trim().parse().map_err(|_| {
                KeyVaultCliError::AuthenticationFailed(format!("invalid expires_in: '{text}'"))
            })?,
            None => DEFAULT_LIFETIME_SECS,
        };

        let token = SessionToken {
            access_token,
            token_type: parsed.token_type.unwrap_or_else(|| "Bearer".to_string()),
            expires_at: expiry_after(lifetime)?,
        };

        tracing::info!("Acquired management token (expires in {lifetime}s)");
        Ok(token)
    }
}
