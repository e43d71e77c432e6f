use crate::auth::SessionToken;
use crate::utils::config::Settings;
use crate::utils::errors::{KeyVaultCliError, Operation, ResourceKind, Result};
use reqwest::header::{AUTHORIZATION, LOCATION, RETRY_AFTER};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::models::Page;

#[derive(Deserialize)]
struct ArmErrorResponse {
    error: ArmErrorBody,
}

#[derive(Deserialize)]
struct ArmErrorBody {
    code: Option<String>,
    message: Option<String>,
}

/// Authenticated transport shared by the per-kind management clients
#[derive(Clone)]
pub struct ArmClient {
    client: Client,
    endpoint: Url,
    subscription_id: String,
    token: Arc<SessionToken>,
    poll_interval: Duration,
}

impl ArmClient {
    pub fn new(
        client: Client,
        settings: &Settings,
        subscription_id: &str,
        token: Arc<SessionToken>,
    ) -> Result<Self> {
        let endpoint = Url::parse(&settings.resource_manager_endpoint).map_err(|e| {
            KeyVaultCliError::Config(format!(
                "Invalid resource manager endpoint '{}': {e}",
                settings.resource_manager_endpoint
            ))
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(KeyVaultCliError::Config(format!(
                "Resource manager endpoint '{endpoint}' cannot be used as a base URL"
            )));
        }

        Ok(Self {
            client,
            endpoint,
            subscription_id: subscription_id.to_string(),
            token,
            poll_interval: settings.poll_interval(),
        })
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// Build `{endpoint}/subscriptions/{id}/{segments...}?api-version=...`.
    ///
    /// Segments are percent-encoded individually.
    pub fn subscription_url(&self, segments: &[&str], api_version: &str) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(["subscriptions", self.subscription_id.as_str()])
                .extend(segments);
        }
        url.query_pairs_mut()
            .append_pair("api-version", api_version);
        url
    }

    fn request(&self, method: Method, url: Url) -> Result<RequestBuilder> {
        let authorization = self.token.authorization()?;
        Ok(self
            .client
            .request(method, url)
            .header(AUTHORIZATION, authorization))
    }

    /// Send one request; any non-2xx answer becomes `RemoteOperationFailed`
    pub async fn send<B>(
        &self,
        kind: ResourceKind,
        operation: Operation,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        tracing::debug!("{kind} {operation}: {method} {}", url.path());

        let mut request = self.request(method, url)?;
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| KeyVaultCliError::remote(kind, operation, e.to_string()))?;

        tracing::debug!("Response status: {}", response.status());

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::failure(kind, operation, response).await)
        }
    }

    /// Send and decode the JSON body of the answer
    pub async fn send_json<B, T>(
        &self,
        kind: ResourceKind,
        operation: Operation,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(kind, operation, method, url, body).await?;
        let text = response
            .text()
            .await
            .map_err(|e| KeyVaultCliError::remote(kind, operation, e.to_string()))?;

        serde_json::from_str(&text).map_err(|e| {
            KeyVaultCliError::remote(kind, operation, format!("unexpected response body: {e}"))
        })
    }

    /// Collect every page of a list call, stopping early once `top` items are in
    pub async fn list_all<T>(
        &self,
        kind: ResourceKind,
        operation: Operation,
        url: Url,
        top: Option<u32>,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let limit = top.map(|t| t as usize);
        let mut items = Vec::new();
        let mut next = Some(url);

        while let Some(url) = next.take() {
            let page: Page<T> = self
                .send_json::<(), _>(kind, operation, Method::GET, url, None)
                .await?;
            items.extend(page.value);

            if limit.is_some_and(|limit| items.len() >= limit) {
                break;
            }

            next = match page.next_link.filter(|link| !link.is_empty()) {
                Some(link) => Some(Url::parse(&link).map_err(|e| {
                    KeyVaultCliError::remote(kind, operation, format!("invalid nextLink: {e}"))
                })?),
                None => None,
            };
        }

        if let Some(limit) = limit {
            items.truncate(limit);
        }
        Ok(items)
    }

    /// Delete and wait for the service to finish when it answers 202
    pub async fn delete(&self, kind: ResourceKind, url: Url) -> Result<()> {
        let operation = Operation::Delete;
        let mut response = self
            .send::<()>(kind, operation, Method::DELETE, url, None)
            .await?;

        while response.status() == StatusCode::ACCEPTED {
            let Some(location) = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
            else {
                tracing::debug!("{kind} delete accepted without a status location");
                return Ok(());
            };

            let delay = retry_after(&response).unwrap_or(self.poll_interval);
            tracing::info!("Waiting {}s for {kind} deletion to finish", delay.as_secs());
            tokio::time::sleep(delay).await;

            let url = Url::parse(&location).map_err(|e| {
                KeyVaultCliError::remote(kind, operation, format!("invalid status location: {e}"))
            })?;
            response = self
                .send::<()>(kind, operation, Method::GET, url, None)
                .await?;
        }

        Ok(())
    }

    async fn failure(
        kind: ResourceKind,
        operation: Operation,
        response: Response,
    ) -> KeyVaultCliError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        let detail = serde_json::from_str::<ArmErrorResponse>(&body)
            .ok()
            .map(|e| match (e.error.code, e.error.message) {
                (Some(code), Some(message)) => format!("{code}: {message}"),
                (Some(code), None) => code,
                (None, message) => message.unwrap_or_default(),
            })
            .unwrap_or(body);

        if detail.trim().is_empty() {
            KeyVaultCliError::remote(kind, operation, status.to_string())
        } else {
            KeyVaultCliError::remote(kind, operation, format!("{status}: {detail}"))
        }
    }
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
