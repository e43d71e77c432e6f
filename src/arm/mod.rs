//! Typed clients for the Azure Resource Manager API.
//!
//! Each resource kind gets its own trait so the lifecycle code can run
//! against the REST clients or against [`memory::InMemoryArm`].

pub mod client;
pub mod groups;
pub mod memory;
pub mod models;
pub mod vaults;

use crate::auth::{Credentials, SessionToken};
use crate::utils::config::Settings;
use crate::utils::errors::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;

use client::ArmClient;
use groups::ResourceGroupsClient;
use models::{GenericResource, ResourceGroup, Vault, VaultCreateOrUpdateParameters};
use vaults::VaultsClient;

/// Create the HTTP client shared by the token provider and the ARM clients
pub fn create_http_client(settings: &Settings) -> Result<Client> {
    let mut builder = Client::builder()
        .use_rustls_tls()
        .user_agent(settings.user_agent());

    if let Some(timeout) = settings.request_timeout() {
        builder = builder.timeout(timeout);
    }

    Ok(builder.build()?)
}

#[async_trait]
pub trait ResourceGroupOperations: Send + Sync {
    /// Idempotent upsert keyed by name
    async fn create_or_update(&self, name: &str, group: &ResourceGroup) -> Result<ResourceGroup>;

    async fn get(&self, name: &str) -> Result<ResourceGroup>;

    /// Every resource inside the group
    async fn list_resources(&self, name: &str) -> Result<Vec<GenericResource>>;

    /// Groups in the subscription, optionally OData-filtered
    async fn list(&self, filter: Option<&str>) -> Result<Vec<ResourceGroup>>;

    /// Delete the group and everything in it; waits for completion
    async fn delete(&self, name: &str) -> Result<()>;
}

#[async_trait]
pub trait VaultOperations: Send + Sync {
    /// Idempotent upsert keyed by group and name. Replaces the whole object.
    async fn create_or_update(
        &self,
        group: &str,
        name: &str,
        params: &VaultCreateOrUpdateParameters,
    ) -> Result<Vault>;

    async fn get(&self, group: &str, name: &str) -> Result<Vault>;

    async fn list_by_resource_group(&self, group: &str, top: Option<u32>) -> Result<Vec<Vault>>;

    async fn list_by_subscription(
        &self,
        filter: &str,
        top: Option<u32>,
    ) -> Result<Vec<GenericResource>>;

    async fn delete(&self, group: &str, name: &str) -> Result<()>;
}

/// One client per resource kind, built once per run
pub struct ManagementClients {
    pub groups: Box<dyn ResourceGroupOperations>,
    pub vaults: Box<dyn VaultOperations>,
}

impl ManagementClients {
    /// REST clients sharing one HTTP client and one read-only token
    pub fn connect(
        settings: &Settings,
        credentials: &Credentials,
        token: SessionToken,
    ) -> Result<Self> {
        let http = create_http_client(settings)?;
        let arm = ArmClient::new(http, settings, credentials.subscription_id(), Arc::new(token))?;
        tracing::debug!(
            "Management clients ready for subscription {}",
            arm.subscription_id()
        );

        Ok(Self {
            groups: Box::new(ResourceGroupsClient::new(arm.clone())),
            vaults: Box::new(VaultsClient::new(arm)),
        })
    }
}
