use super::client::ArmClient;
use super::models::{GenericResource, ResourceGroup};
use super::ResourceGroupOperations;
use crate::utils::errors::{Operation, ResourceKind, Result};
use async_trait::async_trait;
use reqwest::Method;

pub const RESOURCES_API_VERSION: &str = "2016-09-01";

const KIND: ResourceKind = ResourceKind::ResourceGroup;

/// Resource group client backed by the management REST API
pub struct ResourceGroupsClient {
    arm: ArmClient,
}

impl ResourceGroupsClient {
    pub fn new(arm: ArmClient) -> Self {
        Self { arm }
    }
}

#[async_trait]
impl ResourceGroupOperations for ResourceGroupsClient {
    async fn create_or_update(&self, name: &str, group: &ResourceGroup) -> Result<ResourceGroup> {
        let url = self
            .arm
            .subscription_url(&["resourcegroups", name], RESOURCES_API_VERSION);
        self.arm
            .send_json(KIND, Operation::CreateOrUpdate, Method::PUT, url, Some(group))
            .await
    }

    async fn get(&self, name: &str) -> Result<ResourceGroup> {
        let url = self
            .arm
            .subscription_url(&["resourcegroups", name], RESOURCES_API_VERSION);
        self.arm
            .send_json::<(), _>(KIND, Operation::Get, Method::GET, url, None)
            .await
    }

    async fn list_resources(&self, name: &str) -> Result<Vec<GenericResource>> {
        let url = self.arm.subscription_url(
            &["resourceGroups", name, "resources"],
            RESOURCES_API_VERSION,
        );
        self.arm
            .list_all(KIND, Operation::ListByGroup, url, None)
            .await
    }

    async fn list(&self, filter: Option<&str>) -> Result<Vec<ResourceGroup>> {
        let mut url = self
            .arm
            .subscription_url(&["resourcegroups"], RESOURCES_API_VERSION);
        if let Some(filter) = filter {
            url.query_pairs_mut().append_pair("$filter", filter);
        }
        self.arm
            .list_all(KIND, Operation::ListBySubscription, url, None)
            .await
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let url = self
            .arm
            .subscription_url(&["resourcegroups", name], RESOURCES_API_VERSION);
        self.arm.delete(KIND, url).await
    }
}
