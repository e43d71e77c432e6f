use super::client::ArmClient;
use super::models::{GenericResource, Vault, VaultCreateOrUpdateParameters};
use super::VaultOperations;
use crate::utils::errors::{Operation, ResourceKind, Result};
use async_trait::async_trait;
use reqwest::{Method, Url};

pub const KEYVAULT_API_VERSION: &str = "2015-06-01";
/// The generic resources listing only accepts this older version for vault filters
pub const SUBSCRIPTION_LIST_API_VERSION: &str = "2015-11-01";

const KIND: ResourceKind = ResourceKind::Vault;

/// Key Vault management client backed by the REST API
pub struct VaultsClient {
    arm: ArmClient,
}

impl VaultsClient {
    pub fn new(arm: ArmClient) -> Self {
        Self { arm }
    }

    fn vault_url(&self, group: &str, name: &str) -> Url {
        self.arm.subscription_url(
            &[
                "resourceGroups",
                group,
                "providers",
                "Microsoft.KeyVault",
                "vaults",
                name,
            ],
            KEYVAULT_API_VERSION,
        )
    }
}

fn with_top(mut url: Url, top: Option<u32>) -> Url {
    if let Some(top) = top {
        url.query_pairs_mut().append_pair("$top", &top.to_string());
    }
    url
}

#[async_trait]
impl VaultOperations for VaultsClient {
    async fn create_or_update(
        &self,
        group: &str,
        name: &str,
        params: &VaultCreateOrUpdateParameters,
    ) -> Result<Vault> {
        let url = self.vault_url(group, name);
        self.arm
            .send_json(KIND, Operation::CreateOrUpdate, Method::PUT, url, Some(params))
            .await
    }

    async fn get(&self, group: &str, name: &str) -> Result<Vault> {
        let url = self.vault_url(group, name);
        self.arm
            .send_json::<(), _>(KIND, Operation::Get, Method::GET, url, None)
            .await
    }

    async fn list_by_resource_group(&self, group: &str, top: Option<u32>) -> Result<Vec<Vault>> {
        let url = self.arm.subscription_url(
            &[
                "resourceGroups",
                group,
                "providers",
                "Microsoft.KeyVault",
                "vaults",
            ],
            KEYVAULT_API_VERSION,
        );
        self.arm
            .list_all(KIND, Operation::ListByGroup, with_top(url, top), top)
            .await
    }

    async fn list_by_subscription(
        &self,
        filter: &str,
        top: Option<u32>,
    ) -> Result<Vec<GenericResource>> {
        let mut url = self
            .arm
            .subscription_url(&["resources"], SUBSCRIPTION_LIST_API_VERSION);
        url.query_pairs_mut().append_pair("$filter", filter);
        self.arm
            .list_all(KIND, Operation::ListBySubscription, with_top(url, top), top)
            .await
    }

    async fn delete(&self, group: &str, name: &str) -> Result<()> {
        let url = self.vault_url(group, name);
        self.arm.delete(KIND, url).await
    }
}
