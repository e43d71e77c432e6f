//! In-process stand-in for the management API.
//!
//! Honours the same contracts as the REST clients: upserts keyed by
//! group and name (case-insensitive), 404 answers for missing parents,
//! cascade deletion of a group's vaults, and simple `eq` filters.

use super::models::{GenericResource, ResourceGroup, ResourceGroupProperties, Tags, Vault};
use super::models::{VaultCreateOrUpdateParameters, VAULT_RESOURCE_TYPE};
use super::{ManagementClients, ResourceGroupOperations, VaultOperations};
use crate::utils::errors::{KeyVaultCliError, Operation, ResourceKind, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const GROUP_RESOURCE_TYPE: &str = "Microsoft.Resources/resourceGroups";

#[derive(Default)]
struct State {
    groups: BTreeMap<String, ResourceGroup>,
    vaults: BTreeMap<(String, String), Vault>,
}

/// Shared in-memory subscription
#[derive(Clone)]
pub struct InMemoryArm {
    subscription_id: String,
    state: Arc<Mutex<State>>,
}

impl InMemoryArm {
    pub fn new(subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Clients over this subscription; all of them see the same state
    pub fn clients(&self) -> ManagementClients {
        ManagementClients {
            groups: Box::new(InMemoryGroups {
                backend: self.clone(),
            }),
            vaults: Box::new(InMemoryVaults {
                backend: self.clone(),
            }),
        }
    }

    pub fn group_count(&self) -> usize {
        self.state().groups.len()
    }

    pub fn vault_count(&self) -> usize {
        self.state().vaults.len()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn group_id(&self, name: &str) -> String {
        format!("/subscriptions/{}/resourceGroups/{name}", self.subscription_id)
    }

    fn vault_id(&self, group: &str, name: &str) -> String {
        format!(
            "{}/providers/{VAULT_RESOURCE_TYPE}/{name}",
            self.group_id(group)
        )
    }
}

fn key(name: &str) -> String {
    name.to_ascii_lowercase()
}

fn group_not_found(kind: ResourceKind, operation: Operation, group: &str) -> KeyVaultCliError {
    KeyVaultCliError::remote(
        kind,
        operation,
        format!(
            "404 Not Found: ResourceGroupNotFound: Resource group '{group}' could not be found."
        ),
    )
}

fn as_generic(vault: &Vault) -> GenericResource {
    GenericResource {
        id: vault.id.clone(),
        name: vault.name.clone(),
        resource_type: vault.resource_type.clone(),
        location: Some(vault.location.clone()),
        tags: vault.tags.clone(),
    }
}

/// `<field> eq '<value>'` over resourceType, name, location or tagName
#[derive(Debug, PartialEq)]
struct EqFilter {
    field: String,
    value: String,
}

impl EqFilter {
    fn parse(filter: &str) -> Result<Self> {
        let invalid = || {
            KeyVaultCliError::InvalidInput(format!(
                "Unsupported filter \"{filter}\"; expected <field> eq '<value>'"
            ))
        };

        let (field, rest) = filter.trim().split_once(' ').ok_or_else(invalid)?;
        let value = rest
            .trim_start()
            .strip_prefix("eq ")
            .map(str::trim)
            .and_then(|v| v.strip_prefix('\''))
            .and_then(|v| v.strip_suffix('\''))
            .ok_or_else(invalid)?;

        match field {
            "resourceType" | "name" | "location" | "tagName" => Ok(Self {
                field: field.to_string(),
                value: value.to_string(),
            }),
            _ => Err(invalid()),
        }
    }

    fn matches(
        &self,
        resource_type: &str,
        name: Option<&str>,
        location: &str,
        tags: Option<&Tags>,
    ) -> bool {
        match self.field.as_str() {
            "resourceType" => resource_type.eq_ignore_ascii_case(&self.value),
            "name" => name.is_some_and(|n| n.eq_ignore_ascii_case(&self.value)),
            "location" => location.eq_ignore_ascii_case(&self.value),
            "tagName" => tags.is_some_and(|t| t.contains_key(&self.value)),
            _ => false,
        }
    }
}

struct InMemoryGroups {
    backend: InMemoryArm,
}

#[async_trait]
impl ResourceGroupOperations for InMemoryGroups {
    async fn create_or_update(&self, name: &str, group: &ResourceGroup) -> Result<ResourceGroup> {
        let mut state = self.backend.state();

        if let Some(existing) = state.groups.get(&key(name)) {
            if !existing.location.eq_ignore_ascii_case(&group.location) {
                return Err(KeyVaultCliError::remote(
                    ResourceKind::ResourceGroup,
                    Operation::CreateOrUpdate,
                    format!(
                        "409 Conflict: InvalidResourceGroupLocation: Resource group '{name}' already exists in location '{}'.",
                        existing.location
                    ),
                ));
            }
        }

        let stored = ResourceGroup {
            id: Some(self.backend.group_id(name)),
            name: Some(name.to_string()),
            location: group.location.clone(),
            tags: group.tags.clone(),
            properties: Some(ResourceGroupProperties {
                provisioning_state: Some("Succeeded".to_string()),
            }),
        };
        state.groups.insert(key(name), stored.clone());
        Ok(stored)
    }

    async fn get(&self, name: &str) -> Result<ResourceGroup> {
        self.backend
            .state()
            .groups
            .get(&key(name))
            .cloned()
            .ok_or_else(|| group_not_found(ResourceKind::ResourceGroup, Operation::Get, name))
    }

    async fn list_resources(&self, name: &str) -> Result<Vec<GenericResource>> {
        let state = self.backend.state();
        if !state.groups.contains_key(&key(name)) {
            return Err(group_not_found(
                ResourceKind::ResourceGroup,
                Operation::ListByGroup,
                name,
            ));
        }

        Ok(state
            .vaults
            .iter()
            .filter(|((group, _), _)| *group == key(name))
            .map(|(_, vault)| as_generic(vault))
            .collect())
    }

    async fn list(&self, filter: Option<&str>) -> Result<Vec<ResourceGroup>> {
        let filter = filter.map(EqFilter::parse).transpose()?;
        let state = self.backend.state();

        Ok(state
            .groups
            .values()
            .filter(|g| {
                filter.as_ref().map_or(true, |f| {
                    f.matches(
                        GROUP_RESOURCE_TYPE,
                        g.name.as_deref(),
                        &g.location,
                        g.tags.as_ref(),
                    )
                })
            })
            .cloned()
            .collect())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let mut state = self.backend.state();
        let group_key = key(name);

        if state.groups.remove(&group_key).is_none() {
            return Err(group_not_found(
                ResourceKind::ResourceGroup,
                Operation::Delete,
                name,
            ));
        }
        state.vaults.retain(|(group, _), _| *group != group_key);
        Ok(())
    }
}

struct InMemoryVaults {
    backend: InMemoryArm,
}

#[async_trait]
impl VaultOperations for InMemoryVaults {
    async fn create_or_update(
        &self,
        group: &str,
        name: &str,
        params: &VaultCreateOrUpdateParameters,
    ) -> Result<Vault> {
        let mut state = self.backend.state();
        if !state.groups.contains_key(&key(group)) {
            return Err(group_not_found(
                ResourceKind::Vault,
                Operation::CreateOrUpdate,
                group,
            ));
        }

        let mut properties = params.properties.clone();
        properties.vault_uri = Some(format!("https://{}.vault.azure.net/", key(name)));

        let vault = Vault {
            id: Some(self.backend.vault_id(group, name)),
            name: Some(name.to_string()),
            resource_type: Some(VAULT_RESOURCE_TYPE.to_string()),
            location: params.location.clone(),
            tags: params.tags.clone(),
            properties,
        };
        state.vaults.insert((key(group), key(name)), vault.clone());
        Ok(vault)
    }

    async fn get(&self, group: &str, name: &str) -> Result<Vault> {
        let state = self.backend.state();
        if !state.groups.contains_key(&key(group)) {
            return Err(group_not_found(ResourceKind::Vault, Operation::Get, group));
        }

        state
            .vaults
            .get(&(key(group), key(name)))
            .cloned()
            .ok_or_else(|| {
                KeyVaultCliError::remote(
                    ResourceKind::Vault,
                    Operation::Get,
                    format!(
                        "404 Not Found: ResourceNotFound: The Resource '{VAULT_RESOURCE_TYPE}/{name}' under resource group '{group}' was not found."
                    ),
                )
            })
    }

    async fn list_by_resource_group(&self, group: &str, top: Option<u32>) -> Result<Vec<Vault>> {
        let state = self.backend.state();
        if !state.groups.contains_key(&key(group)) {
            return Err(group_not_found(
                ResourceKind::Vault,
                Operation::ListByGroup,
                group,
            ));
        }

        Ok(state
            .vaults
            .iter()
            .filter(|((g, _), _)| *g == key(group))
            .map(|(_, vault)| vault.clone())
            .take(top.map_or(usize::MAX, |t| t as usize))
            .collect())
    }

    async fn list_by_subscription(
        &self,
        filter: &str,
        top: Option<u32>,
    ) -> Result<Vec<GenericResource>> {
        let filter = EqFilter::parse(filter)?;
        let state = self.backend.state();

        Ok(state
            .vaults
            .values()
            .filter(|v| {
                filter.matches(
                    VAULT_RESOURCE_TYPE,
                    v.name.as_deref(),
                    &v.location,
                    v.tags.as_ref(),
                )
            })
            .map(as_generic)
            .take(top.map_or(usize::MAX, |t| t as usize))
            .collect())
    }

    async fn delete(&self, group: &str, name: &str) -> Result<()> {
        let mut state = self.backend.state();
        if !state.groups.contains_key(&key(group)) {
            return Err(group_not_found(ResourceKind::Vault, Operation::Delete, group));
        }
        // Deleting an absent vault succeeds, as the service answers 204
        state.vaults.remove(&(key(group), key(name)));
        Ok(())
    }
}
