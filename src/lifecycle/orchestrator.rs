use super::cleanup::ScopedGroup;
use super::plan::{LifecyclePlan, TeardownMode, VaultSpec};
use super::update::{merge_update, VaultUpdate};
use super::LifecycleStage;
use crate::arm::memory::InMemoryArm;
use crate::arm::models::{
    AccessPolicyEntry, GenericResource, ResourceGroup, Vault, VaultCreateOrUpdateParameters,
    VaultProperties, VAULT_RESOURCE_TYPE,
};
use crate::arm::ManagementClients;
use crate::auth::credentials::normalize_identifier;
use crate::auth::{Credentials, TokenProvider};
use crate::utils::config::Settings;
use crate::utils::errors::{KeyVaultCliError, ResourceKind, Result};
use crate::utils::output::render_vault;
use std::io::{self, Write};

/// Principal written into vault properties and access policies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultIdentity {
    pub tenant_id: String,
    pub object_id: String,
}

/// Clients and identity for one run, built once and passed down
pub struct LifecycleContext {
    pub clients: ManagementClients,
    pub identity: VaultIdentity,
}

impl LifecycleContext {
    /// Acquire one token and build the REST clients around it
    pub async fn connect(settings: &Settings, credentials: &Credentials) -> Result<Self> {
        let provider = TokenProvider::new(settings)?;
        let token = provider.acquire(credentials).await?;
        let clients = ManagementClients::connect(settings, credentials, token)?;

        Ok(Self {
            clients,
            identity: VaultIdentity::from(credentials),
        })
    }

    /// Run against an in-process subscription; nothing leaves the machine
    pub fn dry_run(credentials: &Credentials) -> Self {
        Self {
            clients: InMemoryArm::new(credentials.subscription_id()).clients(),
            identity: VaultIdentity::from(credentials),
        }
    }
}

impl From<&Credentials> for VaultIdentity {
    fn from(credentials: &Credentials) -> Self {
        Self {
            tenant_id: credentials.tenant_id().to_string(),
            object_id: credentials.client_id().to_string(),
        }
    }
}

/// Outcome of deleting one resource during teardown
#[derive(Debug, Clone, PartialEq)]
pub struct TeardownRecord {
    pub kind: ResourceKind,
    pub name: String,
    pub outcome: std::result::Result<(), String>,
}

#[derive(Debug, Default)]
pub struct LifecycleReport {
    pub stage: LifecycleStage,
    /// Final state of every vault, in creation order
    pub vaults: Vec<Vault>,
    pub subscription_vaults: Vec<GenericResource>,
    pub group_vaults: Vec<Vault>,
    pub teardown: Vec<TeardownRecord>,
}

/// OData filter selecting key vaults in the generic resource listing
pub fn vault_filter() -> String {
    format!("resourceType eq '{VAULT_RESOURCE_TYPE}'")
}

/// Runs the create, configure, list and delete sequence of a plan
pub struct Orchestrator<'a> {
    ctx: &'a LifecycleContext,
    plan: &'a LifecyclePlan,
    identity: VaultIdentity,
    report: LifecycleReport,
}

impl<'a> Orchestrator<'a> {
    pub fn new(ctx: &'a LifecycleContext, plan: &'a LifecyclePlan) -> Result<Self> {
        let mut identity = ctx.identity.clone();
        if let Some(object_id) = &plan.object_id {
            identity.object_id = normalize_identifier("object id", object_id)?;
        }

        Ok(Self {
            ctx,
            plan,
            identity,
            report: LifecycleReport::default(),
        })
    }

    pub fn stage(&self) -> LifecycleStage {
        self.report.stage
    }

    /// Teardown outcomes recorded so far, including after a failed run
    pub fn teardown(&self) -> &[TeardownRecord] {
        &self.report.teardown
    }

    fn advance(&mut self, next: LifecycleStage) {
        tracing::info!("Lifecycle stage: {} -> {next}", self.report.stage);
        self.report.stage = next;
    }

    /// Execute the whole plan.
    ///
    /// The resource group is released on every path once it exists. A
    /// failed release is reported but never replaces an earlier error.
    pub async fn run(&mut self) -> Result<LifecycleReport> {
        let ctx = self.ctx;
        let plan = self.plan;

        println!("Creating resource group '{}'", plan.group_name);
        let request = ResourceGroup {
            tags: plan.tags.clone(),
            ..ResourceGroup::new(&plan.location)
        };
        let scope = ScopedGroup::acquire(ctx.clients.groups.as_ref(), &plan.group_name, &request)
            .await?;
        self.advance(LifecycleStage::GroupCreated);

        let steps = self.run_steps().await;

        println!("Deleting resource group '{}'", scope.name());
        let release = scope.release().await;
        self.record(
            ResourceKind::ResourceGroup,
            &plan.group_name,
            release.as_ref().map(|_| ()).map_err(ToString::to_string),
        );

        match (steps, release) {
            (Ok(()), Ok(())) => {
                self.advance(LifecycleStage::TornDown);
                Ok(std::mem::take(&mut self.report))
            }
            (Ok(()), Err(release_err)) => Err(release_err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(release_err)) => {
                eprintln!(
                    "Cleanup of resource group '{}' also failed: {release_err}",
                    plan.group_name
                );
                Err(err)
            }
        }
    }

    async fn run_steps(&mut self) -> Result<()> {
        let ctx = self.ctx;
        let plan = self.plan;
        let vaults = ctx.clients.vaults.as_ref();
        let group = plan.group_name.as_str();
        let primary = &plan.primary;

        println!("Creating key vault '{}'", primary.name);
        vaults
            .create_or_update(group, &primary.name, &self.initial_parameters(primary))
            .await?;
        self.advance(LifecycleStage::VaultCreated);

        println!("Getting key vault '{}'", primary.name);
        let current = vaults.get(group, &primary.name).await?;
        println!("{}", render_vault(&current));

        println!(
            "Updating key vault '{}' to enable deployments and grant all secret permissions",
            primary.name
        );
        let request = merge_update(&current, &VaultUpdate::enable_deployment())?;
        let updated = vaults.create_or_update(group, &primary.name, &request).await?;
        println!("{}", render_vault(&updated));
        self.report.vaults.push(updated);
        self.advance(LifecycleStage::VaultConfigured);

        if let Some(secondary) = &plan.secondary {
            println!(
                "Creating another key vault '{}' in {}",
                secondary.name,
                plan.vault_location(secondary)
            );
            let created = vaults
                .create_or_update(group, &secondary.name, &self.initial_parameters(secondary))
                .await?;
            println!("{}", render_vault(&created));
            self.report.vaults.push(created);
            self.advance(LifecycleStage::SecondVaultCreated);
        }

        println!("Listing all key vaults in the subscription");
        let in_subscription = vaults.list_by_subscription(&vault_filter(), None).await?;
        for resource in &in_subscription {
            println!("\t{}", resource.name.as_deref().unwrap_or("-"));
        }

        println!("Listing all key vaults in resource group '{group}'");
        let in_group = vaults.list_by_resource_group(group, None).await?;
        for vault in &in_group {
            println!("\t{}", vault.display_name());
        }

        self.report.subscription_vaults = in_subscription;
        self.report.group_vaults = in_group;
        self.advance(LifecycleStage::Listed);

        if plan.teardown == TeardownMode::Interactive {
            wait_for_enter()?;
        }

        println!("Deleting key vaults");
        let mut first_failure = None;
        for name in plan.vault_names() {
            let outcome = vaults.delete(group, name).await;
            self.record(
                ResourceKind::Vault,
                name,
                outcome.as_ref().map(|_| ()).map_err(ToString::to_string),
            );
            if let Err(e) = outcome {
                tracing::warn!("Failed to delete key vault '{name}': {e}");
                first_failure.get_or_insert(e);
            }
        }

        match first_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn initial_parameters(&self, spec: &VaultSpec) -> VaultCreateOrUpdateParameters {
        let mut properties = VaultProperties::new(&self.identity.tenant_id);
        properties.access_policies = vec![AccessPolicyEntry {
            tenant_id: self.identity.tenant_id.clone(),
            object_id: self.identity.object_id.clone(),
            application_id: None,
            permissions: spec.permissions.clone(),
        }];

        VaultCreateOrUpdateParameters {
            location: self.plan.vault_location(spec).to_string(),
            tags: self.plan.tags.clone(),
            properties,
        }
    }

    fn record(
        &mut self,
        kind: ResourceKind,
        name: &str,
        outcome: std::result::Result<(), String>,
    ) {
        match &outcome {
            Ok(()) => println!("\tDeleted {kind} '{name}'"),
            Err(e) => println!("\tFailed to delete {kind} '{name}': {e}"),
        }
        self.report.teardown.push(TeardownRecord {
            kind,
            name: name.to_string(),
            outcome,
        });
    }
}

fn wait_for_enter() -> Result<()> {
    print!("Press enter to delete the key vaults and the resource group...");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input).map_err(|e| {
        KeyVaultCliError::InvalidInput(format!("Failed to read confirmation: {e}"))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arm::models::{KeyPermission, SecretPermission, Tags};
    use crate::arm::{ResourceGroupOperations, VaultOperations};
    use crate::auth::credentials::{
        CLIENT_ID_VAR, CLIENT_SECRET_VAR, SUBSCRIPTION_ID_VAR, TENANT_ID_VAR,
    };
    use crate::utils::errors::Operation;
    use async_trait::async_trait;

    fn credentials() -> Credentials {
        Credentials::from_lookup(|key| {
            let value = match key {
                TENANT_ID_VAR => "t1",
                CLIENT_ID_VAR => "c1",
                CLIENT_SECRET_VAR => "s1",
                SUBSCRIPTION_ID_VAR => "sub1",
                _ => return None,
            };
            Some(value.to_string())
        })
        .unwrap()
    }

    fn scenario_plan() -> LifecyclePlan {
        LifecyclePlan {
            group_name: "g1".to_string(),
            location: "westus".to_string(),
            tags: None,
            primary: VaultSpec::primary("v1"),
            secondary: Some(VaultSpec::secondary("v2", "eastus")),
            teardown: TeardownMode::Automatic,
            object_id: None,
        }
    }

    fn context_over(arm: &InMemoryArm) -> LifecycleContext {
        LifecycleContext {
            clients: arm.clients(),
            identity: VaultIdentity::from(&credentials()),
        }
    }

    /// Vault client that delegates to another one but fails one operation
    struct Faulty {
        inner: Box<dyn VaultOperations>,
        fail: Operation,
    }

    impl Faulty {
        fn check(&self, operation: Operation, name: &str) -> Result<()> {
            if operation == self.fail {
                return Err(KeyVaultCliError::remote(
                    ResourceKind::Vault,
                    operation,
                    format!("409 Conflict: vault '{name}' is locked"),
                ));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl VaultOperations for Faulty {
        async fn create_or_update(
            &self,
            group: &str,
            name: &str,
            params: &VaultCreateOrUpdateParameters,
        ) -> Result<Vault> {
            self.check(Operation::CreateOrUpdate, name)?;
            self.inner.create_or_update(group, name, params).await
        }

        async fn get(&self, group: &str, name: &str) -> Result<Vault> {
            self.check(Operation::Get, name)?;
            self.inner.get(group, name).await
        }

        async fn list_by_resource_group(
            &self,
            group: &str,
            top: Option<u32>,
        ) -> Result<Vec<Vault>> {
            self.check(Operation::ListByGroup, group)?;
            self.inner.list_by_resource_group(group, top).await
        }

        async fn list_by_subscription(
            &self,
            filter: &str,
            top: Option<u32>,
        ) -> Result<Vec<GenericResource>> {
            self.check(Operation::ListBySubscription, filter)?;
            self.inner.list_by_subscription(filter, top).await
        }

        async fn delete(&self, group: &str, name: &str) -> Result<()> {
            self.check(Operation::Delete, name)?;
            self.inner.delete(group, name).await
        }
    }

    fn faulty_context(arm: &InMemoryArm, fail: Operation) -> LifecycleContext {
        let base = arm.clients();
        LifecycleContext {
            clients: ManagementClients {
                groups: base.groups,
                vaults: Box::new(Faulty {
                    inner: base.vaults,
                    fail,
                }),
            },
            identity: VaultIdentity::from(&credentials()),
        }
    }

    /// Group client whose delete always fails
    struct UndeletableGroups {
        inner: Box<dyn ResourceGroupOperations>,
    }

    #[async_trait]
    impl ResourceGroupOperations for UndeletableGroups {
        async fn create_or_update(
            &self,
            name: &str,
            group: &ResourceGroup,
        ) -> Result<ResourceGroup> {
            self.inner.create_or_update(name, group).await
        }

        async fn get(&self, name: &str) -> Result<ResourceGroup> {
            self.inner.get(name).await
        }

        async fn list_resources(&self, name: &str) -> Result<Vec<GenericResource>> {
            self.inner.list_resources(name).await
        }

        async fn list(&self, filter: Option<&str>) -> Result<Vec<ResourceGroup>> {
            self.inner.list(filter).await
        }

        async fn delete(&self, name: &str) -> Result<()> {
            Err(KeyVaultCliError::remote(
                ResourceKind::ResourceGroup,
                Operation::Delete,
                format!("409 Conflict: resource group '{name}' is locked"),
            ))
        }
    }

    fn undeletable_group_context(
        arm: &InMemoryArm,
        vault_fail: Option<Operation>,
    ) -> LifecycleContext {
        let base = arm.clients();
        let vaults: Box<dyn VaultOperations> = match vault_fail {
            Some(fail) => Box::new(Faulty {
                inner: base.vaults,
                fail,
            }),
            None => base.vaults,
        };
        LifecycleContext {
            clients: ManagementClients {
                groups: Box::new(UndeletableGroups { inner: base.groups }),
                vaults,
            },
            identity: VaultIdentity::from(&credentials()),
        }
    }

    #[test]
    fn test_vault_filter() {
        assert_eq!(vault_filter(), "resourceType eq 'Microsoft.KeyVault/vaults'");
    }

    #[tokio::test]
    async fn test_create_then_get_scenario() {
        let arm = InMemoryArm::new("sub1");
        let ctx = context_over(&arm);
        let plan = scenario_plan();
        let orchestrator = Orchestrator::new(&ctx, &plan).unwrap();

        ctx.clients
            .groups
            .create_or_update("g1", &ResourceGroup::new("westus"))
            .await
            .unwrap();
        let params = orchestrator.initial_parameters(&plan.primary);
        ctx.clients
            .vaults
            .create_or_update("g1", "v1", &params)
            .await
            .unwrap();

        let vault = ctx.clients.vaults.get("g1", "v1").await.unwrap();
        assert_eq!(vault.name.as_deref(), Some("v1"));
        assert_eq!(vault.location, "westus");
        assert_eq!(vault.properties.access_policies.len(), 1);
        let policy = &vault.properties.access_policies[0];
        assert_eq!(policy.object_id, "c1");
        assert_eq!(policy.tenant_id, "t1");
        assert!(policy.permissions.secrets.contains(&SecretPermission::Get));
        assert!(policy.permissions.secrets.contains(&SecretPermission::List));
    }

    #[tokio::test]
    async fn test_update_step_changes_only_requested_fields() {
        let arm = InMemoryArm::new("sub1");
        let ctx = context_over(&arm);
        let plan = scenario_plan();
        let orchestrator = Orchestrator::new(&ctx, &plan).unwrap();

        ctx.clients
            .groups
            .create_or_update("g1", &ResourceGroup::new("westus"))
            .await
            .unwrap();
        let created = ctx
            .clients
            .vaults
            .create_or_update("g1", "v1", &orchestrator.initial_parameters(&plan.primary))
            .await
            .unwrap();

        let current = ctx.clients.vaults.get("g1", "v1").await.unwrap();
        let request = merge_update(&current, &VaultUpdate::enable_deployment()).unwrap();
        ctx.clients
            .vaults
            .create_or_update("g1", "v1", &request)
            .await
            .unwrap();

        let after = ctx.clients.vaults.get("g1", "v1").await.unwrap();
        assert_eq!(after.properties.enabled_for_deployment, Some(true));
        assert_eq!(
            after.properties.access_policies[0].permissions.secrets,
            vec![SecretPermission::All]
        );
        assert_eq!(after.location, created.location);
        assert_eq!(after.id, created.id);
        assert_eq!(after.properties.sku, created.properties.sku);
        assert_eq!(
            after.properties.access_policies[0].permissions.keys,
            vec![KeyPermission::Get, KeyPermission::List]
        );
    }

    #[tokio::test]
    async fn test_full_run_walks_every_stage() {
        let arm = InMemoryArm::new("sub1");
        let ctx = context_over(&arm);
        let plan = scenario_plan();
        let mut orchestrator = Orchestrator::new(&ctx, &plan).unwrap();

        let report = orchestrator.run().await.unwrap();

        assert_eq!(report.stage, LifecycleStage::TornDown);
        assert_eq!(report.vaults.len(), 2);
        assert_eq!(report.vaults[0].properties.enabled_for_deployment, Some(true));
        assert_eq!(report.vaults[1].location, "eastus");

        let mut listed: Vec<&str> = report
            .subscription_vaults
            .iter()
            .filter_map(|r| r.name.as_deref())
            .collect();
        listed.sort_unstable();
        assert_eq!(listed, vec!["v1", "v2"]);
        assert_eq!(report.group_vaults.len(), 2);

        let order: Vec<(ResourceKind, &str)> = report
            .teardown
            .iter()
            .map(|r| (r.kind, r.name.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (ResourceKind::Vault, "v1"),
                (ResourceKind::Vault, "v2"),
                (ResourceKind::ResourceGroup, "g1"),
            ]
        );
        assert!(report.teardown.iter().all(|r| r.outcome.is_ok()));
        assert_eq!(arm.group_count(), 0);
        assert_eq!(arm.vault_count(), 0);
    }

    #[tokio::test]
    async fn test_single_vault_variant() {
        let arm = InMemoryArm::new("sub1");
        let ctx = context_over(&arm);
        let mut plan = scenario_plan();
        plan.secondary = None;
        plan.tags = Some(Tags::from([("owner".to_string(), "ops".to_string())]));

        let report = Orchestrator::new(&ctx, &plan)
            .unwrap()
            .run()
            .await
            .unwrap();

        assert_eq!(report.vaults.len(), 1);
        assert_eq!(report.vaults[0].tags, plan.tags);
        assert_eq!(report.teardown.len(), 2);
    }

    #[tokio::test]
    async fn test_vault_delete_failure_still_releases_group() {
        let arm = InMemoryArm::new("sub1");
        let ctx = faulty_context(&arm, Operation::Delete);
        let plan = scenario_plan();
        let mut orchestrator = Orchestrator::new(&ctx, &plan).unwrap();

        let err = orchestrator.run().await.unwrap_err();

        assert!(matches!(
            err,
            KeyVaultCliError::RemoteOperationFailed {
                kind: ResourceKind::Vault,
                operation: Operation::Delete,
                ..
            }
        ));
        assert_eq!(orchestrator.stage(), LifecycleStage::Listed);

        // Both vault deletions were attempted, then the group went regardless
        let teardown = orchestrator.teardown();
        assert_eq!(teardown.len(), 3);
        assert!(teardown[0].outcome.is_err());
        assert!(teardown[1].outcome.is_err());
        assert_eq!(teardown[2].kind, ResourceKind::ResourceGroup);
        assert!(teardown[2].outcome.is_ok());
        assert_eq!(arm.group_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_mid_run_releases_group() {
        let arm = InMemoryArm::new("sub1");
        let ctx = faulty_context(&arm, Operation::Get);
        let plan = scenario_plan();
        let mut orchestrator = Orchestrator::new(&ctx, &plan).unwrap();

        let err = orchestrator.run().await.unwrap_err();

        assert!(matches!(
            err,
            KeyVaultCliError::RemoteOperationFailed {
                operation: Operation::Get,
                ..
            }
        ));
        assert_eq!(orchestrator.stage(), LifecycleStage::VaultCreated);
        assert_eq!(orchestrator.teardown().len(), 1);
        assert_eq!(arm.group_count(), 0);
        assert_eq!(arm.vault_count(), 0);
    }

    #[tokio::test]
    async fn test_release_failure_fails_successful_run() {
        let arm = InMemoryArm::new("sub1");
        let ctx = undeletable_group_context(&arm, None);
        let plan = scenario_plan();
        let mut orchestrator = Orchestrator::new(&ctx, &plan).unwrap();

        let err = orchestrator.run().await.unwrap_err();

        assert!(matches!(
            err,
            KeyVaultCliError::RemoteOperationFailed {
                kind: ResourceKind::ResourceGroup,
                operation: Operation::Delete,
                ..
            }
        ));
        assert_eq!(orchestrator.stage(), LifecycleStage::Listed);

        let teardown = orchestrator.teardown();
        assert_eq!(teardown.len(), 3);
        assert!(teardown[0].outcome.is_ok());
        assert!(teardown[1].outcome.is_ok());
        assert_eq!(teardown[2].kind, ResourceKind::ResourceGroup);
        assert!(teardown[2].outcome.as_ref().unwrap_err().contains("locked"));
        assert_eq!(arm.group_count(), 1);
    }

    #[tokio::test]
    async fn test_release_failure_keeps_step_error() {
        let arm = InMemoryArm::new("sub1");
        let ctx = undeletable_group_context(&arm, Some(Operation::Get));
        let plan = scenario_plan();
        let mut orchestrator = Orchestrator::new(&ctx, &plan).unwrap();

        let err = orchestrator.run().await.unwrap_err();

        assert!(matches!(
            err,
            KeyVaultCliError::RemoteOperationFailed {
                kind: ResourceKind::Vault,
                operation: Operation::Get,
                ..
            }
        ));
        assert_eq!(orchestrator.stage(), LifecycleStage::VaultCreated);

        let teardown = orchestrator.teardown();
        assert_eq!(teardown.len(), 1);
        assert_eq!(teardown[0].kind, ResourceKind::ResourceGroup);
        assert!(teardown[0].outcome.is_err());
    }

    #[tokio::test]
    async fn test_group_creation_failure_stops_before_anything_else() {
        let arm = InMemoryArm::new("sub1");
        let ctx = context_over(&arm);
        ctx.clients
            .groups
            .create_or_update("g1", &ResourceGroup::new("eastus"))
            .await
            .unwrap();

        let plan = scenario_plan();
        let mut orchestrator = Orchestrator::new(&ctx, &plan).unwrap();
        assert!(orchestrator.run().await.is_err());
        assert_eq!(orchestrator.stage(), LifecycleStage::Unstarted);
        assert!(orchestrator.teardown().is_empty());
        assert_eq!(arm.vault_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_object_id_rejected() {
        let arm = InMemoryArm::new("sub1");
        let ctx = context_over(&arm);
        let mut plan = scenario_plan();
        plan.object_id = Some("not a principal".to_string());

        assert!(matches!(
            Orchestrator::new(&ctx, &plan),
            Err(KeyVaultCliError::MalformedIdentifier { .. })
        ));
    }

    #[tokio::test]
    async fn test_dry_run_context_uses_identity() {
        let ctx = LifecycleContext::dry_run(&credentials());
        assert_eq!(ctx.identity.tenant_id, "t1");
        assert_eq!(ctx.identity.object_id, "c1");

        let plan = scenario_plan();
        let report = Orchestrator::new(&ctx, &plan)
            .unwrap()
            .run()
            .await
            .unwrap();
        assert_eq!(report.stage, LifecycleStage::TornDown);
    }

    fn vault_body(enabled_for_deployment: bool, secrets: &[&str]) -> serde_json::Value {
        serde_json::json!({
            "id": "/subscriptions/sub1/resourceGroups/g1/providers/Microsoft.KeyVault/vaults/v1",
            "name": "v1",
            "type": VAULT_RESOURCE_TYPE,
            "location": "westus",
            "properties": {
                "tenantId": "t1",
                "sku": { "family": "A", "name": "standard" },
                "enabledForDeployment": enabled_for_deployment,
                "accessPolicies": [{
                    "tenantId": "t1",
                    "objectId": "c1",
                    "permissions": { "keys": ["get", "list"], "secrets": secrets }
                }]
            }
        })
    }

    #[tokio::test]
    async fn test_connected_run_against_service() {
        use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        const VAULT: &str =
            "/subscriptions/sub1/resourceGroups/g1/providers/Microsoft.KeyVault/vaults/v1";

        let server = MockServer::start().await;

        // One token for the whole run
        Mock::given(method("POST"))
            .and(path("/t1/oauth2/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_type": "Bearer",
                "access_token": "tok",
                "expires_in": "3600"
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/subscriptions/sub1/resourcegroups/g1"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "/subscriptions/sub1/resourceGroups/g1",
                "name": "g1",
                "location": "westus",
                "properties": { "provisioningState": "Succeeded" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        // The update resubmits the whole vault with deployment enabled
        Mock::given(method("PUT"))
            .and(path(VAULT))
            .and(body_partial_json(serde_json::json!({
                "properties": { "enabledForDeployment": true }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(vault_body(true, &["all"])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(VAULT))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(vault_body(false, &["get", "list"])),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(VAULT))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(vault_body(false, &["get", "list"])),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/subscriptions/sub1/resources"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{ "name": "v1", "type": VAULT_RESOURCE_TYPE }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(
                "/subscriptions/sub1/resourceGroups/g1/providers/Microsoft.KeyVault/vaults",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [vault_body(true, &["all"])]
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path(VAULT))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/subscriptions/sub1/resourcegroups/g1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let settings = Settings {
            authority_host: server.uri(),
            resource_manager_endpoint: format!("{}/", server.uri()),
            ..Settings::default()
        };
        let ctx = LifecycleContext::connect(&settings, &credentials())
            .await
            .unwrap();

        let mut plan = scenario_plan();
        plan.secondary = None;
        let report = Orchestrator::new(&ctx, &plan)
            .unwrap()
            .run()
            .await
            .unwrap();

        assert_eq!(report.stage, LifecycleStage::TornDown);
        assert_eq!(report.vaults[0].properties.enabled_for_deployment, Some(true));
        assert_eq!(report.subscription_vaults.len(), 1);
        assert_eq!(report.teardown.len(), 2);
    }
}
