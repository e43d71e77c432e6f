use crate::arm::models::ResourceGroup;
use crate::arm::ResourceGroupOperations;
use crate::utils::errors::Result;

/// A resource group created for the duration of one run.
///
/// `release` must be awaited on every exit path; dropping an unreleased
/// scope only logs, since deletion cannot run from `Drop`.
pub struct ScopedGroup<'a> {
    groups: &'a dyn ResourceGroupOperations,
    name: String,
    group: ResourceGroup,
    released: bool,
}

impl<'a> ScopedGroup<'a> {
    /// Create (or adopt) the group and register its release
    pub async fn acquire(
        groups: &'a dyn ResourceGroupOperations,
        name: &str,
        request: &ResourceGroup,
    ) -> Result<ScopedGroup<'a>> {
        let group = groups.create_or_update(name, request).await?;
        tracing::debug!("Registered cleanup for resource group '{name}'");

        Ok(Self {
            groups,
            name: name.to_string(),
            group,
            released: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> &ResourceGroup {
        &self.group
    }

    /// Delete the group, best effort. The caller decides what a failure means.
    pub async fn release(mut self) -> Result<()> {
        self.released = true;
        tracing::info!("Releasing resource group '{}'", self.name);

        let result = self.groups.delete(&self.name).await;
        if let Err(e) = &result {
            tracing::warn!("Failed to delete resource group '{}': {e}", self.name);
        }
        result
    }
}

impl Drop for ScopedGroup<'_> {
    fn drop(&mut self) {
        if !self.released {
            tracing::warn!(
                "Resource group '{}' was never released and may still exist",
                self.name
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arm::memory::InMemoryArm;

    #[tokio::test]
    async fn test_acquire_then_release() {
        let arm = InMemoryArm::new("sub1");
        let clients = arm.clients();

        let scope = ScopedGroup::acquire(
            clients.groups.as_ref(),
            "g1",
            &ResourceGroup::new("westus"),
        )
        .await
        .unwrap();
        assert_eq!(scope.name(), "g1");
        assert_eq!(scope.group().location, "westus");
        assert_eq!(arm.group_count(), 1);

        scope.release().await.unwrap();
        assert_eq!(arm.group_count(), 0);
    }

    #[tokio::test]
    async fn test_release_failure_is_returned() {
        let arm = InMemoryArm::new("sub1");
        let clients = arm.clients();

        let scope = ScopedGroup::acquire(
            clients.groups.as_ref(),
            "g1",
            &ResourceGroup::new("westus"),
        )
        .await
        .unwrap();
        // Removed behind the scope's back
        clients.groups.delete("g1").await.unwrap();

        assert!(scope.release().await.unwrap_err().is_not_found());
    }
}
