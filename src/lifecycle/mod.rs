pub mod cleanup;
pub mod orchestrator;
pub mod plan;
pub mod update;

pub use cleanup::ScopedGroup;
pub use orchestrator::{LifecycleContext, LifecycleReport, Orchestrator, VaultIdentity};
pub use plan::{LifecyclePlan, TeardownMode, VaultSpec};
pub use update::{merge_update, VaultUpdate};

use std::fmt;

/// Progress of one run. Each step is entered only after its remote call succeeded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleStage {
    #[default]
    Unstarted,
    GroupCreated,
    VaultCreated,
    VaultConfigured,
    SecondVaultCreated,
    Listed,
    TornDown,
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleStage::Unstarted => "unstarted",
            LifecycleStage::GroupCreated => "group-created",
            LifecycleStage::VaultCreated => "vault-created",
            LifecycleStage::VaultConfigured => "vault-configured",
            LifecycleStage::SecondVaultCreated => "second-vault-created",
            LifecycleStage::Listed => "listed",
            LifecycleStage::TornDown => "torn-down",
        };
        f.write_str(name)
    }
}
