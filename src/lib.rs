pub mod arm;
pub mod auth;
pub mod cli;
pub mod lifecycle;
pub mod utils;

// Re-export specific items to avoid conflicts
pub use arm::{ManagementClients, ResourceGroupOperations, VaultOperations};
pub use auth::{Credentials, SessionToken, TokenProvider};
pub use cli::{args, commands};
pub use lifecycle::{LifecycleContext, LifecyclePlan, LifecycleReport, Orchestrator};
pub use utils::{config, errors, output, paths};
