use crate::arm::models::Tags;
use crate::lifecycle::plan::EASTUS;
use crate::lifecycle::{LifecyclePlan, TeardownMode, VaultSpec};
use crate::utils::errors::{KeyVaultCliError, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "keyvault-rs")]
#[command(version)]
#[command(about = "Create, configure, list and delete Azure Key Vaults")]
#[command(long_about = None)]
pub struct Cli {
    /// Config file path (default: ~/.config/keyvault-rs/config.yaml)
    #[arg(long, env = "KEYVAULT_RS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Identity authority host
    #[arg(long, env = "AZURE_AUTHORITY_HOST")]
    pub authority_host: Option<String>,

    /// Resource manager endpoint
    #[arg(long, env = "AZURE_RESOURCE_MANAGER_ENDPOINT")]
    pub management_endpoint: Option<String>,

    /// Enable verbose logging (repeat for more verbosity: -v INFO, -vv DEBUG, -vvv TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress log output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output raw tab-separated values (no formatting)
    #[arg(short, long)]
    pub raw: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full vault lifecycle: create, configure, list, delete
    Run(RunArgs),
    /// Key vault operations
    Vault {
        #[command(subcommand)]
        command: VaultCommands,
    },
    /// Resource group operations
    Group {
        #[command(subcommand)]
        command: GroupCommands,
    },
    /// Authentication checks
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Generate shell completion scripts
    Completion {
        #[command(subcommand)]
        command: CompletionCommands,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    /// Two vaults, pause before teardown
    Walkthrough,
    /// One vault, teardown without asking
    Quickstart,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Which preset to start from
    #[arg(long, value_enum, default_value = "walkthrough")]
    pub variant: Variant,

    /// Resource group to create
    #[arg(long, short = 'g')]
    pub resource_group: Option<String>,

    /// Location of the group and the first vault
    #[arg(long, short = 'l')]
    pub location: Option<String>,

    /// Name of the first vault
    #[arg(long)]
    pub vault: Option<String>,

    /// Name of a second vault
    #[arg(long)]
    pub second_vault: Option<String>,

    /// Location of the second vault
    #[arg(long)]
    pub second_location: Option<String>,

    /// Only create the first vault
    #[arg(long, conflicts_with_all = ["second_vault", "second_location"])]
    pub single: bool,

    /// Delete without waiting for confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Principal granted access (default: the client ID)
    #[arg(long)]
    pub object_id: Option<String>,

    /// Tag applied to the group and vaults, as key=value (repeatable)
    #[arg(long = "tag", value_parser = parse_tag)]
    pub tags: Vec<(String, String)>,

    /// Run against an in-memory subscription instead of Azure
    #[arg(long)]
    pub dry_run: bool,
}

fn parse_tag(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

impl RunArgs {
    /// Start from the preset and apply every flag on top
    pub fn plan(&self) -> Result<LifecyclePlan> {
        let mut plan = match self.variant {
            Variant::Walkthrough => LifecyclePlan::walkthrough(),
            Variant::Quickstart => LifecyclePlan::quickstart(),
        };

        if let Some(group) = &self.resource_group {
            plan.group_name = group.clone();
        }
        if let Some(location) = &self.location {
            plan.location = location.clone();
        }
        if let Some(vault) = &self.vault {
            plan.primary.name = vault.clone();
        }

        if self.single {
            plan.secondary = None;
        } else if let Some(name) = &self.second_vault {
            let location = self.second_location.as_deref().unwrap_or(EASTUS);
            plan.secondary = Some(VaultSpec::secondary(name.clone(), location));
        } else if let Some(location) = &self.second_location {
            match plan.secondary.as_mut() {
                Some(secondary) => secondary.location = Some(location.clone()),
                None => {
                    return Err(KeyVaultCliError::InvalidInput(
                        "--second-location needs --second-vault with this variant".to_string(),
                    ))
                }
            }
        }

        if plan
            .secondary
            .as_ref()
            .is_some_and(|s| s.name.eq_ignore_ascii_case(&plan.primary.name))
        {
            return Err(KeyVaultCliError::InvalidInput(format!(
                "Both vaults are named '{}'",
                plan.primary.name
            )));
        }

        if self.yes {
            plan.teardown = TeardownMode::Automatic;
        }
        if let Some(object_id) = &self.object_id {
            plan.object_id = Some(object_id.clone());
        }
        if !self.tags.is_empty() {
            plan.tags = Some(self.tags.iter().cloned().collect::<Tags>());
        }

        Ok(plan)
    }
}

#[derive(Subcommand)]
pub enum VaultCommands {
    /// Show one key vault
    Show {
        /// Resource group
        resource_group: String,
        /// Vault name
        name: String,
    },
    /// List key vaults in a group, or in the whole subscription
    List {
        /// Resource group (lists the subscription if not provided)
        #[arg(long, short = 'g')]
        resource_group: Option<String>,
        /// Maximum number of results
        #[arg(long)]
        top: Option<u32>,
    },
}

#[derive(Subcommand)]
pub enum GroupCommands {
    /// List resource groups in the subscription
    List {
        /// OData filter, e.g. "tagName eq 'env'"
        #[arg(long)]
        filter: Option<String>,
    },
    /// List every resource inside a group
    Resources {
        /// Resource group
        name: String,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Acquire a management token and show its expiry
    Check,
}

#[derive(Subcommand)]
pub enum CompletionCommands {
    /// Generate bash completion script
    Bash,
    /// Generate zsh completion script
    Zsh,
    /// Generate fish completion script
    Fish,
    /// Generate PowerShell completion script
    PowerShell,
}

impl CompletionCommands {
    pub fn shell(&self) -> Shell {
        match self {
            CompletionCommands::Bash => Shell::Bash,
            CompletionCommands::Zsh => Shell::Zsh,
            CompletionCommands::Fish => Shell::Fish,
            CompletionCommands::PowerShell => Shell::PowerShell,
        }
    }
}
