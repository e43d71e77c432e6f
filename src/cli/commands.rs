use crate::auth::{Credentials, TokenProvider};
use crate::cli::args::*;
use crate::cli::completions::handle_completion_command;
use crate::lifecycle::orchestrator::vault_filter;
use crate::lifecycle::{LifecycleContext, Orchestrator};
use crate::utils::config::Settings;
use crate::utils::errors::Result;
use crate::utils::output::{render_vault, OutputFormat};
use std::io;

pub async fn handle_command(cli: Cli) -> Result<()> {
    // Initialize logging - always to stderr
    if !cli.quiet {
        let log_level = match cli.verbose {
            0 => "keyvault_rs=warn",  // Default: warnings only
            1 => "keyvault_rs=info",  // -v: info level
            2 => "keyvault_rs=debug", // -vv: debug level
            _ => "keyvault_rs=trace", // -vvv+: trace level
        };

        tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_env_filter(log_level)
            .init();
    }

    let Cli {
        config,
        authority_host,
        management_endpoint,
        raw,
        command,
        ..
    } = cli;

    let output = OutputFormat::new(raw);
    // Completion must work without a config file, so settings load per command
    let settings = || -> Result<Settings> {
        Ok(Settings::load(config.as_deref())?
            .with_overrides(authority_host.clone(), management_endpoint.clone()))
    };

    match command {
        Commands::Run(args) => handle_run_command(&settings()?, &args).await,
        Commands::Vault { command } => {
            handle_vault_command(&settings()?, command, &output).await
        }
        Commands::Group { command } => {
            handle_group_command(&settings()?, command, &output).await
        }
        Commands::Auth { command } => handle_auth_command(&settings()?, command, &output).await,
        Commands::Completion { command } => handle_completion_command(&command),
    }
}

async fn handle_run_command(settings: &Settings, args: &RunArgs) -> Result<()> {
    let credentials = Credentials::from_env()?;
    let plan = args.plan()?;

    let ctx = if args.dry_run {
        tracing::info!("Dry run: using an in-memory subscription");
        LifecycleContext::dry_run(&credentials)
    } else {
        LifecycleContext::connect(settings, &credentials).await?
    };

    let mut orchestrator = Orchestrator::new(&ctx, &plan)?;
    let report = orchestrator.run().await?;

    println!(
        "Done: {} key vault(s) created and deleted, stage {}",
        report.vaults.len(),
        report.stage
    );
    Ok(())
}

async fn handle_vault_command(
    settings: &Settings,
    command: VaultCommands,
    output: &OutputFormat,
) -> Result<()> {
    let credentials = Credentials::from_env()?;
    let ctx = LifecycleContext::connect(settings, &credentials).await?;
    let vaults = ctx.clients.vaults.as_ref();

    match command {
        VaultCommands::Show {
            resource_group,
            name,
        } => {
            let vault = vaults.get(&resource_group, &name).await?;
            println!("{}", render_vault(&vault));
        }
        VaultCommands::List {
            resource_group: Some(group),
            top,
        } => {
            let found = vaults.list_by_resource_group(&group, top).await?;
            output.print_rows(&found);
        }
        VaultCommands::List {
            resource_group: None,
            top,
        } => {
            let found = vaults.list_by_subscription(&vault_filter(), top).await?;
            output.print_rows(&found);
        }
    }
    Ok(())
}

async fn handle_group_command(
    settings: &Settings,
    command: GroupCommands,
    output: &OutputFormat,
) -> Result<()> {
    let credentials = Credentials::from_env()?;
    let ctx = LifecycleContext::connect(settings, &credentials).await?;
    let groups = ctx.clients.groups.as_ref();

    match command {
        GroupCommands::List { filter } => {
            let found = groups.list(filter.as_deref()).await?;
            output.print_rows(&found);
        }
        GroupCommands::Resources { name } => {
            let found = groups.list_resources(&name).await?;
            output.print_rows(&found);
        }
    }
    Ok(())
}

async fn handle_auth_command(
    settings: &Settings,
    command: AuthCommands,
    output: &OutputFormat,
) -> Result<()> {
    match command {
        AuthCommands::Check => {
            let credentials = Credentials::from_env()?;
            let token = TokenProvider::new(settings)?.acquire(&credentials).await?;

            output.print_table(&[
                vec!["Tenant".to_string(), credentials.tenant_id().to_string()],
                vec![
                    "Subscription".to_string(),
                    credentials.subscription_id().to_string(),
                ],
                vec!["Token type".to_string(), token.token_type().to_string()],
                vec![
                    "Expires".to_string(),
                    token.expires_at().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
                ],
            ]);
            Ok(())
        }
    }
}
