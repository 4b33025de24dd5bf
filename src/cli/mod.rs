//! # Command Line Interface
//!
//! Lists, reads and edits Infisical secrets through the gateway client.

pub mod output;
pub mod secrets;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::GatewayConfig;
use crate::observability::{init_logging, log_config_info};
use crate::secrets::{InfisicalGateway, SecretString, SecretsGateway};

#[derive(Parser, Debug)]
#[command(name = "infisical-gateway")]
#[command(about = "Authenticated client for the Infisical secrets API")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Base URL of the Infisical instance
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Static service token; replaces any configured credentials
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Secret commands
    Secrets {
        #[command(subcommand)]
        command: secrets::SecretsCommands,
    },

    /// List the environments of a workspace
    Environments {
        /// Workspace (project) ID
        #[arg(short, long, value_name = "ID")]
        workspace: String,
    },
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = resolve_config(&cli)?;
    init_logging(&config.logging)?;
    log_config_info(&config);

    let pinned_environment = config.environment.clone();
    let gateway = InfisicalGateway::new(config).context("Failed to create Infisical gateway")?;

    match cli.command {
        Commands::Secrets { command } => {
            secrets::handle_secrets_command(
                command,
                &gateway,
                pinned_environment.as_deref(),
                cli.json,
            )
            .await?
        }
        Commands::Environments { workspace } => {
            let listing = gateway.get_environments(&workspace).await?;
            if cli.json {
                output::print_json(&listing)?;
            } else {
                output::print_environments(&listing, pinned_environment.as_deref());
            }
        }
    }

    Ok(())
}

/// Load configuration and apply command line overrides
pub fn resolve_config(cli: &Cli) -> anyhow::Result<GatewayConfig> {
    let mut config =
        GatewayConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(token) = &cli.token {
        config.token = Some(SecretString::new(token.clone()));
        config.client_id = None;
        config.client_secret = None;
    }
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_secrets_list() {
        let cli = Cli::parse_from([
            "infisical-gateway",
            "--json",
            "secrets",
            "list",
            "--workspace",
            "ws-1",
            "--path",
            "/api",
        ]);
        assert!(cli.json);
        match cli.command {
            Commands::Secrets { command: secrets::SecretsCommands::List { scope } } => {
                assert_eq!(scope.workspace, "ws-1");
                assert_eq!(scope.path, "/api");
                assert!(scope.environment.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_update_with_rename() {
        let cli = Cli::parse_from([
            "infisical-gateway",
            "secrets",
            "update",
            "-w",
            "ws-1",
            "-e",
            "dev",
            "OLD_KEY",
            "--new-key",
            "NEW_KEY",
        ]);
        match cli.command {
            Commands::Secrets {
                command: secrets::SecretsCommands::Update { key, new_key, value, .. },
            } => {
                assert_eq!(key, "OLD_KEY");
                assert_eq!(new_key.as_deref(), Some("NEW_KEY"));
                assert!(value.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
