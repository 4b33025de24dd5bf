//! Secret CLI commands

use anyhow::{anyhow, Context, Result};
use clap::{Args, Subcommand};
use owo_colors::OwoColorize;

use super::output::{print_json, print_listing, print_secret};
use crate::secrets::{
    CreateSecretRequest, DeleteSecretRequest, Secret, SecretScope, SecretsGateway,
    UpdateSecretRequest, ROOT_PATH,
};

/// Workspace, environment and folder a command operates on
#[derive(Args, Debug, Clone)]
pub struct ScopeArgs {
    /// Workspace (project) ID
    #[arg(short, long, value_name = "ID")]
    pub workspace: String,

    /// Environment slug; defaults to the configured environment
    #[arg(short, long, value_name = "SLUG")]
    pub environment: Option<String>,

    /// Secret path
    #[arg(short, long, value_name = "PATH", default_value = ROOT_PATH)]
    pub path: String,
}

#[derive(Subcommand, Debug)]
pub enum SecretsCommands {
    /// List native and imported secrets plus folders at a path
    #[command(
        after_help = "EXAMPLES:\n    infisical-gateway secrets list --workspace 6512ab --environment dev --path /api"
    )]
    List {
        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Show a single secret by key or ID
    Get {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Secret key (or ID with --by-id)
        #[arg(value_name = "KEY")]
        key: String,

        /// Treat the argument as a secret ID
        #[arg(long)]
        by_id: bool,
    },

    /// Create a secret
    Create {
        #[command(flatten)]
        scope: ScopeArgs,

        #[arg(value_name = "KEY")]
        key: String,

        #[arg(value_name = "VALUE")]
        value: String,

        #[arg(long)]
        comment: Option<String>,

        /// Secret type (shared or personal)
        #[arg(long = "type", value_name = "TYPE")]
        secret_type: Option<String>,
    },

    /// Update the value, key or comment of a secret
    #[command(
        after_help = "Imported secrets are read-only and cannot be updated from the importing workspace."
    )]
    Update {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Current secret key
        #[arg(value_name = "KEY")]
        key: String,

        /// New value; the current value is kept when omitted
        #[arg(long)]
        value: Option<String>,

        /// Rename the secret
        #[arg(long, value_name = "KEY")]
        new_key: Option<String>,

        #[arg(long)]
        comment: Option<String>,
    },

    /// Delete a secret
    Delete {
        #[command(flatten)]
        scope: ScopeArgs,

        #[arg(value_name = "KEY")]
        key: String,
    },
}

/// Handle secret commands
pub async fn handle_secrets_command(
    command: SecretsCommands,
    gateway: &dyn SecretsGateway,
    default_environment: Option<&str>,
    json: bool,
) -> Result<()> {
    match command {
        SecretsCommands::List { scope } => {
            let listing = gateway.get_secrets(&read_scope(&scope, default_environment)).await?;
            if json {
                print_json(&listing)?;
            } else {
                print_listing(&listing);
            }
        }

        SecretsCommands::Get { scope, key, by_id } => {
            let scope = read_scope(&scope, default_environment);
            let secret = if by_id {
                gateway.get_secret_by_id(&scope, &key).await?
            } else {
                gateway.get_secret_by_key(&scope, &key).await?
            };
            emit_secret(&secret, json)?;
        }

        SecretsCommands::Create { scope, key, value, comment, secret_type } => {
            let environment = require_environment(&scope, default_environment)?;
            let request = CreateSecretRequest {
                workspace_id: scope.workspace,
                environment,
                secret_path: scope.path,
                key,
                value,
                comment,
                secret_type,
            };
            let secret = gateway.create_secret(&request).await?;
            if !json {
                println!("{}", format!("Secret '{}' created", secret.key).green());
            }
            emit_secret(&secret, json)?;
        }

        SecretsCommands::Update { scope, key, value, new_key, comment } => {
            let environment = require_environment(&scope, default_environment)?;
            let read_scope = read_scope(&scope, Some(environment.as_str()));
            let existing = find_listed(gateway, &read_scope, &key).await?;

            let mut request = UpdateSecretRequest::for_secret(
                &existing,
                &scope.workspace,
                environment,
                &scope.path,
            )?;
            let value = match value {
                Some(value) => value,
                // Listings hide values, so fetch the current one before resending it
                None => gateway.get_secret_by_key(&read_scope, &key).await?.value,
            };
            request = request.with_value(value);
            if let Some(new_key) = new_key {
                request = request.with_key(new_key);
            }
            if let Some(comment) = comment {
                request = request.with_comment(comment);
            }

            let secret = gateway.update_secret(&request).await?;
            if !json {
                println!("{}", format!("Secret '{}' updated", secret.key).green());
            }
            emit_secret(&secret, json)?;
        }

        SecretsCommands::Delete { scope, key } => {
            let environment = require_environment(&scope, default_environment)?;
            let read_scope = read_scope(&scope, Some(environment.as_str()));
            let existing = find_listed(gateway, &read_scope, &key).await?;

            let request = DeleteSecretRequest::for_secret(
                &existing,
                &scope.workspace,
                environment,
                &scope.path,
            )?;
            let deleted = gateway.delete_secret(&request).await?;

            if json {
                print_json(&deleted)?;
            } else {
                println!("{}", format!("Secret '{}' deleted", key).green());
            }
        }
    }

    Ok(())
}

fn read_scope(args: &ScopeArgs, default_environment: Option<&str>) -> SecretScope {
    SecretScope {
        workspace_id: args.workspace.clone(),
        environment: args.environment.clone().or_else(|| default_environment.map(String::from)),
        secret_path: Some(args.path.clone()),
    }
}

fn require_environment(args: &ScopeArgs, default_environment: Option<&str>) -> Result<String> {
    args.environment
        .clone()
        .or_else(|| default_environment.map(String::from))
        .ok_or_else(|| anyhow!("--environment is required (or set INFISICAL_ENVIRONMENT)"))
}

/// Locate a secret in the listing of its path, keeping its read-only flag.
///
/// Native secrets come first in a listing, so a native secret shadows an
/// imported one with the same key.
async fn find_listed(
    gateway: &dyn SecretsGateway,
    scope: &SecretScope,
    key: &str,
) -> Result<Secret> {
    let listing = gateway
        .get_secrets(scope)
        .await
        .with_context(|| format!("Failed to look up secret '{}'", key))?;

    let secret = listing
        .secrets
        .into_iter()
        .find(|s| s.key == key)
        .ok_or_else(|| anyhow!("Secret '{}' not found at path '{}'", key, scope.path_or_root()))?;

    Ok(secret)
}

fn emit_secret(secret: &Secret, json: bool) -> Result<()> {
    if json {
        print_json(secret)
    } else {
        print_secret(secret);
        Ok(())
    }
}
