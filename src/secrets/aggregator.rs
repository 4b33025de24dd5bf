//! Combines native secrets, imported secrets and folders of one path into a
//! single listing.

use tracing::debug;

use super::models::{FoldersResponse, Secret, SecretListing, SecretScope, SecretsResponse};
use crate::client::{ApiRequest, RequestExecutor};
use crate::errors::Result;

/// Secrets listing route
pub const SECRETS_PATH: &str = "/api/v3/secrets/raw";
/// Folders listing route
pub const FOLDERS_PATH: &str = "/api/v1/folders";

/// Native secrets in upstream order, followed by every import's secrets in
/// upstream order, each marked read-only. Keys are not de-duplicated.
pub fn merge_imports<I>(native: Vec<Secret>, imports: I) -> Vec<Secret>
where
    I: IntoIterator<Item = Vec<Secret>>,
{
    let mut merged = native;
    for imported in imports {
        merged.extend(imported.into_iter().map(Secret::into_readonly));
    }
    merged
}

pub(crate) fn list_secrets_request(scope: &SecretScope) -> ApiRequest {
    ApiRequest::get(SECRETS_PATH)
        .query("workspaceId", &scope.workspace_id)
        .query_opt("environment", scope.environment.as_deref())
        .query("include_imports", true)
        .query("secretPath", scope.path_or_root())
        .query("viewSecretValue", false)
}

pub(crate) fn list_folders_request(scope: &SecretScope) -> ApiRequest {
    ApiRequest::get(FOLDERS_PATH)
        .query("workspaceId", &scope.workspace_id)
        .query_opt("environment", scope.environment.as_deref())
        .query("include_imports", true)
        .query("path", scope.path_or_root())
}

/// Fetches and merges the listing for a [`SecretScope`]
pub struct ResourceAggregator<'a> {
    executor: &'a RequestExecutor,
}

impl<'a> ResourceAggregator<'a> {
    pub fn new(executor: &'a RequestExecutor) -> Self {
        Self { executor }
    }

    /// Secrets (native then imported) and folders at the scope's path.
    ///
    /// The two upstream calls run concurrently; either failing fails the whole
    /// listing.
    pub async fn get_secrets(&self, scope: &SecretScope) -> Result<SecretListing> {
        let secrets_request = list_secrets_request(scope);
        let folders_request = list_folders_request(scope);

        let (secrets, folders) = tokio::try_join!(
            self.executor.execute_json::<SecretsResponse>(&secrets_request),
            self.executor.execute_json::<FoldersResponse>(&folders_request),
        )?;

        for import in &secrets.imports {
            debug!(
                import_environment = ?import.environment,
                import_path = ?import.secret_path,
                count = import.secrets.len(),
                "Flattening imported secrets"
            );
        }

        let native: Vec<Secret> = secrets.secrets.into_iter().map(Secret::from).collect();
        let imports = secrets
            .imports
            .into_iter()
            .map(|import| import.secrets.into_iter().map(Secret::from).collect::<Vec<_>>());
        let merged = merge_imports(native, imports);

        debug!(
            secrets = merged.len(),
            folders = folders.folders.len(),
            "Aggregated secret listing"
        );

        Ok(SecretListing { secrets: merged, folders: folders.folders })
    }
}
