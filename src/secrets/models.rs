//! Domain model for workspaces, environments, secrets and folders, plus the
//! wire shapes exchanged with the Infisical API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::types::validation_message;
use crate::errors::{GatewayError, Result};

/// Root of the folder tree
pub const ROOT_PATH: &str = "/";

fn root_path() -> String {
    ROOT_PATH.to_string()
}

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A secret as presented to callers.
///
/// `readonly` marks secrets inherited through an import; they cannot be
/// modified from the importing workspace.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    pub id: String,
    pub key: String,
    pub value: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub secret_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub readonly: bool,
}

impl Secret {
    /// Mark the secret as inherited through an import
    pub fn into_readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    /// Fail with [`GatewayError::InvalidInput`] if the secret is imported
    pub fn ensure_mutable(&self) -> Result<()> {
        if self.readonly {
            return Err(GatewayError::invalid_input(format!(
                "secret '{}' is imported and read-only in this workspace",
                self.key
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secret")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("value", &"[REDACTED]")
            .field("type", &self.secret_type)
            .field("version", &self.version)
            .field("readonly", &self.readonly)
            .finish()
    }
}

/// A folder in the secret path tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub version: u64,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_reserved: bool,
    #[serde(default)]
    pub description: Option<String>,
}

/// A deployment stage within a workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub id: String,
    pub name: String,
    pub slug: String,
}

/// A workspace (project) and its environments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub environments: Vec<Environment>,
}

/// Secrets and folders at one path: native secrets first, then imported ones
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretListing {
    pub secrets: Vec<Secret>,
    pub folders: Vec<Folder>,
}

impl SecretListing {
    /// Secrets stored in the workspace itself
    pub fn native(&self) -> impl Iterator<Item = &Secret> {
        self.secrets.iter().filter(|s| !s.readonly)
    }

    /// Secrets inherited through imports
    pub fn imported(&self) -> impl Iterator<Item = &Secret> {
        self.secrets.iter().filter(|s| s.readonly)
    }
}

/// Environments of a workspace, in upstream order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentListing {
    pub workspace_name: String,
    pub environments: Vec<Environment>,
}

impl EnvironmentListing {
    /// The pinned environment if it exists, otherwise the first one
    pub fn default_environment(&self, pinned: Option<&str>) -> Option<&Environment> {
        pinned
            .and_then(|slug| self.environments.iter().find(|env| env.slug == slug))
            .or_else(|| self.environments.first())
    }
}

impl From<Workspace> for EnvironmentListing {
    fn from(workspace: Workspace) -> Self {
        Self { workspace_name: workspace.name, environments: workspace.environments }
    }
}

/// Workspace, environment and path addressed by read operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SecretScope {
    #[validate(length(min = 1, message = "Workspace ID cannot be empty"))]
    pub workspace_id: String,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub secret_path: Option<String>,
}

impl SecretScope {
    pub fn new(workspace_id: impl Into<String>) -> Self {
        Self { workspace_id: workspace_id.into(), environment: None, secret_path: None }
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn with_path(mut self, secret_path: impl Into<String>) -> Self {
        self.secret_path = Some(secret_path.into());
        self
    }

    /// Secret path, defaulting to the root folder
    pub fn path_or_root(&self) -> &str {
        self.secret_path.as_deref().unwrap_or(ROOT_PATH)
    }
}

/// Create a secret at a path
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSecretRequest {
    #[validate(length(min = 1, message = "Workspace ID cannot be empty"))]
    pub workspace_id: String,
    #[validate(length(min = 1, message = "Environment cannot be empty"))]
    pub environment: String,
    #[serde(default = "root_path")]
    pub secret_path: String,
    #[validate(length(min = 1, message = "Secret key cannot be empty"))]
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub secret_type: Option<String>,
}

/// Update a secret, optionally renaming it
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateSecretRequest {
    #[validate(length(min = 1, message = "Workspace ID cannot be empty"))]
    pub workspace_id: String,
    #[validate(length(min = 1, message = "Environment cannot be empty"))]
    pub environment: String,
    #[serde(default = "root_path")]
    pub secret_path: String,
    /// Key identifying the secret today
    #[validate(length(min = 1, message = "Current key cannot be empty"))]
    pub current_key: String,
    /// Key after the update; equal to `current_key` unless renaming
    #[validate(length(min = 1, message = "Secret key cannot be empty"))]
    pub key: String,
    pub value: String,
    /// New comment; `None` leaves the comment unchanged
    #[serde(default)]
    pub comment: Option<String>,
}

impl UpdateSecretRequest {
    /// Start an update of a fetched secret, keeping its key, value and comment.
    ///
    /// Imported secrets are rejected before any request is made.
    pub fn for_secret(
        secret: &Secret,
        workspace_id: impl Into<String>,
        environment: impl Into<String>,
        secret_path: impl Into<String>,
    ) -> Result<Self> {
        secret.ensure_mutable()?;
        Ok(Self {
            workspace_id: workspace_id.into(),
            environment: environment.into(),
            secret_path: secret_path.into(),
            current_key: secret.key.clone(),
            key: secret.key.clone(),
            value: secret.value.clone(),
            comment: secret.comment.clone(),
        })
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// True when the update renames the secret
    pub fn is_rename(&self) -> bool {
        self.key != self.current_key
    }
}

/// Delete a secret by key
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DeleteSecretRequest {
    #[validate(length(min = 1, message = "Workspace ID cannot be empty"))]
    pub workspace_id: String,
    #[validate(length(min = 1, message = "Environment cannot be empty"))]
    pub environment: String,
    #[serde(default = "root_path")]
    pub secret_path: String,
    #[validate(length(min = 1, message = "Secret key cannot be empty"))]
    pub key: String,
}

impl DeleteSecretRequest {
    /// Delete a fetched secret. Imported secrets are rejected.
    pub fn for_secret(
        secret: &Secret,
        workspace_id: impl Into<String>,
        environment: impl Into<String>,
        secret_path: impl Into<String>,
    ) -> Result<Self> {
        secret.ensure_mutable()?;
        Ok(Self {
            workspace_id: workspace_id.into(),
            environment: environment.into(),
            secret_path: secret_path.into(),
            key: secret.key.clone(),
        })
    }
}

/// Validate a request, reporting failures as [`GatewayError::InvalidInput`]
pub(crate) fn validate_request<T: Validate>(request: &T) -> Result<()> {
    request.validate().map_err(|errors| {
        GatewayError::invalid_input(format!("Validation failed: {}", validation_message(&errors)))
    })
}

// Wire shapes

/// Secret as returned by the API. Both the `secretKey`/`secretValue`/
/// `secretComment` spellings and the short `key`/`value`/`comment` ones are
/// accepted, as is `_id` for `id`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawSecret {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "_id")]
    legacy_id: Option<String>,
    #[serde(default)]
    secret_key: Option<String>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    secret_value: Option<String>,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    secret_comment: Option<String>,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default, rename = "type")]
    secret_type: Option<String>,
    #[serde(default)]
    version: Option<u64>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl From<RawSecret> for Secret {
    fn from(raw: RawSecret) -> Self {
        Secret {
            id: raw.id.or(raw.legacy_id).unwrap_or_default(),
            key: raw.secret_key.or(raw.key).unwrap_or_default(),
            value: raw.secret_value.or(raw.value).unwrap_or_default(),
            secret_type: raw.secret_type,
            comment: raw.secret_comment.or(raw.comment).filter(|c| !c.is_empty()),
            version: raw.version,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
            readonly: false,
        }
    }
}

/// `GET /api/v3/secrets/raw`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SecretsResponse {
    #[serde(default)]
    pub secrets: Vec<RawSecret>,
    #[serde(default)]
    pub imports: Vec<ImportedSecrets>,
}

/// One import linked into the requested path
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ImportedSecrets {
    #[serde(default)]
    pub secret_path: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub secrets: Vec<RawSecret>,
}

/// `GET /api/v1/folders`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct FoldersResponse {
    #[serde(default)]
    pub folders: Vec<Folder>,
}

/// `{ "secret": {...} }` envelope of single-secret responses
#[derive(Debug, Deserialize)]
pub(crate) struct SecretEnvelope {
    pub secret: RawSecret,
}

/// `GET /api/v1/workspace/{workspaceId}`
#[derive(Debug, Deserialize)]
pub(crate) struct WorkspaceEnvelope {
    pub workspace: Workspace,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateSecretBody<'a> {
    pub workspace_id: &'a str,
    pub environment: &'a str,
    pub secret_path: &'a str,
    pub secret_value: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_comment: Option<&'a str>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub secret_type: Option<&'a str>,
}

impl<'a> From<&'a CreateSecretRequest> for CreateSecretBody<'a> {
    fn from(request: &'a CreateSecretRequest) -> Self {
        Self {
            workspace_id: &request.workspace_id,
            environment: &request.environment,
            secret_path: &request.secret_path,
            secret_value: &request.value,
            secret_comment: request.comment.as_deref(),
            secret_type: request.secret_type.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateSecretBody<'a> {
    pub workspace_id: &'a str,
    pub environment: &'a str,
    pub secret_path: &'a str,
    pub secret_value: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_comment: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_secret_name: Option<&'a str>,
}

impl<'a> From<&'a UpdateSecretRequest> for UpdateSecretBody<'a> {
    fn from(request: &'a UpdateSecretRequest) -> Self {
        Self {
            workspace_id: &request.workspace_id,
            environment: &request.environment,
            secret_path: &request.secret_path,
            secret_value: &request.value,
            secret_comment: request.comment.as_deref(),
            new_secret_name: request.is_rename().then_some(request.key.as_str()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeleteSecretBody<'a> {
    pub workspace_id: &'a str,
    pub environment: &'a str,
    pub secret_path: &'a str,
}

impl<'a> From<&'a DeleteSecretRequest> for DeleteSecretBody<'a> {
    fn from(request: &'a DeleteSecretRequest) -> Self {
        Self {
            workspace_id: &request.workspace_id,
            environment: &request.environment,
            secret_path: &request.secret_path,
        }
    }
}
