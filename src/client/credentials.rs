//! Credential store holding the single authentication strategy of a client.
//!
//! A store is created once per client from configuration. For the
//! client-credentials strategy it also owns the current access token and its
//! expiry, which only the [`TokenAuthenticator`](super::TokenAuthenticator)
//! writes.

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::GatewayConfig;
use crate::errors::{GatewayError, Result};
use crate::secrets::SecretString;

/// Which authentication strategy a client uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStrategy {
    /// A long-lived token sent as-is
    StaticToken,
    /// Universal-auth client credentials exchanged for short-lived access tokens
    ClientCredentials,
}

impl AuthStrategy {
    /// True for strategies whose token can be refreshed
    pub fn is_dynamic(&self) -> bool {
        matches!(self, AuthStrategy::ClientCredentials)
    }
}

impl std::fmt::Display for AuthStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthStrategy::StaticToken => write!(f, "static-token"),
            AuthStrategy::ClientCredentials => write!(f, "client-credentials"),
        }
    }
}

/// An access token together with its local expiry
#[derive(Debug, Clone)]
struct AccessToken {
    token: SecretString,
    expires_at: DateTime<Utc>,
}

#[derive(Debug)]
enum Credential {
    StaticToken {
        token: SecretString,
    },
    ClientCredentials {
        client_id: String,
        client_secret: SecretString,
        session: RwLock<Option<AccessToken>>,
    },
}

/// Holds exactly one authentication strategy, validated at construction.
#[derive(Debug)]
pub struct CredentialStore {
    credential: Credential,
}

impl CredentialStore {
    /// Select the strategy from configuration.
    ///
    /// Fails with [`GatewayError::Configuration`] when no usable credentials
    /// are configured, when only half of a client-id/secret pair is present,
    /// or when a static token and client credentials are both present.
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let token = config.token.as_ref().filter(|t| !t.is_blank());
        let client_id = config.client_id.as_deref().filter(|id| !id.trim().is_empty());
        let client_secret = config.client_secret.as_ref().filter(|s| !s.is_blank());

        match (token, client_id, client_secret) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(GatewayError::configuration(
                "both a static token and client credentials are configured; choose one",
            )),
            (Some(token), None, None) => Ok(Self::static_token(token.clone())),
            (None, Some(id), Some(secret)) => Ok(Self::client_credentials(id, secret.clone())),
            (None, Some(_), None) => {
                Err(GatewayError::configuration("client_id is set but client_secret is missing"))
            }
            (None, None, Some(_)) => {
                Err(GatewayError::configuration("client_secret is set but client_id is missing"))
            }
            (None, None, None) => Err(GatewayError::configuration(
                "no credentials configured: set either token or client_id and client_secret",
            )),
        }
    }

    /// Store for a static token
    pub fn static_token(token: impl Into<SecretString>) -> Self {
        Self { credential: Credential::StaticToken { token: token.into() } }
    }

    /// Store for universal-auth client credentials, with no access token yet
    pub fn client_credentials(
        client_id: impl Into<String>,
        client_secret: impl Into<SecretString>,
    ) -> Self {
        Self {
            credential: Credential::ClientCredentials {
                client_id: client_id.into(),
                client_secret: client_secret.into(),
                session: RwLock::new(None),
            },
        }
    }

    /// The strategy selected at construction
    pub fn current_strategy(&self) -> AuthStrategy {
        match self.credential {
            Credential::StaticToken { .. } => AuthStrategy::StaticToken,
            Credential::ClientCredentials { .. } => AuthStrategy::ClientCredentials,
        }
    }

    /// Client ID and secret for the login exchange, if the strategy is dynamic
    pub(crate) fn login_credentials(&self) -> Option<(&str, &SecretString)> {
        match &self.credential {
            Credential::StaticToken { .. } => None,
            Credential::ClientCredentials { client_id, client_secret, .. } => {
                Some((client_id.as_str(), client_secret))
            }
        }
    }

    /// True iff an access token is present and `now` is before its expiry.
    ///
    /// Always false for the static strategy, which has no expiring token.
    pub async fn is_token_valid(&self, now: DateTime<Utc>) -> bool {
        match &self.credential {
            Credential::StaticToken { .. } => false,
            Credential::ClientCredentials { session, .. } => {
                session.read().await.as_ref().is_some_and(|t| now < t.expires_at)
            }
        }
    }

    /// Expiry of the current access token, if one is stored
    pub async fn token_expires_at(&self) -> Option<DateTime<Utc>> {
        match &self.credential {
            Credential::StaticToken { .. } => None,
            Credential::ClientCredentials { session, .. } => {
                session.read().await.as_ref().map(|t| t.expires_at)
            }
        }
    }

    /// Token to send as `Authorization: Bearer <token>`
    pub async fn bearer_token(&self) -> Option<SecretString> {
        match &self.credential {
            Credential::StaticToken { token } => Some(token.clone()),
            Credential::ClientCredentials { session, .. } => {
                session.read().await.as_ref().map(|t| t.token.clone())
            }
        }
    }

    /// Record a freshly issued access token. No-op for the static strategy.
    pub async fn store_access_token(&self, token: SecretString, expires_at: DateTime<Utc>) {
        if let Credential::ClientCredentials { session, .. } = &self.credential {
            *session.write().await = Some(AccessToken { token, expires_at });
            debug!(%expires_at, "Stored access token");
        }
    }

    /// Force the current access token to be treated as expired.
    ///
    /// The token itself is kept so the token/expiry pair stays consistent;
    /// the next [`is_token_valid`](Self::is_token_valid) check fails and
    /// triggers a refresh.
    pub async fn invalidate(&self) {
        if let Credential::ClientCredentials { session, .. } = &self.credential {
            if let Some(current) = session.write().await.as_mut() {
                current.expires_at = DateTime::<Utc>::MIN_UTC;
                debug!("Access token force-expired");
            }
        }
    }
}

/// Upper bound on a locally tracked token lifetime (ten years)
const MAX_TOKEN_LIFETIME_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;

/// Compute the local expiry for a token issued at `now` with the given lifetime.
///
/// The safety margin is subtracted so the token is renewed before the
/// upstream service starts rejecting it. Lifetimes shorter than the margin
/// produce an expiry equal to `now`.
pub fn expiry_for(
    now: DateTime<Utc>,
    expires_in_seconds: u64,
    safety_margin_seconds: u64,
) -> DateTime<Utc> {
    let lifetime = expires_in_seconds
        .saturating_sub(safety_margin_seconds)
        .min(MAX_TOKEN_LIFETIME_SECONDS);
    now + Duration::seconds(lifetime as i64)
}
