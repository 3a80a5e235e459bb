//! Secret lookup.
//!
//! The invoker reads three values by name (application id, application
//! secret, tenant id). Each read is independent and attempted once.

use std::sync::Arc;

use async_trait::async_trait;
use refresh_core::credential::SecretValue;
use refresh_core::endpoint::EndpointTemplate;
use serde::Deserialize;

use crate::identity::{truncate_body, IdentityError, TokenSource};

/// Key vault REST API version.
pub const KEY_VAULT_API_VERSION: &str = "7.4";

/// Audience of key vault access tokens.
pub const KEY_VAULT_RESOURCE: &str = "https://vault.azure.net";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("Secret '{0}' not found")]
    NotFound(String),

    #[error("Access to secret '{0}' denied")]
    AccessDenied(String),

    #[error("Secret store returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Secret request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Could not authenticate to the secret store: {0}")]
    Identity(#[from] IdentityError),

    #[error("Malformed secret store response: {0}")]
    Malformed(String),
}

// ---------------------------------------------------------------------------
// SecretProvider
// ---------------------------------------------------------------------------

/// Read access to a named secret in a named vault.
#[async_trait]
pub trait SecretProvider: Send + Sync {
    async fn get_secret(&self, vault_name: &str, secret_name: &str)
        -> Result<SecretValue, SecretError>;
}

// ---------------------------------------------------------------------------
// Key vault
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SecretBundle {
    value: Option<String>,
}

/// Reads secrets from a key vault over REST, authenticating with a bearer
/// token from `identity`.
pub struct KeyVaultSecretProvider {
    client: reqwest::Client,
    vault_url: EndpointTemplate,
    identity: Arc<dyn TokenSource>,
}

impl KeyVaultSecretProvider {
    pub fn new(
        client: reqwest::Client,
        vault_url: EndpointTemplate,
        identity: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            client,
            vault_url,
            identity,
        }
    }
}

#[async_trait]
impl SecretProvider for KeyVaultSecretProvider {
    async fn get_secret(
        &self,
        vault_name: &str,
        secret_name: &str,
    ) -> Result<SecretValue, SecretError> {
        let mut url = self
            .vault_url
            .render(vault_name)
            .map_err(|e| SecretError::Malformed(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| SecretError::Malformed("vault URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["secrets", secret_name]);
        url.query_pairs_mut()
            .append_pair("api-version", KEY_VAULT_API_VERSION);

        let token = self.identity.access_token(KEY_VAULT_RESOURCE).await?;

        tracing::debug!(vault = vault_name, secret = secret_name, "Reading secret");
        let response = self
            .client
            .get(url)
            .bearer_auth(token.expose())
            .send()
            .await?;

        let status = response.status();
        match status.as_u16() {
            200..=299 => {}
            404 => return Err(SecretError::NotFound(secret_name.to_string())),
            401 | 403 => return Err(SecretError::AccessDenied(secret_name.to_string())),
            code => {
                let body = response.text().await.unwrap_or_default();
                return Err(SecretError::HttpStatus {
                    status: code,
                    body: truncate_body(body),
                });
            }
        }

        let bundle: SecretBundle = response
            .json()
            .await
            .map_err(|e| SecretError::Malformed(e.to_string()))?;

        bundle
            .value
            .map(SecretValue::new)
            .ok_or_else(|| SecretError::Malformed(format!("secret '{secret_name}' has no value")))
    }
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Reads secrets from environment variables, for local development.
///
/// Secret `AppSecret` with prefix `REFRESH_SECRET_` is read from
/// `REFRESH_SECRET_APPSECRET`; non-alphanumeric characters become `_`.
/// The vault name is ignored.
#[derive(Debug, Clone)]
pub struct EnvSecretProvider {
    prefix: String,
}

impl EnvSecretProvider {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Environment variable consulted for `secret_name`.
    pub fn variable_name(&self, secret_name: &str) -> String {
        let suffix: String = secret_name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}{suffix}", self.prefix)
    }
}

#[async_trait]
impl SecretProvider for EnvSecretProvider {
    async fn get_secret(
        &self,
        _vault_name: &str,
        secret_name: &str,
    ) -> Result<SecretValue, SecretError> {
        let var = self.variable_name(secret_name);
        match std::env::var(&var) {
            Ok(value) if !value.is_empty() => Ok(SecretValue::new(value)),
            _ => {
                tracing::debug!(variable = %var, "Secret variable not set");
                Err(SecretError::NotFound(secret_name.to_string()))
            }
        }
    }
}
