//! Bearer token acquisition.
//!
//! Two identities are involved in one invocation:
//!
//! - the runner's **managed identity**, used to read the key vault
//!   ([`ManagedIdentityTokenSource`]);
//! - the **service principal** resolved from the vault, used for the refresh
//!   call itself ([`client_credentials_token`]).
//!
//! Tokens are requested once per use and never cached.

use async_trait::async_trait;
use refresh_core::credential::{Credential, SecretValue};
use serde::Deserialize;
use url::Url;

/// A bearer token. Redacted in `Debug`/`Display`.
pub type AccessToken = SecretValue;

/// Instance metadata token endpoint used when no App Service style identity
/// endpoint is configured.
pub const IMDS_TOKEN_URL: &str = "http://169.254.169.254/metadata/identity/oauth2/token";

const IMDS_API_VERSION: &str = "2018-02-01";
const APP_SERVICE_API_VERSION: &str = "2019-08-01";

/// Longest response body kept in error messages.
const MAX_ERROR_BODY_CHARS: usize = 512;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The token request failed before a response arrived.
    #[error("Token request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The token endpoint answered with a non-2xx status.
    #[error("Token endpoint returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The token endpoint answered 2xx without a usable token.
    #[error("Malformed token response: {0}")]
    Malformed(String),
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

// ---------------------------------------------------------------------------
// TokenSource
// ---------------------------------------------------------------------------

/// Something that can mint a bearer token for a resource.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Acquire a token whose audience is `resource`
    /// (e.g. `https://vault.azure.net`).
    async fn access_token(&self, resource: &str) -> Result<AccessToken, IdentityError>;
}

#[derive(Debug, Clone)]
enum IdentityEndpoint {
    /// `IDENTITY_ENDPOINT` + `IDENTITY_HEADER`, as provided to hosted runners.
    Hosted { url: String, header: SecretValue },
    /// The instance metadata service.
    Imds { url: String },
}

/// Token source backed by the host's managed identity.
#[derive(Debug, Clone)]
pub struct ManagedIdentityTokenSource {
    client: reqwest::Client,
    endpoint: IdentityEndpoint,
}

impl ManagedIdentityTokenSource {
    /// Pick the hosted identity endpoint when `IDENTITY_ENDPOINT` and
    /// `IDENTITY_HEADER` are set, otherwise the instance metadata service.
    pub fn from_env(client: reqwest::Client) -> Self {
        match (
            std::env::var("IDENTITY_ENDPOINT"),
            std::env::var("IDENTITY_HEADER"),
        ) {
            (Ok(url), Ok(header)) => Self::hosted(client, url, SecretValue::new(header)),
            _ => Self::imds(client, IMDS_TOKEN_URL),
        }
    }

    pub fn hosted(client: reqwest::Client, url: impl Into<String>, header: SecretValue) -> Self {
        Self {
            client,
            endpoint: IdentityEndpoint::Hosted {
                url: url.into(),
                header,
            },
        }
    }

    pub fn imds(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: IdentityEndpoint::Imds { url: url.into() },
        }
    }
}

#[async_trait]
impl TokenSource for ManagedIdentityTokenSource {
    async fn access_token(&self, resource: &str) -> Result<AccessToken, IdentityError> {
        let request = match &self.endpoint {
            IdentityEndpoint::Hosted { url, header } => self
                .client
                .get(url)
                .query(&[("resource", resource), ("api-version", APP_SERVICE_API_VERSION)])
                .header("X-IDENTITY-HEADER", header.expose()),
            IdentityEndpoint::Imds { url } => self
                .client
                .get(url)
                .query(&[("resource", resource), ("api-version", IMDS_API_VERSION)])
                .header("Metadata", "true"),
        };

        tracing::debug!(resource, "Requesting managed identity token");
        read_token(request.send().await?).await
    }
}

// ---------------------------------------------------------------------------
// Service principal
// ---------------------------------------------------------------------------

/// OAuth2 client-credentials grant for a service principal.
///
/// POSTs to `{authority_host}/{tenant_id}/oauth2/v2.0/token`.
pub async fn client_credentials_token(
    client: &reqwest::Client,
    authority_host: &Url,
    tenant_id: &str,
    credential: &Credential,
    scope: &str,
) -> Result<AccessToken, IdentityError> {
    let token_url = token_url(authority_host, tenant_id)?;

    let form = [
        ("grant_type", "client_credentials"),
        ("client_id", credential.principal_id.as_str()),
        ("client_secret", credential.secret.expose()),
        ("scope", scope),
    ];

    tracing::debug!(
        principal_id = %credential.principal_id,
        scope,
        "Requesting service principal token"
    );
    let response = client.post(token_url).form(&form).send().await?;
    read_token(response).await
}

fn token_url(authority_host: &Url, tenant_id: &str) -> Result<Url, IdentityError> {
    let mut url = authority_host.clone();
    url.path_segments_mut()
        .map_err(|()| {
            IdentityError::Malformed(format!("authority host cannot be a base: {authority_host}"))
        })?
        .pop_if_empty()
        .extend([tenant_id, "oauth2", "v2.0", "token"]);
    Ok(url)
}

async fn read_token(response: reqwest::Response) -> Result<AccessToken, IdentityError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(IdentityError::HttpStatus {
            status: status.as_u16(),
            body: truncate_body(body),
        });
    }

    let parsed: TokenResponse = response
        .json()
        .await
        .map_err(|e| IdentityError::Malformed(e.to_string()))?;

    match parsed.access_token {
        Some(token) if !token.is_empty() => Ok(SecretValue::new(token)),
        _ => Err(IdentityError::Malformed(
            "response has no access_token".to_string(),
        )),
    }
}

/// Cap a response body for inclusion in an error message.
pub(crate) fn truncate_body(body: String) -> String {
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        return body;
    }
    let mut cut: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    cut.push_str("...");
    cut
}
