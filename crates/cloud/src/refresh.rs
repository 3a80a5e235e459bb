//! Remote tabular-model refresh endpoint.
//!
//! The command document is sent verbatim; the call blocks until the remote
//! service finishes or fails. There is no retry and no explicit timeout.

use async_trait::async_trait;
use refresh_core::command::RefreshCommandDocument;
use refresh_core::credential::Credential;
use url::Url;

use crate::identity::{client_credentials_token, truncate_body, IdentityError};

/// Default OAuth authority host.
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Default token scope for the tabular-model service.
pub const DEFAULT_REFRESH_SCOPE: &str = "https://analysis.windows.net/powerbi/api/.default";

#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("Service principal authentication failed: {0}")]
    Identity(#[from] IdentityError),

    #[error("Refresh request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Refresh rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Unsupported endpoint scheme '{0}'")]
    UnsupportedScheme(String),
}

/// Executes a refresh command against a workspace endpoint.
#[async_trait]
pub trait RefreshEndpoint: Send + Sync {
    async fn execute(
        &self,
        endpoint: &Url,
        command: &RefreshCommandDocument,
        credential: &Credential,
        tenant_id: &str,
    ) -> Result<(), RefreshError>;
}

/// HTTP implementation: service-principal token, then a JSON POST of the
/// command to the endpoint address.
#[derive(Debug, Clone)]
pub struct HttpRefreshEndpoint {
    client: reqwest::Client,
    authority_host: Url,
    scope: String,
}

impl HttpRefreshEndpoint {
    pub fn new(client: reqwest::Client, authority_host: Url, scope: impl Into<String>) -> Self {
        Self {
            client,
            authority_host,
            scope: scope.into(),
        }
    }
}

#[async_trait]
impl RefreshEndpoint for HttpRefreshEndpoint {
    async fn execute(
        &self,
        endpoint: &Url,
        command: &RefreshCommandDocument,
        credential: &Credential,
        tenant_id: &str,
    ) -> Result<(), RefreshError> {
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(RefreshError::UnsupportedScheme(endpoint.scheme().to_string()));
        }

        let token = client_credentials_token(
            &self.client,
            &self.authority_host,
            tenant_id,
            credential,
            &self.scope,
        )
        .await?;

        tracing::debug!(endpoint = %endpoint, bytes = command.len(), "Sending refresh command");
        let response = self
            .client
            .post(endpoint.clone())
            .bearer_auth(token.expose())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(command.as_str().to_owned())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
                body: truncate_body(body),
            });
        }

        tracing::debug!(endpoint = %endpoint, status = status.as_u16(), "Refresh command completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use refresh_core::credential::SecretValue;

    use super::*;

    #[tokio::test]
    async fn rejects_non_http_endpoint() {
        let endpoint = HttpRefreshEndpoint::new(
            reqwest::Client::new(),
            Url::parse(DEFAULT_AUTHORITY_HOST).unwrap(),
            DEFAULT_REFRESH_SCOPE,
        );
        let target = Url::parse("powerbi://api.powerbi.com/v1.0/myorg/ws").unwrap();
        let command = RefreshCommandDocument::parse("{}").unwrap();
        let credential = Credential::new("app", SecretValue::new("s"));

        let result = endpoint.execute(&target, &command, &credential, "t").await;
        assert_matches!(result, Err(RefreshError::UnsupportedScheme(s)) if s == "powerbi");
    }

    #[test]
    fn rejected_display() {
        let err = RefreshError::Rejected {
            status: 403,
            body: "forbidden".to_string(),
        };
        assert_eq!(err.to_string(), "Refresh rejected with HTTP 403: forbidden");
    }
}
