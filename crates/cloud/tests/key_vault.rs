//! Integration tests for [`KeyVaultSecretProvider`] against a mock vault.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use axum::http::StatusCode;
use common::{MockServer, Route};
use refresh_cloud::identity::{AccessToken, IdentityError, TokenSource};
use refresh_cloud::secrets::{KeyVaultSecretProvider, SecretError, SecretProvider};
use refresh_core::credential::SecretValue;
use refresh_core::endpoint::EndpointTemplate;

/// Token source that hands out a fixed token.
struct StaticToken(&'static str);

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self, _resource: &str) -> Result<AccessToken, IdentityError> {
        Ok(SecretValue::new(self.0))
    }
}

/// Token source that always fails.
struct BrokenToken;

#[async_trait]
impl TokenSource for BrokenToken {
    async fn access_token(&self, _resource: &str) -> Result<AccessToken, IdentityError> {
        Err(IdentityError::Malformed("no identity".to_string()))
    }
}

fn provider(server: &MockServer, identity: Arc<dyn TokenSource>) -> KeyVaultSecretProvider {
    let template = EndpointTemplate::vault(server.url("/{vault}")).unwrap();
    KeyVaultSecretProvider::new(reqwest::Client::new(), template, identity)
}

// ---------------------------------------------------------------------------
// Test: a present secret is returned and the request is authenticated
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reads_secret_value() {
    let server = MockServer::start(vec![Route::json(
        "/kv-prod/secrets/AppId",
        StatusCode::OK,
        serde_json::json!({"value": "app-123", "id": "https://kv/secrets/AppId/1"}),
    )])
    .await;

    let secret = provider(&server, Arc::new(StaticToken("vault-token")))
        .get_secret("kv-prod", "AppId")
        .await
        .unwrap();

    assert_eq!(secret.expose(), "app-123");

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, axum::http::Method::GET);
    assert_eq!(requests[0].query.as_deref(), Some("api-version=7.4"));
    assert_eq!(
        requests[0].header("authorization"),
        Some("Bearer vault-token")
    );
}

// ---------------------------------------------------------------------------
// Test: status codes map to the secret error taxonomy
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_secret_is_not_found() {
    let server = MockServer::start(vec![]).await;

    let err = provider(&server, Arc::new(StaticToken("t")))
        .get_secret("kv", "TenantId")
        .await
        .unwrap_err();

    assert_matches!(err, SecretError::NotFound(name) if name == "TenantId");
}

#[tokio::test]
async fn forbidden_is_access_denied() {
    let server = MockServer::start(vec![Route::text(
        "/kv/secrets/AppSecret",
        StatusCode::FORBIDDEN,
        "Forbidden",
    )])
    .await;

    let err = provider(&server, Arc::new(StaticToken("t")))
        .get_secret("kv", "AppSecret")
        .await
        .unwrap_err();

    assert_matches!(err, SecretError::AccessDenied(_));
}

#[tokio::test]
async fn server_error_keeps_status_and_body() {
    let server = MockServer::start(vec![Route::text(
        "/kv/secrets/AppId",
        StatusCode::SERVICE_UNAVAILABLE,
        "throttled",
    )])
    .await;

    let err = provider(&server, Arc::new(StaticToken("t")))
        .get_secret("kv", "AppId")
        .await
        .unwrap_err();

    assert_matches!(err, SecretError::HttpStatus { status: 503, body } if body == "throttled");
}

#[tokio::test]
async fn bundle_without_value_is_malformed() {
    let server = MockServer::start(vec![Route::json(
        "/kv/secrets/AppId",
        StatusCode::OK,
        serde_json::json!({"id": "x"}),
    )])
    .await;

    let err = provider(&server, Arc::new(StaticToken("t")))
        .get_secret("kv", "AppId")
        .await
        .unwrap_err();

    assert_matches!(err, SecretError::Malformed(_));
}

// ---------------------------------------------------------------------------
// Test: identity failure surfaces before any vault request is made
// ---------------------------------------------------------------------------

#[tokio::test]
async fn identity_failure_skips_vault_call() {
    let server = MockServer::start(vec![]).await;

    let err = provider(&server, Arc::new(BrokenToken))
        .get_secret("kv", "AppId")
        .await
        .unwrap_err();

    assert_matches!(err, SecretError::Identity(_));
    assert!(server.requests().is_empty());
}
