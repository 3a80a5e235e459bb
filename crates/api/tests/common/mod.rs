#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;
use url::Url;

use refresh_api::config::{InvokerConfig, SecretSource, ServerConfig};
use refresh_api::router::build_app_router;
use refresh_api::state::AppState;
use refresh_cloud::refresh::{RefreshEndpoint, RefreshError, DEFAULT_AUTHORITY_HOST};
use refresh_cloud::secrets::{SecretError, SecretProvider};
use refresh_core::callback::CallbackStatus;
use refresh_core::command::RefreshCommandDocument;
use refresh_core::credential::{Credential, SecretValue};
use refresh_core::endpoint::EndpointTemplate;
use refresh_events::{CallbackError, CallbackNotifier};
use refresh_pipeline::{InvokerSettings, RefreshInvoker, SecretNames};

pub const ADVENTUREWORKS: &str = r#"{"sequence":{"operations":[{"refresh":{"type":"full","objects":[{"database":"adventureworks","table":"Customer"}]}}]}}"#;

pub const TEST_TOKEN: &str = "trigger-s3cret";

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeSecrets {
    values: HashMap<String, String>,
    pub reads: Mutex<Vec<String>>,
}

impl FakeSecrets {
    pub fn complete() -> Self {
        let values = [("AppId", "app-123"), ("AppSecret", "s3cret"), ("TenantId", "tenant-9")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            values,
            ..Default::default()
        }
    }

    pub fn read_count(&self) -> usize {
        self.reads.lock().unwrap().len()
    }
}

#[async_trait]
impl SecretProvider for FakeSecrets {
    async fn get_secret(
        &self,
        _vault_name: &str,
        secret_name: &str,
    ) -> Result<SecretValue, SecretError> {
        self.reads.lock().unwrap().push(secret_name.to_string());
        self.values
            .get(secret_name)
            .map(|v| SecretValue::new(v.clone()))
            .ok_or_else(|| SecretError::NotFound(secret_name.to_string()))
    }
}

#[derive(Default)]
pub struct FakeEndpoint {
    pub fail: bool,
    /// How long each refresh takes before it answers.
    pub delay: Option<Duration>,
    pub calls: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl RefreshEndpoint for FakeEndpoint {
    async fn execute(
        &self,
        endpoint: &Url,
        command: &RefreshCommandDocument,
        _credential: &Credential,
        _tenant_id: &str,
    ) -> Result<(), RefreshError> {
        self.calls
            .lock()
            .unwrap()
            .push((endpoint.to_string(), command.as_str().to_string()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(RefreshError::Rejected {
                status: 500,
                body: "model unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeNotifier {
    pub sent: Mutex<Vec<(String, CallbackStatus)>>,
}

#[async_trait]
impl CallbackNotifier for FakeNotifier {
    async fn notify(&self, url: &str, status: CallbackStatus) -> Result<(), CallbackError> {
        self.sent.lock().unwrap().push((url.to_string(), status));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        trigger_token: None,
        strict_commands: false,
        invoker: InvokerConfig {
            secret_source: SecretSource::Env {
                prefix: "REFRESH_TEST_".to_string(),
            },
            secret_names: SecretNames::default(),
            endpoint_template: EndpointTemplate::workspace(
                "https://api.powerbi.com/v1.0/myorg/{workspace}",
            )
            .unwrap(),
            authority_host: Url::parse(DEFAULT_AUTHORITY_HOST).unwrap(),
            refresh_scope: "https://analysis.windows.net/powerbi/api/.default".to_string(),
        },
    }
}

/// A router wired to in-memory collaborators, plus handles to inspect them.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub secrets: Arc<FakeSecrets>,
    pub endpoint: Arc<FakeEndpoint>,
    pub notifier: Arc<FakeNotifier>,
}

impl TestApp {
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    /// Wait for every background invocation to finish.
    pub async fn drain(&self) {
        self.state.tasks.close();
        self.state.tasks.wait().await;
    }
}

pub fn build_test_app() -> TestApp {
    build_test_app_with(test_config(), FakeEndpoint::default())
}

/// Build the full application router (same middleware stack as `main.rs`).
pub fn build_test_app_with(config: ServerConfig, endpoint: FakeEndpoint) -> TestApp {
    let secrets = Arc::new(FakeSecrets::complete());
    let endpoint = Arc::new(endpoint);
    let notifier = Arc::new(FakeNotifier::default());

    let settings = InvokerSettings {
        vault_name: config.invoker.vault_name().to_string(),
        secret_names: config.invoker.secret_names.clone(),
        endpoint_template: config.invoker.endpoint_template.clone(),
    };
    let invoker = Arc::new(RefreshInvoker::new(
        secrets.clone(),
        endpoint.clone(),
        notifier.clone(),
        settings,
    ));

    let state = AppState::new(Arc::new(config.clone()), invoker);
    let router = build_app_router(state.clone(), &config);

    TestApp {
        router,
        state,
        secrets,
        endpoint,
        notifier,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    post_raw(app, uri, body.to_string(), &[]).await
}

pub async fn post_raw(
    app: Router,
    uri: &str,
    body: String,
    headers: &[(&str, &str)],
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    app.oneshot(builder.body(Body::from(body)).unwrap())
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn trigger_body(callback: Option<&str>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "workspaceName": "adventureworks",
        "queryXMLA": ADVENTUREWORKS,
    });
    if let Some(url) = callback {
        body["callBackUri"] = serde_json::Value::String(url.to_string());
    }
    body
}
