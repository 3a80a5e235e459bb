use std::sync::Arc;

use refresh_cloud::{
    EnvSecretProvider, HttpRefreshEndpoint, KeyVaultSecretProvider, ManagedIdentityTokenSource,
    SecretProvider,
};
use refresh_events::WebhookCallback;
use refresh_pipeline::{InvokerSettings, RefreshInvoker};
use tokio_util::task::TaskTracker;

use crate::config::{SecretSource, ServerConfig};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (trigger token, strict command validation).
    pub config: Arc<ServerConfig>,
    /// Refresh invoker shared by every invocation.
    pub invoker: Arc<RefreshInvoker>,
    /// Background invocations still running; awaited on shutdown.
    pub tasks: TaskTracker,
}

impl AppState {
    pub fn new(config: Arc<ServerConfig>, invoker: Arc<RefreshInvoker>) -> Self {
        Self {
            config,
            invoker,
            tasks: TaskTracker::new(),
        }
    }

    /// Wire the production collaborators from configuration.
    ///
    /// One pooled HTTP client is shared by the identity, secret, refresh
    /// and callback clients.
    pub fn from_config(config: ServerConfig) -> Self {
        let client = reqwest::Client::new();
        let invoker_config = &config.invoker;

        let secrets: Arc<dyn SecretProvider> = match &invoker_config.secret_source {
            SecretSource::KeyVault { url_template, .. } => {
                let identity = Arc::new(ManagedIdentityTokenSource::from_env(client.clone()));
                Arc::new(KeyVaultSecretProvider::new(
                    client.clone(),
                    url_template.clone(),
                    identity,
                ))
            }
            SecretSource::Env { prefix } => Arc::new(EnvSecretProvider::new(prefix.clone())),
        };

        let endpoint = Arc::new(HttpRefreshEndpoint::new(
            client.clone(),
            invoker_config.authority_host.clone(),
            invoker_config.refresh_scope.clone(),
        ));
        let notifier = Arc::new(WebhookCallback::new(client));

        let settings = InvokerSettings {
            vault_name: invoker_config.vault_name().to_string(),
            secret_names: invoker_config.secret_names.clone(),
            endpoint_template: invoker_config.endpoint_template.clone(),
        };

        let invoker = Arc::new(RefreshInvoker::new(secrets, endpoint, notifier, settings));
        Self::new(Arc::new(config), invoker)
    }

    /// Number of background invocations still running.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }
}
