//! The refresh invoker.
//!
//! One call to [`RefreshInvoker::invoke`] is a linear sequence of awaited
//! remote calls: three secret reads, one refresh, at most one callback.
//! The invoker holds only immutable, shared collaborators, so any number
//! of invocations can run concurrently without coordination.

use std::sync::Arc;

use chrono::Utc;
use refresh_cloud::refresh::RefreshEndpoint;
use refresh_cloud::secrets::SecretProvider;
use refresh_core::callback::CallbackStatus;
use refresh_core::credential::{Credential, SecretValue};
use refresh_core::endpoint::EndpointTemplate;
use refresh_core::phase::{InvocationPhase, PhaseTracker};
use refresh_core::request::InvocationRequest;
use refresh_events::CallbackNotifier;
use uuid::Uuid;

use crate::error::InvocationError;
use crate::report::{CallbackDisposition, InvocationReport};

/// Names under which the service principal is stored in the vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretNames {
    pub application_id: String,
    pub application_secret: String,
    pub tenant_id: String,
}

impl Default for SecretNames {
    fn default() -> Self {
        Self {
            application_id: "AppId".to_string(),
            application_secret: "AppSecret".to_string(),
            tenant_id: "TenantId".to_string(),
        }
    }
}

/// Static settings shared by every invocation.
#[derive(Debug, Clone)]
pub struct InvokerSettings {
    /// Vault holding the service principal secrets.
    pub vault_name: String,
    pub secret_names: SecretNames,
    /// Workspace endpoint pattern (`{workspace}` placeholder).
    pub endpoint_template: EndpointTemplate,
}

/// Runs refresh invocations against injected collaborators.
pub struct RefreshInvoker {
    secrets: Arc<dyn SecretProvider>,
    endpoint: Arc<dyn RefreshEndpoint>,
    notifier: Arc<dyn CallbackNotifier>,
    settings: InvokerSettings,
}

impl RefreshInvoker {
    pub fn new(
        secrets: Arc<dyn SecretProvider>,
        endpoint: Arc<dyn RefreshEndpoint>,
        notifier: Arc<dyn CallbackNotifier>,
        settings: InvokerSettings,
    ) -> Self {
        Self {
            secrets,
            endpoint,
            notifier,
            settings,
        }
    }

    /// Run one invocation to completion.
    ///
    /// Never fails: every error is logged here and reduced to a `400`
    /// callback (when a callback address was given). At most one callback
    /// is sent.
    #[tracing::instrument(
        name = "invocation",
        skip_all,
        fields(invocation_id = %invocation_id, workspace = %request.workspace_name)
    )]
    pub async fn invoke(&self, invocation_id: Uuid, request: &InvocationRequest) -> InvocationReport {
        let started_at = Utc::now();
        let mut phases = PhaseTracker::new();

        let result = self.execute(request, &mut phases).await;
        let status = CallbackStatus::from_result(&result);

        match &result {
            Ok(()) => {
                tracing::info!("Refresh completed successfully");
                record(&mut phases, InvocationPhase::Succeeded);
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    kind = e.kind(),
                    phase = phases.current().as_str(),
                    "Refresh failed"
                );
                record(&mut phases, InvocationPhase::Failed);
            }
        }

        let callback = self.report_status(request, status, &mut phases).await;

        let report = InvocationReport {
            invocation_id,
            workspace_name: request.workspace_name.clone(),
            status,
            status_code: status.code(),
            callback,
            phases: phases.into_history(),
            started_at,
            finished_at: Utc::now(),
        };

        tracing::info!(
            status_code = report.status_code,
            callback = ?report.callback,
            duration_ms = report.duration_ms(),
            "Invocation finished"
        );
        report
    }

    async fn execute(
        &self,
        request: &InvocationRequest,
        phases: &mut PhaseTracker,
    ) -> Result<(), InvocationError> {
        record(phases, InvocationPhase::ResolvingCredentials);

        let names = &self.settings.secret_names;
        let application_id = self.resolve_secret(&names.application_id).await?;
        let application_secret = self.resolve_secret(&names.application_secret).await?;
        let tenant_id = self.resolve_secret(&names.tenant_id).await?;

        let endpoint = self
            .settings
            .endpoint_template
            .render(&request.workspace_name)
            .map_err(InvocationError::InvalidEndpoint)?;

        let credential = Credential::new(application_id.into_inner(), application_secret);

        record(phases, InvocationPhase::Invoking);
        tracing::debug!(
            endpoint = %endpoint,
            principal_id = %credential.principal_id,
            "Executing refresh command"
        );

        self.endpoint
            .execute(&endpoint, &request.query_xmla, &credential, tenant_id.expose())
            .await?;
        Ok(())
    }

    async fn resolve_secret(&self, name: &str) -> Result<SecretValue, InvocationError> {
        self.secrets
            .get_secret(&self.settings.vault_name, name)
            .await
            .map_err(|source| InvocationError::SecretResolution {
                name: name.to_string(),
                source,
            })
    }

    /// Send the single callback, if an address was supplied.
    async fn report_status(
        &self,
        request: &InvocationRequest,
        status: CallbackStatus,
        phases: &mut PhaseTracker,
    ) -> CallbackDisposition {
        let Some(url) = request.call_back_uri.as_deref() else {
            record(phases, InvocationPhase::CallbackSkipped);
            tracing::debug!("No callback address, skipping notification");
            return CallbackDisposition::Skipped;
        };

        record(phases, InvocationPhase::CallbackSent);
        match self.notifier.notify(url, status).await {
            Ok(()) => CallbackDisposition::Delivered,
            Err(e) => {
                // Fire-and-forget: no retry.
                tracing::warn!(error = %e, url, "Callback delivery failed");
                CallbackDisposition::Undelivered
            }
        }
    }
}

fn record(phases: &mut PhaseTracker, next: InvocationPhase) {
    if let Err(e) = phases.advance(next) {
        tracing::error!(error = %e, "Invocation phase bookkeeping out of order");
    }
}
