//! Handlers for the refresh trigger.
//!
//! A request is validated in full before any secret is read. Accepted
//! invocations run on the shared [`TaskTracker`](tokio_util::task::TaskTracker)
//! unless the caller asks to wait for the report.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use refresh_core::request::InvocationRequest;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::trigger_token::TriggerAuth;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query parameters for [`create_invocation`].
#[derive(Debug, Default, Deserialize)]
pub struct InvokeParams {
    /// Run inline and return the report instead of `202 Accepted`.
    #[serde(default)]
    pub wait: bool,
}

/// Body of a `202 Accepted` response.
#[derive(Debug, Serialize)]
pub struct AcceptedInvocation {
    pub invocation_id: Uuid,
    pub status: &'static str,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/invocations
///
/// Validate the request, then run the refresh in the background (`202`)
/// or wait for it with `?wait=true` (`200` with the invocation report).
/// Refresh failures never change the HTTP status; they are reported to the
/// callback address.
///
/// The invocation always runs on the task tracker. If the request times out
/// while waiting, only the response is abandoned; the refresh and its
/// callback still complete.
pub async fn create_invocation(
    _auth: TriggerAuth,
    State(state): State<AppState>,
    query: Result<Query<InvokeParams>, QueryRejection>,
    body: Result<Json<InvocationRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Query(params) = query?;
    let Json(request) = body?;
    request.check(state.config.strict_commands)?;

    let invocation_id = Uuid::new_v4();
    tracing::info!(
        %invocation_id,
        workspace = %request.workspace_name,
        has_callback = request.call_back_uri.is_some(),
        wait = params.wait,
        "Invocation accepted"
    );

    let invoker = state.invoker.clone();
    let handle = state
        .tasks
        .spawn(async move { invoker.invoke(invocation_id, &request).await });

    if params.wait {
        let report = handle
            .await
            .map_err(|e| AppError::InternalError(format!("Invocation task failed: {e}")))?;
        return Ok(Json(DataResponse { data: report }).into_response());
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: AcceptedInvocation {
                invocation_id,
                status: "accepted",
            },
        }),
    )
        .into_response())
}
