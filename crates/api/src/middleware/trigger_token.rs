//! Shared-token check for the invocation trigger.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use refresh_core::error::CoreError;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the shared trigger token.
pub const TRIGGER_TOKEN_HEADER: &str = "x-trigger-token";

/// Proof that the caller presented the configured trigger token.
///
/// When no `TRIGGER_TOKEN` is configured every request is accepted:
///
/// ```ignore
/// async fn my_handler(_auth: TriggerAuth) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TriggerAuth;

impl FromRequestParts<AppState> for TriggerAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = &state.config.trigger_token else {
            return Ok(TriggerAuth);
        };

        let presented = parts
            .headers
            .get(TRIGGER_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(format!(
                    "Missing {TRIGGER_TOKEN_HEADER} header"
                )))
            })?;

        if !tokens_match(presented.as_bytes(), expected.expose().as_bytes()) {
            tracing::warn!("Rejected trigger with invalid token");
            return Err(AppError::Core(CoreError::Unauthorized(
                "Invalid trigger token".into(),
            )));
        }

        Ok(TriggerAuth)
    }
}

/// Length-then-content comparison without early exit on the first
/// differing byte.
fn tokens_match(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
