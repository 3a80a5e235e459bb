//! Route definitions for the refresh trigger.

use axum::routing::post;
use axum::Router;

use crate::handlers::invocations;
use crate::state::AppState;

/// Routes mounted at `/invocations`.
///
/// Requires the trigger token when one is configured (enforced by the
/// handler extractor).
///
/// ```text
/// POST   /                          -> create_invocation
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(invocations::create_invocation))
}
