pub mod health;
pub mod invocations;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /invocations                                     trigger a refresh (POST, ?wait=true)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/invocations", invocations::router())
}
