//! Callback delivery, single attempt.
//!
//! [`WebhookCallback`] POSTs `{"StatusCode":"200"}` or
//! `{"StatusCode":"400"}` to the caller-supplied URL exactly once. The
//! response status is logged but not checked; transport failures are
//! reported to the caller of [`CallbackNotifier::notify`], which logs and
//! drops them.

use async_trait::async_trait;
use refresh_core::callback::CallbackStatus;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for callback delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    /// The HTTP request did not complete (DNS, connect, TLS, reset, ...).
    #[error("Callback request failed: {0}")]
    Request(#[from] reqwest::Error),
}

// ---------------------------------------------------------------------------
// CallbackNotifier
// ---------------------------------------------------------------------------

/// Sends the terminal status of an invocation to a callback address.
#[async_trait]
pub trait CallbackNotifier: Send + Sync {
    async fn notify(&self, url: &str, status: CallbackStatus) -> Result<(), CallbackError>;
}

// ---------------------------------------------------------------------------
// WebhookCallback
// ---------------------------------------------------------------------------

/// Delivers callback statuses over HTTP POST.
#[derive(Debug, Clone, Default)]
pub struct WebhookCallback {
    client: reqwest::Client,
}

impl WebhookCallback {
    /// Share an existing HTTP client (and its connection pool).
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CallbackNotifier for WebhookCallback {
    async fn notify(&self, url: &str, status: CallbackStatus) -> Result<(), CallbackError> {
        let response = self
            .client
            .post(url)
            .json(&status.payload())
            .send()
            .await?;

        tracing::debug!(
            url,
            status_code = status.code(),
            response_status = response.status().as_u16(),
            "Callback delivered"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
