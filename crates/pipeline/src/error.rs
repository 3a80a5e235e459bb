use refresh_cloud::refresh::RefreshError;
use refresh_cloud::secrets::SecretError;
use refresh_core::error::CoreError;

/// Why an invocation failed. Never propagated past
/// [`RefreshInvoker::invoke`](crate::RefreshInvoker::invoke); every variant
/// maps to a `400` callback.
#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    /// A named secret could not be read.
    #[error("Failed to resolve secret '{name}': {source}")]
    SecretResolution {
        name: String,
        #[source]
        source: SecretError,
    },

    /// The workspace name could not be rendered into an endpoint address.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(#[source] CoreError),

    /// The remote service rejected or failed the refresh command.
    #[error("Refresh execution failed: {0}")]
    RefreshExecution(#[from] RefreshError),
}

impl InvocationError {
    /// Stable label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SecretResolution { .. } => "secret_resolution",
            Self::InvalidEndpoint(_) => "invalid_endpoint",
            Self::RefreshExecution(_) => "refresh_execution",
        }
    }
}
