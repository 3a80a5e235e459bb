//! Refresh invocation orchestration.
//!
//! [`RefreshInvoker::invoke`] runs one invocation end to end: resolve the
//! service principal from the secret store, render the workspace endpoint,
//! execute the refresh command, and report `200`/`400` to the callback
//! address. It never returns an error; failures are logged and reduced to
//! a callback status.

pub mod error;
pub mod invoker;
pub mod report;

pub use error::InvocationError;
pub use invoker::{InvokerSettings, RefreshInvoker, SecretNames};
pub use report::{CallbackDisposition, InvocationReport};
