//! Outbound notifications.
//!
//! - [`delivery::callback`] -- the single status POST sent to the
//!   orchestrator's callback address at the end of an invocation.

pub mod delivery;

pub use delivery::callback::{CallbackError, CallbackNotifier, WebhookCallback};
