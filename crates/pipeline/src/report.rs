//! Summary of one finished invocation.
//!
//! The report deliberately carries no error detail; that only goes to the
//! local log.

use refresh_core::callback::CallbackStatus;
use refresh_core::phase::InvocationPhase;
use refresh_core::types::Timestamp;
use serde::Serialize;
use uuid::Uuid;

/// What happened to the callback notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackDisposition {
    /// The POST completed (the receiver's answer is not inspected).
    Delivered,
    /// The POST was attempted and failed in transport; dropped.
    Undelivered,
    /// No callback address was supplied.
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvocationReport {
    pub invocation_id: Uuid,
    pub workspace_name: String,
    /// Status reported (or that would have been reported) to the caller.
    pub status: CallbackStatus,
    pub status_code: u16,
    pub callback: CallbackDisposition,
    pub phases: Vec<InvocationPhase>,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
}

impl InvocationReport {
    pub fn succeeded(&self) -> bool {
        self.status.is_success()
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
