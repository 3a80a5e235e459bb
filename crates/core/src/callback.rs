//! Callback status reported to the orchestrator.
//!
//! The mapping from an invocation result to a status is a pure function
//! ([`CallbackStatus::from_result`]) so it can be decided before, and
//! independently of, the notification transport.

use serde::{Deserialize, Serialize};

/// Terminal status of one invocation as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackStatus {
    /// Refresh completed (`200`).
    Succeeded,
    /// Any step failed (`400`).
    Failed,
}

impl CallbackStatus {
    pub fn from_result<T, E>(result: &Result<T, E>) -> Self {
        match result {
            Ok(_) => Self::Succeeded,
            Err(_) => Self::Failed,
        }
    }

    pub fn code(self) -> u16 {
        match self {
            Self::Succeeded => 200,
            Self::Failed => 400,
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Succeeded
    }

    /// Body POSTed to the callback address.
    pub fn payload(self) -> CallbackPayload {
        CallbackPayload {
            status_code: self.code().to_string(),
        }
    }
}

/// Wire body of a callback: `{"StatusCode":"200"}` or `{"StatusCode":"400"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackPayload {
    #[serde(rename = "StatusCode")]
    pub status_code: String,
}
