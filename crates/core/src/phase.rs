//! Per-invocation lifecycle.
//!
//! ```text
//! Start -> ResolvingCredentials -> Invoking -> Succeeded -+-> CallbackSent
//!                    |                  |                 |
//!                    +------------------+---> Failed -----+-> CallbackSkipped
//! ```
//!
//! Nothing is retained across invocations; a [`PhaseTracker`] lives for the
//! duration of one `invoke` call.

use serde::Serialize;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationPhase {
    Start,
    ResolvingCredentials,
    Invoking,
    Succeeded,
    Failed,
    CallbackSent,
    CallbackSkipped,
}

impl InvocationPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::ResolvingCredentials => "resolving_credentials",
            Self::Invoking => "invoking",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::CallbackSent => "callback_sent",
            Self::CallbackSkipped => "callback_skipped",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::CallbackSent | Self::CallbackSkipped)
    }

    pub fn can_transition_to(self, next: InvocationPhase) -> bool {
        use InvocationPhase::*;
        matches!(
            (self, next),
            (Start, ResolvingCredentials)
                | (ResolvingCredentials, Invoking)
                | (ResolvingCredentials, Failed)
                | (Invoking, Succeeded)
                | (Invoking, Failed)
                | (Succeeded, CallbackSent)
                | (Succeeded, CallbackSkipped)
                | (Failed, CallbackSent)
                | (Failed, CallbackSkipped)
        )
    }
}

/// Records the phases one invocation passes through, rejecting illegal
/// transitions.
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    history: Vec<InvocationPhase>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self {
            history: vec![InvocationPhase::Start],
        }
    }

    pub fn current(&self) -> InvocationPhase {
        // `history` is never empty: it starts with `Start` and only grows.
        self.history
            .last()
            .copied()
            .unwrap_or(InvocationPhase::Start)
    }

    pub fn advance(&mut self, next: InvocationPhase) -> Result<(), CoreError> {
        let current = self.current();
        if !current.can_transition_to(next) {
            return Err(CoreError::Internal(format!(
                "Illegal invocation transition {} -> {}",
                current.as_str(),
                next.as_str()
            )));
        }
        self.history.push(next);
        Ok(())
    }

    pub fn history(&self) -> &[InvocationPhase] {
        &self.history
    }

    pub fn into_history(self) -> Vec<InvocationPhase> {
        self.history
    }
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}
