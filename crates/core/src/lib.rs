//! Domain types for the tabular refresh invoker.
//!
//! Everything in this crate is pure (no network or filesystem access) so it
//! can be shared by the collaborator clients, the invoker and the HTTP
//! trigger without pulling in any runtime.

pub mod callback;
pub mod command;
pub mod credential;
pub mod endpoint;
pub mod error;
pub mod phase;
pub mod request;
pub mod types;
