//! External delivery channels for invocation outcomes.

pub mod callback;
