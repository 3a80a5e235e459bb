//! Clients for the external services the invoker consumes.
//!
//! - [`secrets`] -- credential lookup ([`SecretProvider`]) backed by a key
//!   vault or, for local development, environment variables.
//! - [`identity`] -- bearer token acquisition for managed identities and
//!   service principals.
//! - [`refresh`] -- the remote tabular-model refresh endpoint
//!   ([`RefreshEndpoint`]).
//!
//! All traits are object-safe so the invoker can hold them as
//! `Arc<dyn ...>` and tests can substitute in-memory fakes.

pub mod identity;
pub mod refresh;
pub mod secrets;

pub use identity::{AccessToken, IdentityError, ManagedIdentityTokenSource, TokenSource};
pub use refresh::{HttpRefreshEndpoint, RefreshEndpoint, RefreshError};
pub use secrets::{EnvSecretProvider, KeyVaultSecretProvider, SecretError, SecretProvider};
