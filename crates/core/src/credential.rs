//! Service-principal credential material.
//!
//! Credentials are built fresh for every invocation and dropped at its end.
//! [`SecretValue`] never prints its contents, so a credential can be placed
//! in a `tracing` field or a `Debug` dump without leaking.

use std::fmt;

/// An opaque secret string (client secret, access token, ...).
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue(String);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the underlying value. Call sites should pass it straight to
    /// the consumer and never log it.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretValue(***)")
    }
}

impl fmt::Display for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Application identity used to authenticate the refresh call.
#[derive(Debug, Clone)]
pub struct Credential {
    /// Application (client) id of the service principal.
    pub principal_id: String,
    /// Application secret.
    pub secret: SecretValue,
}

impl Credential {
    pub fn new(principal_id: impl Into<String>, secret: SecretValue) -> Self {
        Self {
            principal_id: principal_id.into(),
            secret,
        }
    }
}
