//! Workspace-scoped endpoint addresses.
//!
//! The remote service address is a fixed pattern with a `{workspace}`
//! placeholder, e.g. `https://api.powerbi.com/v1.0/myorg/{workspace}`.
//! The same type renders key vault base URLs (`{vault}` placeholder).

use url::Url;

use crate::error::CoreError;

/// Placeholder substituted with the workspace name.
pub const WORKSPACE_PLACEHOLDER: &str = "{workspace}";

/// Placeholder substituted with the key vault name.
pub const VAULT_PLACEHOLDER: &str = "{vault}";

/// Characters that would change the structure of the rendered URL.
/// `%` is included so encoded separators and dot segments cannot slip in.
const FORBIDDEN_NAME_CHARS: &[char] = &['/', '?', '#', '{', '}', '\\', '%'];

/// A URL pattern with exactly one placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTemplate {
    pattern: String,
    placeholder: &'static str,
}

impl EndpointTemplate {
    /// Template for workspace endpoints.
    pub fn workspace(pattern: impl Into<String>) -> Result<Self, CoreError> {
        Self::with_placeholder(pattern.into(), WORKSPACE_PLACEHOLDER)
    }

    /// Template for key vault base URLs.
    pub fn vault(pattern: impl Into<String>) -> Result<Self, CoreError> {
        Self::with_placeholder(pattern.into(), VAULT_PLACEHOLDER)
    }

    fn with_placeholder(pattern: String, placeholder: &'static str) -> Result<Self, CoreError> {
        let occurrences = pattern.matches(placeholder).count();
        if occurrences != 1 {
            return Err(CoreError::Validation(format!(
                "Endpoint template must contain {placeholder} exactly once: {pattern}"
            )));
        }

        // Render with a neutral sample to catch malformed patterns early.
        Url::parse(&pattern.replace(placeholder, "sample")).map_err(|e| {
            CoreError::Validation(format!("Endpoint template is not a valid URL: {e}"))
        })?;

        Ok(Self {
            pattern,
            placeholder,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Substitute `name` into the pattern and parse the result.
    ///
    /// Spaces and other non-structural characters are percent-encoded by the
    /// URL parser; characters that would alter the path, query or fragment
    /// are rejected.
    pub fn render(&self, name: &str) -> Result<Url, CoreError> {
        validate_target_name(name).map_err(CoreError::Validation)?;
        let raw = self.pattern.replace(self.placeholder, name.trim());
        Url::parse(&raw).map_err(|e| {
            CoreError::Validation(format!("Rendered endpoint '{raw}' is not a valid URL: {e}"))
        })
    }
}

/// Check a workspace or vault name before it is templated into a URL.
pub fn validate_target_name(name: &str) -> Result<(), String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("name must not be empty".to_string());
    }
    // The URL parser would resolve these against the template path.
    if trimmed == "." || trimmed == ".." {
        return Err(format!("name must not be the path segment '{trimmed}'"));
    }
    if let Some(c) = trimmed
        .chars()
        .find(|c| c.is_control() || FORBIDDEN_NAME_CHARS.contains(c))
    {
        return Err(format!("name contains forbidden character {c:?}"));
    }
    Ok(())
}
