//! Invocation request accepted at the trigger boundary.

use serde::{Deserialize, Serialize};
use url::Url;
use validator::Validate;

use crate::command::RefreshCommandDocument;
use crate::endpoint::validate_target_name;
use crate::error::CoreError;

/// Maximum accepted workspace name length.
pub const MAX_WORKSPACE_NAME_LEN: u64 = 256;

/// One refresh request from the orchestrator.
///
/// Field names follow the orchestrator's JSON body (`workspaceName`,
/// `queryXMLA`, `callBackUri`). Immutable for the life of one invocation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InvocationRequest {
    #[serde(rename = "workspaceName")]
    #[validate(length(min = 1, max = MAX_WORKSPACE_NAME_LEN))]
    pub workspace_name: String,

    #[serde(rename = "queryXMLA")]
    pub query_xmla: RefreshCommandDocument,

    #[serde(
        rename = "callBackUri",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    #[validate(url)]
    pub call_back_uri: Option<String>,
}

impl InvocationRequest {
    pub fn new(workspace_name: impl Into<String>, query_xmla: RefreshCommandDocument) -> Self {
        Self {
            workspace_name: workspace_name.into(),
            query_xmla,
            call_back_uri: None,
        }
    }

    pub fn with_callback(mut self, url: impl Into<String>) -> Self {
        self.call_back_uri = Some(url.into());
        self
    }

    /// Validate the request before any external call is made.
    ///
    /// With `strict` set, the command must also parse as a typed
    /// [`RefreshCommand`](crate::command::RefreshCommand) and satisfy its
    /// invariants. Otherwise the command is left for the remote service to
    /// judge.
    pub fn check(&self, strict: bool) -> Result<(), CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;

        validate_target_name(&self.workspace_name)
            .map_err(|e| CoreError::Validation(format!("workspaceName: {e}")))?;

        if let Some(uri) = &self.call_back_uri {
            let parsed = Url::parse(uri)
                .map_err(|e| CoreError::Validation(format!("callBackUri: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(CoreError::Validation(format!(
                    "callBackUri: unsupported scheme '{}'",
                    parsed.scheme()
                )));
            }
        }

        if strict {
            let command = self.query_xmla.to_command()?;
            let errors = command.validate();
            if !errors.is_empty() {
                return Err(CoreError::Validation(format!(
                    "queryXMLA: {}",
                    errors.join("; ")
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn body(extra: serde_json::Value) -> serde_json::Value {
        let mut base = serde_json::json!({
            "workspaceName": "adventureworks",
            "queryXMLA": r#"{"sequence":{"operations":[{"refresh":{"type":"full","objects":[{"database":"adventureworks","table":"Customer"}]}}]}}"#,
        });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        base
    }

    #[test]
    fn deserializes_trigger_body() {
        let req: InvocationRequest =
            serde_json::from_value(body(serde_json::json!({"callBackUri": "https://adf.example/cb"})))
                .unwrap();
        assert_eq!(req.workspace_name, "adventureworks");
        assert_eq!(req.call_back_uri.as_deref(), Some("https://adf.example/cb"));
        assert!(req.check(true).is_ok());
    }

    #[test]
    fn callback_is_optional() {
        let req: InvocationRequest = serde_json::from_value(body(serde_json::json!({}))).unwrap();
        assert!(req.call_back_uri.is_none());
        assert!(req.check(false).is_ok());
    }

    #[test]
    fn missing_command_fails_to_deserialize() {
        let result = serde_json::from_value::<InvocationRequest>(
            serde_json::json!({"workspaceName": "x"}),
        );
        assert!(result.is_err());
    }

    #[test]
    fn blank_workspace_rejected() {
        let mut req: InvocationRequest =
            serde_json::from_value(body(serde_json::json!({}))).unwrap();
        req.workspace_name = "  ".to_string();
        assert_matches!(req.check(false), Err(CoreError::Validation(msg)) if msg.contains("workspaceName"));

        req.workspace_name = String::new();
        assert_matches!(req.check(false), Err(CoreError::Validation(_)));
    }

    #[test]
    fn overlong_workspace_rejected() {
        let mut req: InvocationRequest =
            serde_json::from_value(body(serde_json::json!({}))).unwrap();
        req.workspace_name = "w".repeat(MAX_WORKSPACE_NAME_LEN as usize + 1);
        assert!(req.check(false).is_err());
    }

    #[test]
    fn malformed_callback_rejected() {
        let req: InvocationRequest =
            serde_json::from_value(body(serde_json::json!({"callBackUri": "not a url"}))).unwrap();
        assert_matches!(req.check(false), Err(CoreError::Validation(_)));
    }

    #[test]
    fn non_http_callback_rejected() {
        let req: InvocationRequest =
            serde_json::from_value(body(serde_json::json!({"callBackUri": "ftp://adf.example/cb"})))
                .unwrap();
        assert_matches!(req.check(false), Err(CoreError::Validation(msg)) if msg.contains("scheme"));
    }

    #[test]
    fn strict_mode_checks_command_shape() {
        let req: InvocationRequest = serde_json::from_value(body(serde_json::json!({
            "queryXMLA": r#"{"sequence":{"operations":[{"refresh":{"type":"full","objects":[]}}]}}"#
        })))
        .unwrap();
        assert!(req.check(false).is_ok());
        assert_matches!(req.check(true), Err(CoreError::Validation(msg)) if msg.contains("at least one object"));
    }

    #[test]
    fn builder_helpers() {
        let doc = RefreshCommandDocument::parse("{}").unwrap();
        let req = InvocationRequest::new("ws", doc).with_callback("https://cb");
        assert_eq!(req.call_back_uri.as_deref(), Some("https://cb"));
    }
}
