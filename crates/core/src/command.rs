//! Refresh command model.
//!
//! A refresh command is a JSON document of the shape:
//!
//! ```text
//! { "sequence": {
//!     "maxParallelism": 10,                 (optional)
//!     "operations": [
//!       { "refresh": {
//!           "type": "full",
//!           "objects": [
//!             { "database": "db", "table": "Customer", "partition": "2024" }
//!           ] } } ] } }
//! ```
//!
//! Two representations live here:
//!
//! - [`RefreshCommandDocument`] -- the raw text exactly as the caller sent
//!   it. This is what the invoker forwards to the remote endpoint, so fields
//!   this crate does not model (and `maxParallelism`) pass through untouched.
//! - [`RefreshCommand`] -- a typed view used for strict validation and for
//!   building commands programmatically.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Typed model
// ---------------------------------------------------------------------------

/// Top-level refresh command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshCommand {
    pub sequence: Sequence,
}

/// An ordered batch of operations executed by the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    /// Upper bound on parallel processing, interpreted by the remote service.
    #[serde(
        rename = "maxParallelism",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub max_parallelism: Option<i64>,
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub refresh: Refresh,
}

/// A single refresh over one or more model objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Refresh {
    #[serde(rename = "type")]
    pub refresh_type: RefreshType,
    pub objects: Vec<RefreshObject>,
}

/// Kind of refresh the remote service performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RefreshType {
    Full,
    ClearValues,
    Calculate,
    DataOnly,
    Automatic,
    Add,
    Defragment,
}

/// A database/table/partition target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshObject {
    pub database: String,
    pub table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
}

/// What part of a table a [`RefreshObject`] covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshScope<'a> {
    WholeTable,
    Partition(&'a str),
}

impl RefreshObject {
    pub fn new(database: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
            partition: None,
        }
    }

    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = Some(partition.into());
        self
    }

    /// An absent partition means the whole table is refreshed.
    pub fn scope(&self) -> RefreshScope<'_> {
        match self.partition.as_deref() {
            Some(p) => RefreshScope::Partition(p),
            None => RefreshScope::WholeTable,
        }
    }
}

impl RefreshCommand {
    /// Build a single-operation full refresh of whole tables in one database.
    pub fn full<I, S>(database: &str, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let objects = tables
            .into_iter()
            .map(|t| RefreshObject::new(database, t))
            .collect();

        Self {
            sequence: Sequence {
                max_parallelism: None,
                operations: vec![Operation {
                    refresh: Refresh {
                        refresh_type: RefreshType::Full,
                        objects,
                    },
                }],
            },
        }
    }

    pub fn with_max_parallelism(mut self, max_parallelism: i64) -> Self {
        self.sequence.max_parallelism = Some(max_parallelism);
        self
    }

    /// Total number of objects across all operations.
    pub fn object_count(&self) -> usize {
        self.sequence
            .operations
            .iter()
            .map(|op| op.refresh.objects.len())
            .sum()
    }

    /// Check the structural invariants of the command.
    ///
    /// Returns an empty `Vec` if valid; otherwise a list of human-readable
    /// errors. `maxParallelism` is deliberately not range-checked: the remote
    /// service owns its meaning.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.sequence.operations.is_empty() {
            errors.push("Sequence must include at least one operation".to_string());
        }

        for (i, op) in self.sequence.operations.iter().enumerate() {
            if op.refresh.objects.is_empty() {
                errors.push(format!("operations[{i}]: refresh must name at least one object"));
            }

            for (j, obj) in op.refresh.objects.iter().enumerate() {
                let prefix = format!("operations[{i}].objects[{j}]");

                if obj.database.trim().is_empty() {
                    errors.push(format!("{prefix}: database must not be empty"));
                }
                if obj.table.trim().is_empty() {
                    errors.push(format!("{prefix}: table must not be empty"));
                }
                if matches!(obj.partition.as_deref(), Some(p) if p.trim().is_empty()) {
                    errors.push(format!("{prefix}: partition must be omitted or non-empty"));
                }
            }
        }

        errors
    }

    /// Serialize into a document suitable for sending to the remote service.
    pub fn to_document(&self) -> Result<RefreshCommandDocument, CoreError> {
        let text = serde_json::to_string(self)
            .map_err(|e| CoreError::Internal(format!("Failed to serialize command: {e}")))?;
        Ok(RefreshCommandDocument(text))
    }
}

// ---------------------------------------------------------------------------
// Raw document
// ---------------------------------------------------------------------------

/// A refresh command in its wire form, kept byte-for-byte as received.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshCommandDocument(String);

impl RefreshCommandDocument {
    /// Wrap command text, checking only that it is a JSON object.
    pub fn parse(text: impl Into<String>) -> Result<Self, CoreError> {
        let text = text.into();
        let value: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| CoreError::Validation(format!("queryXMLA is not valid JSON: {e}")))?;
        if !value.is_object() {
            return Err(CoreError::Validation(
                "queryXMLA must be a JSON object".to_string(),
            ));
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Interpret the document as a typed [`RefreshCommand`].
    pub fn to_command(&self) -> Result<RefreshCommand, CoreError> {
        serde_json::from_str(&self.0)
            .map_err(|e| CoreError::Validation(format!("queryXMLA is not a refresh command: {e}")))
    }
}

impl fmt::Debug for RefreshCommandDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefreshCommandDocument")
            .field(&self.0)
            .finish()
    }
}

impl fmt::Display for RefreshCommandDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for RefreshCommandDocument {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Accepts either a string holding the command JSON (the documented
/// trigger form) or the command object inline.
impl<'de> Deserialize<'de> for RefreshCommandDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::String(text) => {
                RefreshCommandDocument::parse(text).map_err(de::Error::custom)
            }
            serde_json::Value::Object(_) => Ok(RefreshCommandDocument(value.to_string())),
            other => Err(de::Error::custom(format!(
                "queryXMLA must be a JSON string or object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
