//! Error types for the protocol layer.
//!
//! Everything that can go wrong while turning wire JSON into records (or
//! records into wire JSON) lands in [`ProtocolError`]. The variants follow
//! the shape of the failure, from coarse to fine:
//!
//! - the envelope itself is not what the endpoint returns ([`Decode`]),
//! - a field carries a type tag outside the catalog ([`UnknownFieldType`]),
//! - a field's value does not fit its tag ([`InvalidFieldValue`]).
//!
//! [`Decode`]: ProtocolError::Decode
//! [`UnknownFieldType`]: ProtocolError::UnknownFieldType
//! [`InvalidFieldValue`]: ProtocolError::InvalidFieldValue

use crate::FieldType;

/// Errors that can occur in the protocol layer.
///
/// None of these are fatal: the caller decides whether to retry, skip the
/// response, or abort. A decode either yields every record it was given or
/// one of these errors, never a partial result.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into a request body).
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// The outer JSON does not match the expected envelope.
    ///
    /// Common causes: truncated bodies, a missing `record`/`records` key,
    /// or an auxiliary payload (comment, cursor, process) with the wrong
    /// shape.
    #[error("invalid JSON format: {0}")]
    Decode(#[source] serde_json::Error),

    /// A field map entry carries a `type` tag that is not in the catalog.
    #[error("unknown field type {tag:?} for field {field:?}")]
    UnknownFieldType { field: String, tag: String },

    /// A field's `value` does not have the shape its `type` requires.
    ///
    /// `value` is the raw JSON exactly as it arrived, so the offending
    /// payload shows up in logs.
    #[error("invalid {field_type} value for field {field:?}: {reason} (got {value})")]
    InvalidFieldValue {
        field: String,
        field_type: FieldType,
        value: serde_json::Value,
        reason: String,
    },

    /// The message parsed but violates a protocol rule, e.g. an
    /// update-by-key request whose key field is missing from the record.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

impl ProtocolError {
    /// Builds an [`InvalidFieldValue`](Self::InvalidFieldValue) error.
    pub(crate) fn invalid_value(
        field: &str,
        field_type: FieldType,
        value: &serde_json::Value,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidFieldValue {
            field: field.to_string(),
            field_type,
            value: value.clone(),
            reason: reason.into(),
        }
    }
}
