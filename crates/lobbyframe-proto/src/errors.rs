//! Error types for payload access and event-log encoding.

use thiserror::Error;

/// Result alias for protocol-level operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while encoding or decoding recorded event logs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Event name is not part of [`crate::EventKind`].
    #[error("unknown event kind: {0}")]
    UnknownKind(String),

    /// Log exceeds the maximum accepted size.
    #[error("event log too large: {size} bytes (max {max})")]
    LogTooLarge {
        /// Actual size in bytes
        size: usize,
        /// Maximum allowed size
        max: usize,
    },

    /// CBOR serialization failed.
    #[error("CBOR encoding failed: {0}")]
    CborEncode(String),

    /// CBOR deserialization failed.
    #[error("CBOR decoding failed: {0}")]
    CborDecode(String),

    /// CBOR value has no payload representation (e.g. byte strings).
    #[error("unsupported CBOR value: {0}")]
    UnsupportedValue(&'static str),

    /// Map key is not a text string.
    #[error("payload map keys must be text")]
    NonTextKey,

    /// Integer does not fit the CBOR integer range.
    #[error("integer out of CBOR range: {0}")]
    IntegerOutOfRange(i128),

    /// A record in the log does not have the `{type, data}` shape.
    #[error("malformed record {index}: {reason}")]
    MalformedRecord {
        /// Position of the record in the log
        index: usize,
        /// What was wrong with it
        reason: &'static str,
    },
}

/// Errors raised when a payload lacks a required field or has the wrong shape.
///
/// These are the "malformed payload" diagnostics: the event carrying the
/// payload is dropped as a whole.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// Required field is absent (or explicitly null).
    #[error("missing field `{field}`")]
    MissingField {
        /// Field name
        field: &'static str,
    },

    /// Field is present but holds a different kind of value.
    #[error("field `{field}` should be {expected}")]
    WrongType {
        /// Field name
        field: &'static str,
        /// Human-readable expected type
        expected: &'static str,
    },

    /// Integer field does not fit the target type.
    #[error("field `{field}` out of range: {value}")]
    OutOfRange {
        /// Field name
        field: &'static str,
        /// Offending value
        value: i128,
    },

    /// Error inside one element of a list field.
    #[error("in `{field}[{index}]`: {source}")]
    InItem {
        /// List field name
        field: &'static str,
        /// Element index
        index: usize,
        /// Underlying error
        source: Box<PayloadError>,
    },
}

impl PayloadError {
    /// Wrap this error as occurring inside element `index` of list `field`.
    #[must_use]
    pub fn within(self, field: &'static str, index: usize) -> Self {
        Self::InItem { field, index, source: Box::new(self) }
    }

    /// Name of the outermost field involved.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingField { field }
            | Self::WrongType { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::InItem { field, .. } => field,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_error_names_outer_field() {
        let err = PayloadError::MissingField { field: "id" }.within("members", 2);
        assert_eq!(err.field(), "members");
        assert_eq!(err.to_string(), "in `members[2]`: missing field `id`");
    }
}
