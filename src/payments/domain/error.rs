//! Errors raised by payment domain values.

use thiserror::Error;

/// Errors raised while constructing payment domain values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentsDomainError {
    /// A processor reference was blank.
    #[error("{0} must not be empty")]
    EmptyReference(&'static str),

    /// A capture event lacked a metadata key its purpose needs.
    #[error("capture metadata is missing '{0}'")]
    MissingMetadata(&'static str),

    /// A capture metadata value did not parse.
    #[error("capture metadata '{key}' has invalid value '{value}'")]
    InvalidMetadata {
        /// Offending key.
        key: &'static str,
        /// Offending value.
        value: String,
    },
}
