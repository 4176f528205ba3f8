//! Error types for the DDNS system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS system
#[derive(Error, Debug)]
pub enum Error {
    /// The provider refused the configured credentials at startup
    #[error("Credential validation failed: {0}")]
    CredentialInvalid(String),

    /// Connection, timeout or read failure (echo service or provider API)
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// The provider answered with a non-success status
    #[error("Provider rejected request (code {code}): {message}")]
    ProviderRejected {
        /// Provider status code
        code: String,
        /// Provider message, verbatim
        message: String,
    },

    /// A response could not be decoded into the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The resolved address is of the other family than the record type
    #[error("Address family mismatch: {0}")]
    AddressFamilyMismatch(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a credential error
    pub fn credential(msg: impl Into<String>) -> Self {
        Self::CredentialInvalid(msg.into())
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::NetworkUnavailable(msg.into())
    }

    /// Create a provider rejection
    pub fn rejected(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderRejected {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a malformed response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Create an address family mismatch error
    pub fn family_mismatch(msg: impl Into<String>) -> Self {
        Self::AddressFamilyMismatch(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the error may clear up on a later cycle
    ///
    /// Only credential and configuration errors are considered permanent.
    /// A family mismatch clears once the resolver returns the other family.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::CredentialInvalid(_) | Self::Config(_))
    }
}
