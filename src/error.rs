//! Error types for NovAi.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for NovAi operations.
#[derive(Error, Debug)]
pub enum NovaiError {
    /// Warehouse connection errors (account unreachable, auth failed, client closed).
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement execution errors (syntax errors, missing objects, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// Completion service errors (unknown model, quota, empty response).
    #[error("Completion error: {0}")]
    Completion(String),

    /// Configuration errors (invalid config file, missing required fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal application errors (unexpected states, I/O on export, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl NovaiError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a completion error with the given message.
    pub fn completion(msg: impl Into<String>) -> Self {
        Self::Completion(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Completion(_) => "Completion Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using NovaiError.
pub type Result<T> = std::result::Result<T, NovaiError>;
