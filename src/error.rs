//! Error types and handling for Plugwatch
//!
//! This module defines the error types used throughout the application,
//! providing consistent error handling and reporting.

use thiserror::Error;

/// Result type alias for Plugwatch operations
pub type Result<T> = std::result::Result<T, PlugwatchError>;

/// Main error type for Plugwatch
#[derive(Debug, Error)]
pub enum PlugwatchError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Network-related errors
    #[error("Network error: {message}")]
    Network { message: String },

    /// Vehicle or SMS gateway API errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Authentication/authorization errors
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// Timeout errors
    #[error("Timeout error: {message}")]
    Timeout { message: String },

    /// Email or SMS delivery errors
    #[error("Notification error: {message}")]
    Notification { message: String },

    /// Generic errors with context
    #[error("Error: {message}")]
    Generic { message: String },
}

impl PlugwatchError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        PlugwatchError::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        PlugwatchError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        PlugwatchError::Io {
            message: message.into(),
        }
    }

    /// Create a new serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        PlugwatchError::Serialization {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        PlugwatchError::Network {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        PlugwatchError::Api {
            message: message.into(),
        }
    }

    /// Create a new auth error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        PlugwatchError::Auth {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        PlugwatchError::Timeout {
            message: message.into(),
        }
    }

    /// Create a new notification error
    pub fn notification<S: Into<String>>(message: S) -> Self {
        PlugwatchError::Notification {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn generic<S: Into<String>>(message: S) -> Self {
        PlugwatchError::Generic {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for PlugwatchError {
    fn from(err: std::io::Error) -> Self {
        PlugwatchError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for PlugwatchError {
    fn from(err: serde_yaml::Error) -> Self {
        PlugwatchError::serialization(err.to_string())
    }
}

impl From<serde_json::Error> for PlugwatchError {
    fn from(err: serde_json::Error) -> Self {
        PlugwatchError::serialization(err.to_string())
    }
}

impl From<reqwest::Error> for PlugwatchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PlugwatchError::timeout(err.to_string())
        } else if err.is_decode() {
            PlugwatchError::serialization(err.to_string())
        } else {
            PlugwatchError::network(err.to_string())
        }
    }
}

impl From<lettre::error::Error> for PlugwatchError {
    fn from(err: lettre::error::Error) -> Self {
        PlugwatchError::notification(format!("Failed to build email: {}", err))
    }
}

impl From<lettre::address::AddressError> for PlugwatchError {
    fn from(err: lettre::address::AddressError) -> Self {
        PlugwatchError::notification(format!("Invalid email address: {}", err))
    }
}

impl From<lettre::transport::smtp::Error> for PlugwatchError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        PlugwatchError::notification(format!("SMTP error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = PlugwatchError::config("test config error");
        assert!(matches!(err, PlugwatchError::Config { .. }));

        let err = PlugwatchError::notification("smtp down");
        assert!(matches!(err, PlugwatchError::Notification { .. }));

        let err = PlugwatchError::validation("field", "test validation error");
        assert!(matches!(err, PlugwatchError::Validation { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = PlugwatchError::config("test error");
        let error_string = format!("{}", err);
        assert_eq!(error_string, "Configuration error: test error");

        let err = PlugwatchError::validation("test_field", "invalid value");
        let error_string = format!("{}", err);
        assert_eq!(error_string, "Validation error: test_field - invalid value");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: PlugwatchError = io.into();
        assert!(matches!(err, PlugwatchError::Io { .. }));
    }
}
