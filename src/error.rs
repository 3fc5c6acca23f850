//! Error types for refdata
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in refdata
#[derive(Debug, Error)]
pub enum RefdataError {
    /// Transport-level failure (timeout, DNS, connection refused)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Backend responded with a non-2xx status
    #[error("HTTP error {status} {status_text}: {body}")]
    Http {
        status: u16,
        status_text: String,
        body: String,
    },

    /// Invalid loader or registration configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Response was not the expected collection of row objects
    #[error("Shape error: {0}")]
    Shape(String),

    /// Retry budget exhausted; carries the last underlying message
    #[error("Load failed after retries: {0}")]
    Load(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RefdataError {
    /// Whether a loader should retry after this error.
    ///
    /// Transport and HTTP failures are transient; configuration and shape
    /// errors fail fast.
    pub fn is_retryable(&self) -> bool {
        match self {
            RefdataError::Network(_) => true,
            RefdataError::Http { .. } => true,
            RefdataError::Config(_) => false,
            RefdataError::Shape(_) => false,
            RefdataError::Load(_) => false,
            RefdataError::Json(_) => false,
            RefdataError::Io(_) => false,
        }
    }
}

/// Result type alias for refdata operations
pub type Result<T> = std::result::Result<T, RefdataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_display() {
        let err = RefdataError::Http {
            status: 502,
            status_text: "Bad Gateway".to_string(),
            body: "upstream down".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error 502 Bad Gateway: upstream down");
    }

    #[test]
    fn test_config_error_display() {
        let err = RefdataError::Config("id is required".to_string());
        assert_eq!(err.to_string(), "Config error: id is required");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(
            RefdataError::Http {
                status: 500,
                status_text: "Internal Server Error".to_string(),
                body: String::new(),
            }
            .is_retryable()
        );
        assert!(!RefdataError::Config("bad".to_string()).is_retryable());
        assert!(!RefdataError::Shape("not an array".to_string()).is_retryable());
        assert!(!RefdataError::Load("gave up".to_string()).is_retryable());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: RefdataError = json_err.into();
        assert!(matches!(err, RefdataError::Json(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_err() -> Result<()> {
            Err(RefdataError::Load("last message".to_string()))
        }
        assert!(returns_err().is_err());
    }
}
