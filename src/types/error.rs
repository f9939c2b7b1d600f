//! Error types for Cadence

use hyper::StatusCode;

/// Main error type for Cadence operations
#[derive(Debug, thiserror::Error)]
pub enum CadenceError {
    #[error("{0}")]
    Validation(String),

    #[error("Habit already tracked for today")]
    AlreadyTracked,

    #[error("{0}")]
    Unauthorized(String),

    /// Valid identity, wrong owner. Reported to clients as 401, matching
    /// the conflation the HTTP surface has always had.
    #[error("Not authorized")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("Too many requests from this IP, please try again after an hour")]
    RateLimited,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("{0}")]
    Http(String),
}

impl CadenceError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::AlreadyTracked | Self::Http(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) | Self::Forbidden | Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Database(_) | Self::Internal(_) | Self::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to return to clients. Server-side failures collapse to
    /// a generic message so internal detail never leaves the process.
    pub fn public_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) | Self::Config(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Whether this is a storage-layer uniqueness violation. MongoDB
    /// reports these as E11000 duplicate key errors inside the message.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(
            self,
            Self::Database(msg) if msg.contains("duplicate key") || msg.contains("E11000")
        )
    }
}

// Implement From conversions for common error types

impl From<std::io::Error> for CadenceError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for CadenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Http(format!("Invalid JSON: {}", err))
    }
}

impl From<hyper::Error> for CadenceError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<mongodb::error::Error> for CadenceError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for CadenceError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Unauthorized(format!("JWT error: {}", err))
    }
}

/// Result type alias for Cadence operations
pub type Result<T> = std::result::Result<T, CadenceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            CadenceError::Validation("Title is required".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CadenceError::AlreadyTracked.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CadenceError::Forbidden.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            CadenceError::NotFound("Habit not found".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            CadenceError::RateLimited.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            CadenceError::Database("ugly driver detail".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_public_message_hides_internal_detail() {
        let err = CadenceError::Database("connection pool exhausted at 10.0.0.3".into());
        assert_eq!(err.public_message(), "Internal server error");

        let err = CadenceError::AlreadyTracked;
        assert_eq!(err.public_message(), "Habit already tracked for today");
    }

    #[test]
    fn test_duplicate_key_detection() {
        let dup = CadenceError::Database(
            "Insert failed: E11000 duplicate key error collection: cadence.tracking_logs".into(),
        );
        assert!(dup.is_duplicate_key());

        let other = CadenceError::Database("Insert failed: network timeout".into());
        assert!(!other.is_duplicate_key());

        // Only storage errors count, even if the text matches
        let not_db = CadenceError::Internal("duplicate key".into());
        assert!(!not_db.is_duplicate_key());
    }
}
