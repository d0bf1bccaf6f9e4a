use thiserror::Error;

/// Application-wide error types.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the message of this error may be shown to the admin as-is.
    ///
    /// Storage, database and internal failures are reported with one generic
    /// message; their detail only goes to the log.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            AppError::BadRequest(_) | AppError::Auth(_) | AppError::NotFound(_)
        )
    }
}

/// Helper conversion from anyhow::Error
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_classification() {
        assert!(AppError::BadRequest("title is required".into()).is_user_facing());
        assert!(AppError::NotFound("articles/abc".into()).is_user_facing());
        assert!(!AppError::Storage("bucket unreachable".into()).is_user_facing());
        assert!(!AppError::Database("connection reset".into()).is_user_facing());
    }

    #[test]
    fn test_display_keeps_detail() {
        let err = AppError::Storage("Failed to put object 'a/b.png'".into());
        assert_eq!(err.to_string(), "Storage error: Failed to put object 'a/b.png'");
    }
}
