//! Error types for playerscope-core

use thiserror::Error;

/// Main error type for the playerscope-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Player not found
    #[error("player not found: {0}")]
    PlayerNotFound(i64),

    /// Malformed or missing request field
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A required aggregate query failed during analysis
    #[error("{stage} failed: {message}")]
    Analysis { stage: String, message: String },

    /// The connection mutex was poisoned by a panicking holder
    #[error("database connection lock poisoned")]
    LockPoisoned,
}

impl Error {
    /// Wrap a store error with the analysis stage that issued the query.
    pub fn stage(stage: &str, err: Error) -> Self {
        match err {
            Error::PlayerNotFound(_) | Error::InvalidRequest(_) | Error::Analysis { .. } => err,
            other => Error::Analysis {
                stage: stage.to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// Result type alias for playerscope-core
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_wraps_store_errors() {
        let err = Error::stage(
            "game type statistics",
            Error::Database(rusqlite::Error::InvalidQuery),
        );
        match err {
            Error::Analysis { stage, .. } => assert_eq!(stage, "game type statistics"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_stage_keeps_not_found() {
        let err = Error::stage("activity score", Error::PlayerNotFound(7));
        assert!(matches!(err, Error::PlayerNotFound(7)));
    }
}
