use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use playerscope_core::types::PlayerId;

use super::envelope::Envelope;

/// API-layer error type
#[derive(Debug)]
pub enum ApiError {
    /// 400 - Path id is not a positive integer
    InvalidPlayerId(String),

    /// 400 - Malformed body or unsupported option
    InvalidRequest(String),

    /// 404 - No such player
    PlayerNotFound(PlayerId),

    /// 500 - An aggregate query failed mid-analysis
    Analysis(String),

    /// 500 - Any other store failure
    Database(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidPlayerId(_) => "INVALID_PLAYER_ID",
            ApiError::InvalidRequest(_) => "INVALID_REQUEST",
            ApiError::PlayerNotFound(_) => "PLAYER_NOT_FOUND",
            ApiError::Analysis(_) => "ANALYSIS_ERROR",
            ApiError::Database(_) => "DATABASE_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidPlayerId(_) | ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PlayerNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Analysis(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::InvalidPlayerId(raw) => format!("Invalid player id: {}", raw),
            ApiError::InvalidRequest(msg) => format!("Invalid request: {}", msg),
            ApiError::PlayerNotFound(id) => format!("Player {} not found", id),
            ApiError::Analysis(msg) => format!("Analysis failed: {}", msg),
            ApiError::Database(msg) => format!("Database error: {}", msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self.message(), "Request failed");
        }
        let body = Envelope::error(self.code(), self.message());
        (status, Json(body)).into_response()
    }
}

// Convert core errors to API errors
impl From<playerscope_core::Error> for ApiError {
    fn from(err: playerscope_core::Error) -> Self {
        use playerscope_core::Error;
        match err {
            Error::PlayerNotFound(id) => ApiError::PlayerNotFound(id),
            Error::InvalidRequest(msg) => ApiError::InvalidRequest(msg),
            e @ Error::Analysis { .. } => ApiError::Analysis(e.to_string()),
            other => ApiError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_mapping() {
        let err = ApiError::from(playerscope_core::Error::PlayerNotFound(9));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "PLAYER_NOT_FOUND");

        let err = ApiError::from(playerscope_core::Error::Analysis {
            stage: "risk score".into(),
            message: "boom".into(),
        });
        assert_eq!(err.code(), "ANALYSIS_ERROR");

        let err = ApiError::from(playerscope_core::Error::LockPoisoned);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "DATABASE_ERROR");
    }
}
