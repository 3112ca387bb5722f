use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tessera_core::TesseraError;
use thiserror::Error;
use tracing::error;

/// Failure of a request, rendered as `{"error": "..."}` with a matching status.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] TesseraError),

    #[error("{0}")]
    BadRequest(String),

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("username is already taken")]
    UsernameTaken,

    #[error("there is no active theme right now")]
    NoActiveTheme,

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Core(err) => match err {
                TesseraError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
                TesseraError::CannotActForAnotherUser
                | TesseraError::NotOwner
                | TesseraError::SelfVoteForbidden => StatusCode::FORBIDDEN,
                TesseraError::DesignNotFound(_) | TesseraError::ThemeNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                TesseraError::InvalidAssetIndex { .. }
                | TesseraError::InvalidColor(_)
                | TesseraError::InvalidThemeWindow => StatusCode::BAD_REQUEST,
                TesseraError::AlreadySubmitted
                | TesseraError::AlreadyVoted
                | TesseraError::NoExistingVote
                | TesseraError::ThemeClosed(_) => StatusCode::CONFLICT,
                TesseraError::StoreOperationFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::UsernameTaken => StatusCode::CONFLICT,
            Self::NoActiveTheme => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Store failures carry internals; log them and send a generic message.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {:?}", self);
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
