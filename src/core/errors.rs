use http::StatusCode;
use spin_sdk::http::Response;
use thiserror::Error;

/// Failures raised by the auth and post services.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Username is already taken")]
    UsernameTaken,

    /// Same message for an unknown user and a wrong password.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("{0}")]
    NotFound(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// HTTP-facing error: a status code and the message shown to the client.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden,
    NotFound(String),
    Conflict(String),
    InternalError,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => msg,
            ApiError::Forbidden => "Forbidden",
            ApiError::InternalError => "Internal server error",
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status(), self.message())
    }
}

impl std::error::Error for ApiError {}

impl From<BoardError> for ApiError {
    fn from(err: BoardError) -> Self {
        match err {
            BoardError::UsernameTaken => ApiError::Conflict(err.to_string()),
            BoardError::InvalidCredentials | BoardError::Unauthenticated => {
                ApiError::Unauthorized(err.to_string())
            }
            BoardError::NotFound(msg) => ApiError::NotFound(msg),
            BoardError::Forbidden => ApiError::Forbidden,
            BoardError::Validation(msg) => ApiError::BadRequest(msg),
            BoardError::Internal(e) => {
                tracing::error!(error = ?e, "internal failure");
                ApiError::InternalError
            }
        }
    }
}

impl From<ApiError> for Response {
    fn from(err: ApiError) -> Self {
        let body = serde_json::to_vec(&serde_json::json!({ "error": err.message() }))
            .unwrap_or_default();
        Response::builder()
            .status(err.status().as_u16())
            .header("Content-Type", "application/json")
            .body(body)
            .build()
    }
}

impl From<BoardError> for Response {
    fn from(err: BoardError) -> Self {
        ApiError::from(err).into()
    }
}
