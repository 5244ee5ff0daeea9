use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use jobclock_common::api::ApiError;

/// Authentication failures carry a machine-readable code so the client
/// can tell a deleted account apart from an unverified one.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing authorization token")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Account no longer exists")]
    UserDeleted,

    #[error("Account is not verified")]
    UserNotVerified,

    #[error("No account found for this employee code")]
    UserNotFound,

    #[error("Invalid password")]
    InvalidPassword,
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "MISSING_TOKEN",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::UserDeleted => "USER_DELETED",
            AuthError::UserNotVerified => "USER_NOT_VERIFIED",
            AuthError::UserNotFound => "USER_NOT_FOUND",
            AuthError::InvalidPassword => "INVALID_PASSWORD",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::UserNotVerified => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    #[error("Database error: {0}")]
    DatabaseError(&'static str),

    #[error("Bad request: {0}")]
    BadRequest(&'static str),

    #[error("Not found: {0}")]
    NotFound(&'static str),

    #[error("Incorrect input: {0}")]
    Validation(&'static str),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Unexpected error: {0}")]
    UnexpectedError(&'static str),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Validation(_) => StatusCode::BAD_REQUEST,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Conflict(_) => StatusCode::CONFLICT,
            ServerError::Auth(e) => e.status_code(),
            ServerError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ServerError::NotFound(v) => v.to_string(),
            ServerError::Validation(v) => v.to_string(),
            ServerError::BadRequest(v) => v.to_string(),
            ServerError::Conflict(v) => v.clone(),
            ServerError::Auth(e) => e.to_string(),
            // Upstream ERP failures keep the upstream message so the
            // client can show what the ERP reported.
            ServerError::Upstream(v) => v.clone(),
            ServerError::UnexpectedError(_) | ServerError::DatabaseError(_) => {
                "An unexpected error occured. Please try again later".into()
            }
        }
    }

    pub fn code(&self) -> Option<&'static str> {
        match self {
            ServerError::Auth(e) => Some(e.code()),
            _ => None,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        (
            status,
            Json(ApiError {
                success: false,
                error: self.message(),
                code: self.code().map(|c| c.to_string()),
            }),
        )
            .into_response()
    }
}
