use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use thiserror::Error;
use tracing::{debug, error};

use warbler_db::DbError;
use warbler_types::api::ErrorResponse;

use crate::{flash, found};

pub const UNAUTHORIZED_NOTICE: &str = "Access unauthorized.";

#[derive(Debug, Error)]
pub enum ApiError {
    /// No usable session, or the session does not own the target.
    #[error("{}", UNAUTHORIZED_NOTICE)]
    Unauthorized,

    #[error("Invalid credentials.")]
    InvalidCredentials,

    #[error("Not found.")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Conflict { field } => Self::Conflict(taken(&field)),
            DbError::Invalid(detail) => {
                debug!("Rejected write: {}", detail);
                Self::BadRequest("Invalid input.".into())
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Unauthorized => {
                let jar = flash::push(CookieJar::new(), UNAUTHORIZED_NOTICE);
                return (jar, found("/")).into_response();
            }
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(detail) => {
                error!("Request failed: {}", detail);
                let body = ErrorResponse {
                    error: "Something went wrong.".into(),
                };
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// "username" -> "Username already taken"
fn taken(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => format!("{}{} already taken", first.to_uppercase(), chars.as_str()),
        None => "Already taken".into(),
    }
}
