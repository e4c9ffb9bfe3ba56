use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

use crate::models::Id;

/// Failure talking to, or decoding from, the remote table.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("transport: {0}")] Transport(String),
    #[error("decode: {0}")] Decode(String),
    #[error("conflict: table changed since last read")] Conflict,
}

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("question text must not be empty")] EmptyText,
    #[error("question {0} not found")] NotFound(Id),
    #[error("action not available on this dashboard")] WrongDashboard,
    #[error("unknown status {0:?}; expected pending, asked or deleted")] InvalidStatus(String),
    #[error("no question id left above the current maximum")] IdsExhausted,
    #[error("question {0} cannot take more votes")] VoteLimit(Id),
    #[error(transparent)] Store(#[from] StoreError),
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: String,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("not found")] NotFound,
    #[error("bad request: {0}")] BadRequest(String),
    #[error("forbidden: {0}")] Forbidden(String),
    #[error("conflict")] Conflict,
    #[error("store unavailable: {0}")] Upstream(String),
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        let msg = e.to_string();
        match e {
            SessionError::EmptyText | SessionError::InvalidStatus(_) => ApiError::BadRequest(msg),
            SessionError::IdsExhausted | SessionError::VoteLimit(_) => ApiError::BadRequest(msg),
            SessionError::NotFound(_) => ApiError::NotFound,
            SessionError::WrongDashboard => ApiError::Forbidden(msg),
            SessionError::Store(StoreError::Conflict) => ApiError::Conflict,
            SessionError::Store(inner) => ApiError::Upstream(inner.to_string()),
        }
    }
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        use actix_web::http::StatusCode;
        let status = match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };
        HttpResponse::build(status).json(ApiErrorBody { error: self.to_string() })
    }
}
