use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Error taxonomy for the search service.
///
/// Store and directory-client failures (spec §7) are recovered entirely
/// inside their own adapters — a failed store read returns an empty/default
/// record and a failed directory call returns an empty list, logged via
/// `tracing` at the call site — so neither ever reaches this enum. Only
/// failures that prevent producing any result at all are represented here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("crawler error: {0}")]
    CrawlerError(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl Error {
    fn name(&self) -> &'static str {
        match self {
            Error::BadRequest(_) => "Bad Request",
            Error::NotFound(_) => "Not Found",
            Error::CrawlerError(_) => "Internal Server Error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::CrawlerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.name(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
