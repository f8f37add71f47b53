use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("Invalid book data")]
    InvalidBookData,

    /// Unknown book id on update or delete.
    #[error("Not Found")]
    BookNotFound,

    #[error("Not Found")]
    RouteNotFound,

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Too Many Requests")]
    RateLimited {
        limit: u32,
        window: Duration,
        retry_after: Duration,
    },
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidBookData => StatusCode::BAD_REQUEST,
            ApiError::BookNotFound | ApiError::RouteNotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: &str) -> Self {
        Self {
            error: error.to_string(),
            message: None,
        }
    }

    pub fn from_api_error(err: &ApiError) -> Self {
        match err {
            ApiError::RateLimited { limit, window, .. } => Self {
                error: err.to_string(),
                message: Some(format!(
                    "{} per {}",
                    limit,
                    humantime_serde::re::humantime::format_duration(*window)
                )),
            },
            _ => Self::new(&err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut resp = (self.status_code(), Json(ErrorResponse::from_api_error(&self))).into_response();

        if let ApiError::RateLimited {
            limit, retry_after, ..
        } = self
        {
            let headers = resp.headers_mut();
            headers.insert("x-ratelimit-limit", HeaderValue::from(limit));
            headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
            // Round up so clients never retry a moment too early.
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            headers.insert("retry-after", HeaderValue::from(secs.max(1)));
        }

        resp
    }
}
