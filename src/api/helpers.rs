//! JSON response envelope shared by every API handler.

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Serialize;

use crate::errors::QrGenError;

#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    /// 0 on success, otherwise the numeric error code.
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub fn json_response<T: Serialize>(
    status: StatusCode,
    code: i32,
    message: impl Into<String>,
    data: Option<T>,
) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code,
            message: message.into(),
            data,
        })
}

pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::OK, 0, "OK", Some(data))
}

/// Map a domain error to its HTTP status and envelope.
pub fn error_response(err: &QrGenError) -> HttpResponse {
    json_response::<()>(err.http_status(), err.code_number(), err.message(), None)
}

/// Unified Result -> HttpResponse conversion for handlers.
pub fn api_result<T: Serialize>(result: crate::errors::Result<T>) -> HttpResponse {
    match result {
        Ok(data) => success_response(data),
        Err(e) => error_response(&e),
    }
}
