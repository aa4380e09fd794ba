use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::services::ServiceError;
use serde::Serialize;

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: Option<T>,
    pub timestamp: i64,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self::with_message(200, "Success", data)
    }

    pub fn with_message(code: i32, message: impl Into<String>, data: T) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn error(code: i32, message: String) -> Self {
        Self {
            code,
            message,
            data: None,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

fn status_for(code: i32) -> StatusCode {
    u16::try_from(code)
        .ok()
        .and_then(|c| StatusCode::from_u16(c).ok())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

pub fn error_response(err: ServiceError) -> Response {
    if err.code >= 500 {
        tracing::error!(code = err.code, "request failed: {}", err.message);
    }

    let body = ApiResponse {
        code: err.code,
        message: err.message,
        data: err.data,
        timestamp: chrono::Utc::now().timestamp_millis(),
    };
    (status_for(body.code), Json(body)).into_response()
}

pub fn reject(code: i32, message: impl Into<String>) -> Response {
    (
        status_for(code),
        Json(ApiResponse::<()>::error(code, message.into())),
    )
        .into_response()
}

pub fn respond<T: Serialize>(result: Result<T, ServiceError>) -> Response {
    match result {
        Ok(data) => Json(ApiResponse::success(data)).into_response(),
        Err(err) => error_response(err),
    }
}

pub fn respond_created<T: Serialize>(result: Result<T, ServiceError>) -> Response {
    match result {
        Ok(data) => (
            StatusCode::CREATED,
            Json(ApiResponse::with_message(201, "Created", data)),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

/// For operations whose only payload is the message.
pub fn respond_message(result: Result<(), ServiceError>, message: &str) -> Response {
    match result {
        Ok(()) => Json(ApiResponse::with_message(200, message, ())).into_response(),
        Err(err) => error_response(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_codes_fall_back_to_500() {
        assert_eq!(status_for(409), StatusCode::CONFLICT);
        assert_eq!(status_for(-1), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status_for(1000), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn service_errors_keep_code_and_data() {
        let err = ServiceError::new(409, "Not enough seats available")
            .with_data(serde_json::json!({ "seats_left": 1 }));
        let response = error_response(err);
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
