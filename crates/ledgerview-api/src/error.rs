//! Error types for ledgerview-api

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ledgerview_core::error::{CoreError, ErrorCode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Upstream fetch failed: {message}")]
    Upstream { message: String },

    #[error("Internal server error")]
    InternalError,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            ApiError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        let message = error.to_string();
        match error.code() {
            ErrorCode::EmployeeNotFound | ErrorCode::TransactionNotFound => ApiError::NotFound { resource: message },
            ErrorCode::InvalidPageToken | ErrorCode::ValidationError => ApiError::BadRequest { message },
            ErrorCode::FetchFailed => ApiError::Upstream { message },
            _ => {
                log::error!("Unhandled core error: {}", message);
                ApiError::InternalError
            }
        }
    }
}

/// Errors render as a small HTML fragment so HTMX targets show them inline
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        log::warn!("{} {}", status.as_u16(), self);
        let body = format!(
            "<div class='p-3 rounded-lg bg-red-50 text-red-700 text-sm'>{}</div>",
            ledgerview_utils::escape_html(&self.to_string())
        );
        (status, axum::response::Html(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_mapping() {
        let not_found: ApiError = CoreError::EmployeeNotFound { id: "9".to_string() }.into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let bad: ApiError = CoreError::InvalidPageToken { token: "x".to_string() }.into();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let upstream: ApiError = CoreError::fetch_failed("employees", "timeout").into();
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);

        let internal: ApiError = CoreError::IoError.into();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_error_body_is_escaped() {
        let response = ApiError::BadRequest { message: "<b>".to_string() }.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("&lt;b&gt;"));
        assert!(!body.contains("<b>"));
    }
}
