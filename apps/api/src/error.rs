use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use worksuite_core::AppError;

mod types;

pub use types::ErrorResponse;

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::Validation(format!(
            "malformed request body: {}",
            rejection.body_text()
        )))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(AppError::Validation(format!(
            "malformed query string: {}",
            rejection.body_text()
        )))
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Persistence(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.0.code(), error = %self.0, "request failed");
        }

        let payload = Json(ErrorResponse::new(self.0.code(), self.0.to_string()));
        (status, payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use worksuite_core::{AppError, ForbiddenReason};

    use super::ApiError;

    #[test]
    fn statuses_follow_error_category() {
        let cases = [
            (
                AppError::Validation("bad".to_owned()),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Unauthorized("who".to_owned()),
                StatusCode::UNAUTHORIZED,
            ),
            (
                AppError::forbidden(ForbiddenReason::Scope, "no"),
                StatusCode::FORBIDDEN,
            ),
            (AppError::NotFound("gone".to_owned()), StatusCode::NOT_FOUND),
            (AppError::Conflict("taken".to_owned()), StatusCode::CONFLICT),
            (
                AppError::Persistence("down".to_owned()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::Internal("oops".to_owned()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(ApiError(error).into_response().status(), expected);
        }
    }

    #[test]
    fn forbidden_payload_carries_reason_code() {
        let response =
            ApiError(AppError::forbidden(ForbiddenReason::App, "no crm")).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let payload = super::ErrorResponse::new(
            AppError::forbidden(ForbiddenReason::App, "no crm").code(),
            "no crm".to_owned(),
        );
        let value = serde_json::to_value(&payload).unwrap_or_default();
        assert_eq!(value["code"], "FORBIDDEN_APP");
        assert_eq!(value["message"], "no crm");
    }
}
