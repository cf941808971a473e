//! Domain error to HTTP status mapping

use axum::http::StatusCode;
use axum::Json;

use super::ApiResponse;
use crate::shared::errors::DomainError;

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ApiResponse<()>>);

/// Storage failures are reported without detail; they were already logged
/// with their operation.
pub fn error_response(err: DomainError) -> ApiError {
    let status = match &err {
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Conflict(_) | DomainError::ServiceInUse(_) => StatusCode::CONFLICT,
        DomainError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        DomainError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let message = match &err {
        DomainError::Storage(_) => "internal server error".to_string(),
        other => other.to_string(),
    };

    (status, Json(ApiResponse::error(message)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_each_variant() {
        let cases = [
            (DomainError::validation("bad"), StatusCode::BAD_REQUEST),
            (DomainError::not_found("Subscription", "id", 1), StatusCode::NOT_FOUND),
            (DomainError::Conflict("dup".into()), StatusCode::CONFLICT),
            (DomainError::ServiceInUse(3), StatusCode::CONFLICT),
            (DomainError::Timeout("list"), StatusCode::GATEWAY_TIMEOUT),
            (
                DomainError::Storage("disk".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(error_response(err).0, expected);
        }
    }

    #[test]
    fn storage_detail_is_hidden() {
        let (_, Json(body)) = error_response(DomainError::Storage(
            "insert_subscription: connection refused".into(),
        ));
        assert_eq!(body.error.as_deref(), Some("internal server error"));
        assert!(!body.success);
    }
}
