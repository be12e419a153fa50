// --- File: crates/beacon_common/src/http.rs ---
use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

use crate::error::{BeaconError, ErrorCode, HttpStatusCode};

/// Body of every error response.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Always `"error"`
    pub status: &'static str,
    pub message: String,
    pub error_code: ErrorCode,
}

/// Body of plain success responses.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize)]
pub struct SuccessBody {
    /// Always `"success"`
    pub status: &'static str,
    pub message: String,
}

impl SuccessBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: message.into(),
        }
    }
}

impl From<&BeaconError> for ErrorBody {
    fn from(err: &BeaconError) -> Self {
        Self {
            status: "error",
            message: err.public_message(),
            error_code: err.error_code(),
        }
    }
}

impl IntoResponse for BeaconError {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status_code.is_server_error() {
            error!("Request failed: {}", self);
        }

        (status_code, Json(ErrorBody::from(&self))).into_response()
    }
}

/// A request body that must be JSON.
///
/// Any rejection by axum's JSON extractor, whether a wrong content type or a
/// syntax error, is reported as `400 INVALID_FORMAT`. Take it as
/// `Result<JsonPayload, BeaconError>` to decide in the handler when that
/// rejection is surfaced.
#[derive(Debug, Clone)]
pub struct JsonPayload(pub Value);

impl<S> FromRequest<S> for JsonPayload
where
    S: Send + Sync,
{
    type Rejection = BeaconError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<Value>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                warn!("Request body is not JSON: {}", rejection.body_text());
                Err(BeaconError::InvalidFormat)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FieldError, ValidationError};
    use axum::body::{to_bytes, Body};
    use axum::http::Request as HttpRequest;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_error_shape() {
        let err = BeaconError::from(ValidationError::single(FieldError::new(
            "latitude is required",
            ErrorCode::LatitudeRequired,
        )));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({
                "status": "error",
                "message": "latitude is required",
                "error_code": "LATITUDE_REQUIRED"
            })
        );
    }

    #[tokio::test]
    async fn unauthorized_shape() {
        let response = BeaconError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error_code"], "UNAUTHORIZED");
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn non_json_body_is_invalid_format() {
        let request = HttpRequest::builder()
            .method("POST")
            .header("content-type", "text/plain")
            .body(Body::from("hello"))
            .unwrap();
        let result = JsonPayload::from_request(request, &()).await;
        assert!(matches!(result, Err(BeaconError::InvalidFormat)));

        let request = HttpRequest::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let result = JsonPayload::from_request(request, &()).await;
        assert!(matches!(result, Err(BeaconError::InvalidFormat)));
    }
}
