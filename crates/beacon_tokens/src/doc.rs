#![allow(dead_code)]
use beacon_common::{ErrorBody, ErrorCode, SuccessBody};
use serde::Deserialize;
use serde_json::Value;
use utoipa::{OpenApi, ToSchema};

/// Request body of `POST /register-token`
///
/// The handler validates the raw JSON so every field failure is reported at
/// once; this type only describes the accepted shape.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterTokenRequest {
    /// 1 to 100 characters out of `[a-zA-Z0-9_-]`
    pub user_id: String,
    /// The push notification token of the device
    pub device_token: String,
    /// `android` or `ios`, in any letter case
    pub platform: String,
    /// Free-form description of the device
    #[schema(value_type = Option<Object>)]
    pub device_info: Option<Value>,
}

#[utoipa::path(
    post,
    path = "/register-token",
    request_body(content = RegisterTokenRequest, example = json!({
        "user_id": "user_123",
        "device_token": "fcm-registration-token-example",
        "platform": "android",
        "device_info": {"model": "Pixel 8", "os_version": "14"}
    })),
    responses(
        (status = 200, description = "Token registered", body = SuccessBody,
         example = json!({
             "status": "success",
             "message": "Device token registered"
         })
        ),
        (status = 400, description = "Bad Request", body = ErrorBody,
         example = json!({
             "status": "error",
             "message": "user_id: user_id is required; device_token: device_token is required",
             "error_code": "VALIDATION_ERROR"
         })
        ),
        (status = 500, description = "Internal Server Error", body = ErrorBody,
         example = json!({
             "status": "error",
             "message": "An internal server error occurred",
             "error_code": "INTERNAL_SERVER_ERROR"
         })
        )
    ),
    tag = "Tokens"
)]
fn doc_register_token_handler() {}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = SuccessBody,
         example = json!({
             "status": "success",
             "message": "Service is running normally"
         })
        )
    ),
    tag = "Tokens"
)]
fn doc_health_handler() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        doc_register_token_handler,
        doc_health_handler,
    ),
    components(
        schemas(
            RegisterTokenRequest,
            SuccessBody,
            ErrorBody,
            ErrorCode,
        )
    ),
    tags(
        (name = "Tokens", description = "Push notification token registration API")
    ),
    servers(
        (url = "/api", description = "Token registration API server")
    )
)]
pub struct TokensApiDoc;
