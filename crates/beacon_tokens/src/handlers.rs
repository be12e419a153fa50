//! HTTP handlers for device token registration

use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use beacon_common::{
    persistence_error, validation::validate_register_token_request, BeaconError, JsonPayload,
    SuccessBody,
};
use beacon_db::DeviceTokenRepository;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shared state for the token handlers
pub struct TokenState<R> {
    pub repository: R,
}

pub const TOKEN_REGISTERED_MESSAGE: &str = "Device token registered";
pub const SERVICE_HEALTHY_MESSAGE: &str = "Service is running normally";

/// Register or replace the push token of a device.
///
/// The `user_id` is taken from the body as given; this endpoint requires no
/// credential.
pub async fn register_token_handler<R>(
    State(state): State<Arc<TokenState<R>>>,
    JsonPayload(body): JsonPayload,
) -> Result<Json<SuccessBody>, BeaconError>
where
    R: DeviceTokenRepository + Send + Sync + 'static,
{
    let user_id = body.get("user_id").unwrap_or(&Value::Null);
    let platform = body.get("platform").unwrap_or(&Value::Null);
    info!(
        "Token registration received: user_id={}, platform={}",
        user_id, platform
    );

    let token = validate_register_token_request(&body).map_err(|e| {
        warn!("Token registration rejected: {}", e);
        e
    })?;

    let registered = state.repository.register(&token).await.map_err(|e| {
        error!("Failed to store device token: {}", e);
        persistence_error(e)
    })?;

    info!(
        "Token registered: user_id={}, platform={}, id={}",
        token.user_id, token.platform, registered.id
    );
    Ok(Json(SuccessBody::new(TOKEN_REGISTERED_MESSAGE)))
}

/// Liveness check; does not touch the database.
pub async fn health_handler() -> (StatusCode, Json<SuccessBody>) {
    (StatusCode::OK, Json(SuccessBody::new(SERVICE_HEALTHY_MESSAGE)))
}
