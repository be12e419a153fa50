use axum::{
    routing::{get, post},
    Router,
};
use beacon_db::DeviceTokenRepository;
use std::sync::Arc;
use tracing::info;

use crate::handlers::{health_handler, register_token_handler, TokenState};

/// Create the token registration routes
///
/// The router carries its own state, so it can be nested into any parent
/// router.
///
/// # Arguments
///
/// * `repository` - The device token store the handlers write to
pub fn routes<R>(repository: R) -> Router
where
    R: DeviceTokenRepository + Send + Sync + 'static,
{
    info!("Token registration routes initialized");

    let state = Arc::new(TokenState { repository });

    Router::new()
        .route("/register-token", post(register_token_handler::<R>))
        .route("/health", get(health_handler))
        .with_state(state)
}
