use axum::{routing::get, Router};
use beacon_common::IdentityResolver;
use beacon_db::LocationPointRepository;
use std::sync::Arc;
use tracing::info;

use crate::handlers::{get_points_handler, upload_points_handler, LocationState};

/// Create the location point routes
///
/// # Arguments
///
/// * `repository` - The location point store
/// * `resolver` - Turns bearer credentials into the calling user
pub fn routes<R>(repository: R, resolver: Arc<dyn IdentityResolver>) -> Router
where
    R: LocationPointRepository + Send + Sync + 'static,
{
    info!("Location routes initialized");

    let state = Arc::new(LocationState {
        repository,
        resolver,
    });

    Router::new()
        .route(
            "/points",
            get(get_points_handler::<R>).post(upload_points_handler::<R>),
        )
        .with_state(state)
}
