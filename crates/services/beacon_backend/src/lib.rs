// --- File: crates/services/beacon_backend/src/lib.rs ---
//! Router assembly for the Beacon service.
//!
//! `main` wires the real stores into [`app`]; tests hand it their own.

use axum::{routing::get, Json, Router};
use beacon_common::IdentityResolver;
use beacon_config::AppConfig;
use beacon_db::{
    DbClient, DbError, DeviceTokenRepository, LocationPointRepository, SqlDeviceTokenRepository,
    SqlLocationPointRepository,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// The stores every route needs, backed by one shared pool.
#[derive(Debug, Clone)]
pub struct Stores {
    pub tokens: SqlDeviceTokenRepository,
    pub locations: SqlLocationPointRepository,
}

impl Stores {
    /// Connects to the configured database and creates missing tables.
    pub async fn connect(config: &AppConfig) -> Result<Self, DbError> {
        let db_client = DbClient::new(config).await?;
        info!("Connected to database: {}", db_client);

        let stores = Self {
            tokens: SqlDeviceTokenRepository::new(db_client.clone()),
            locations: SqlLocationPointRepository::new(db_client),
        };
        stores.tokens.init_schema().await?;
        stores.locations.init_schema().await?;
        Ok(stores)
    }
}

/// Service banner served at `/`.
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "message": "Beacon push token and location API",
        "status": "running",
        "endpoints": {
            "root": "GET /",
            "register_token": "POST /api/register-token",
            "health_check": "GET /api/health",
            "upload_points": "POST /points",
            "get_points": "GET /points"
        }
    }))
}

/// Builds the complete application router.
///
/// Token routes live under `/api`; location routes sit at the root.
pub fn app<T, L>(tokens: T, locations: L, resolver: Arc<dyn IdentityResolver>) -> Router
where
    T: DeviceTokenRepository + Send + Sync + 'static,
    L: LocationPointRepository + Send + Sync + 'static,
{
    #[allow(unused_mut)] // mutated only with the openapi feature
    let mut router = Router::new()
        .route("/", get(root_handler))
        .nest("/api", beacon_tokens::routes(tokens))
        .merge(beacon_location::routes(locations, resolver));

    #[cfg(feature = "openapi")]
    {
        router = router.merge(swagger_ui());
    }

    router.layer(TraceLayer::new_for_http())
}

#[cfg(feature = "openapi")]
fn swagger_ui() -> utoipa_swagger_ui::SwaggerUi {
    use beacon_location::openapi::LocationApiDoc;
    use beacon_tokens::openapi::TokensApiDoc;
    use utoipa::OpenApi;
    use utoipa_swagger_ui::SwaggerUi;

    #[derive(OpenApi)]
    #[openapi(
        info(
            title = "Beacon API",
            version = "0.1.0",
            description = "Push token registration and location tracking",
            license(name = "MIT", url = "https://opensource.org/licenses/MIT")
        ),
        tags((name = "Beacon", description = "Core service endpoints")),
    )]
    struct ApiDoc;

    // Token paths are relative to /api.
    let mut openapi_doc = ApiDoc::openapi();
    openapi_doc.merge(LocationApiDoc::openapi());
    openapi_doc = openapi_doc.nest("/api", TokensApiDoc::openapi());

    info!("Adding Swagger UI at /api/docs");
    SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc)
}
