//! Device token registration for Beacon
//!
//! Mobile clients register the push notification token of a device here.
//! Tokens are kept one per user and platform; registering again replaces the
//! previous token.
//!
//! # API Endpoints
//!
//! - `POST /register-token` - Register or replace the token of a device
//! - `GET /health` - Liveness check
//!
//! Both are mounted under `/api` by the backend service.
//!
//! # Example
//!
//! ```rust,no_run
//! use beacon_db::{DbClient, SqlDeviceTokenRepository};
//! use beacon_tokens::routes;
//!
//! async fn setup_app() -> Result<axum::Router, beacon_db::DbError> {
//!     let db_client = DbClient::from_url("sqlite://data/beacon.db").await?;
//!     Ok(routes(SqlDeviceTokenRepository::new(db_client)))
//! }
//! ```

#[cfg(feature = "openapi")]
pub mod doc;
pub mod handlers;
pub mod routes;

pub use routes::routes;

#[cfg(feature = "openapi")]
pub mod openapi {
    pub use crate::doc::TokensApiDoc;
}
