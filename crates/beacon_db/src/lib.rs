//! Database integration for Beacon
//!
//! This crate provides the device token store and the location point store on
//! top of a pooled, database agnostic client. SQLx's `Any` driver carries the
//! queries; SQLite and PostgreSQL are selected through feature flags and the
//! scheme of the database URL.
//!
//! # Example
//!
//! ```rust,no_run
//! use beacon_db::{DbClient, DeviceTokenRepository, SqlDeviceTokenRepository};
//!
//! async fn setup() -> Result<SqlDeviceTokenRepository, beacon_db::DbError> {
//!     let db_client = DbClient::from_url("sqlite://data/beacon.db").await?;
//!     let tokens = SqlDeviceTokenRepository::new(db_client);
//!     tokens.init_schema().await?;
//!     Ok(tokens)
//! }
//! ```

pub mod client;
pub mod error;
pub mod repositories;

pub use client::{DbBackend, DbClient, DbTransaction};
pub use error::{DbError, RowInsertFailed};
pub use repositories::{
    BatchInsertReport, DeviceTokenRepository, LocationPointRepository, SqlDeviceTokenRepository,
    SqlLocationPointRepository,
};
