//! Location tracking for Beacon
//!
//! Authenticated users upload batches of GPS points and read them back by
//! time range. Every request must carry an `Authorization: Bearer <token>`
//! header; the points are always filed under the user the token resolves to.
//!
//! # API Endpoints
//!
//! - `POST /points` - Upload up to 1000 points at once
//! - `GET /points?start_time=..&end_time=..` - Points in `[start_time, end_time)`, oldest first

#[cfg(feature = "openapi")]
pub mod doc;
pub mod handlers;
pub mod routes;

pub use routes::routes;

#[cfg(feature = "openapi")]
pub mod openapi {
    pub use crate::doc::LocationApiDoc;
}
