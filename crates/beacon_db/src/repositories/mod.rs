//! Repository modules for database access
//!
//! Each store is a trait plus its SQL implementation on top of [`crate::DbClient`].
//! Handlers depend on the traits only, so tests can substitute their own stores.

pub mod device_token;
pub mod device_token_sql;
pub mod location_point;
pub mod location_point_sql;

pub use device_token::DeviceTokenRepository;
pub use device_token_sql::SqlDeviceTokenRepository;
pub use location_point::{BatchInsertReport, LocationPointRepository};
pub use location_point_sql::SqlLocationPointRepository;
