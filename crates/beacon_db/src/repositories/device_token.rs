//! Repository for device tokens
//!
//! One push token per `(user_id, platform)`. Registering again for the same
//! pair replaces the token and device info and refreshes `updated_at`, while
//! `created_at` keeps the time of the first registration.

use crate::error::DbError;
use beacon_common::models::{
    DeviceTokenRecord, NewDeviceToken, Platform, RegisteredDeviceToken,
};

/// Repository for device tokens
pub trait DeviceTokenRepository {
    /// Initialize the database schema
    ///
    /// Creates the `device_tokens` table if it doesn't already exist.
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Register a device token
    ///
    /// Atomically inserts the token or, when a token is already stored for the
    /// same user and platform, updates it in place.
    ///
    /// # Returns
    ///
    /// The row id and both timestamps of the stored row
    fn register(
        &self,
        token: &NewDeviceToken,
    ) -> impl std::future::Future<Output = Result<RegisteredDeviceToken, DbError>> + Send;

    /// Find the token of a user on a platform
    ///
    /// Lookup failures are logged and reported as `None`, the same as a
    /// missing row.
    fn find(
        &self,
        user_id: &str,
        platform: Platform,
    ) -> impl std::future::Future<Output = Option<DeviceTokenRecord>> + Send;
}
