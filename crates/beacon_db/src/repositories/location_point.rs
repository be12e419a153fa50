//! Repository for location points
//!
//! Points are append-only. A batch upload is written in one transaction in
//! which every row may fail on its own without taking the others down; only
//! failing to open or commit the transaction fails the whole batch.

use crate::error::{DbError, RowInsertFailed};
use beacon_common::models::{LocationPoint, NewLocationPoint};
use chrono::{DateTime, Utc};

/// Outcome of a committed batch insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchInsertReport {
    pub saved_count: usize,
    pub total_count: usize,
    /// Rows the store refused, in submission order
    pub failed_rows: Vec<RowInsertFailed>,
}

impl BatchInsertReport {
    pub fn is_complete(&self) -> bool {
        self.saved_count == self.total_count
    }
}

/// Repository for location points
pub trait LocationPointRepository {
    /// Initialize the database schema
    ///
    /// Creates the `app_locations` table and its `(user_id, timestamp)` index
    /// if they don't already exist.
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Insert a batch of points for one user
    ///
    /// # Errors
    ///
    /// [`DbError::TransactionAborted`] when the batch transaction cannot be
    /// opened or committed. Individual rows that fail are listed in the
    /// report instead.
    fn insert_batch(
        &self,
        user_id: &str,
        points: &[NewLocationPoint],
    ) -> impl std::future::Future<Output = Result<BatchInsertReport, DbError>> + Send;

    /// All points of a user with `start <= timestamp < end`, oldest first
    fn query_range(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Vec<LocationPoint>, DbError>> + Send;
}
