//! SQL implementation of the location point repository

use crate::client::DbClient;
use crate::error::{DbError, RowInsertFailed};
use crate::repositories::location_point::{BatchInsertReport, LocationPointRepository};
use beacon_common::models::{LocationPoint, NewLocationPoint};
use chrono::{DateTime, Utc};
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error, info, warn};

const INSERT_POINT: &str = r#"
    INSERT INTO app_locations (user_id, latitude, longitude, timestamp)
    VALUES ($1, $2, $3, $4)
"#;

/// SQL implementation of the location point repository
///
/// `timestamp` is stored as microseconds since the Unix epoch.
#[derive(Debug, Clone)]
pub struct SqlLocationPointRepository {
    db_client: DbClient,
}

impl SqlLocationPointRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

/// `timestamp` is read back as text; the `Any` driver narrows SQLite
/// integers to 32 bits.
fn point_from_row(row: &AnyRow) -> Result<LocationPoint, DbError> {
    let text: String = row.try_get("timestamp_micros")?;
    let micros: i64 = text
        .trim()
        .parse()
        .map_err(|e| DbError::DecodeError(format!("invalid stored timestamp {:?}: {}", text, e)))?;
    let timestamp = DateTime::<Utc>::from_timestamp_micros(micros)
        .ok_or_else(|| DbError::DecodeError(format!("timestamp out of range: {}", micros)))?;

    Ok(LocationPoint {
        user_id: row.try_get("user_id")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        timestamp,
    })
}

impl LocationPointRepository for SqlLocationPointRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing location point schema");

        let table = format!(
            r#"
            CREATE TABLE IF NOT EXISTS app_locations (
                {},
                user_id TEXT NOT NULL,
                latitude DOUBLE PRECISION NOT NULL CHECK (latitude BETWEEN -90 AND 90),
                longitude DOUBLE PRECISION NOT NULL CHECK (longitude BETWEEN -180 AND 180),
                timestamp BIGINT NOT NULL
            )
            "#,
            self.db_client.backend().id_column()
        );
        self.db_client.execute(&table).await?;

        self.db_client
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_app_locations_user_time \
                 ON app_locations (user_id, timestamp)",
            )
            .await?;

        info!("Location point schema initialized successfully");
        Ok(())
    }

    async fn insert_batch(
        &self,
        user_id: &str,
        points: &[NewLocationPoint],
    ) -> Result<BatchInsertReport, DbError> {
        debug!("Inserting {} points for user: {}", points.len(), user_id);

        let mut tx = self.db_client.begin().await.map_err(|e| {
            error!("Failed to open batch transaction: {}", e);
            e
        })?;

        let mut report = BatchInsertReport {
            total_count: points.len(),
            ..Default::default()
        };

        for (index, point) in points.iter().enumerate() {
            // A failed statement inside a PostgreSQL transaction poisons it;
            // the savepoint confines the damage to this row.
            let mut savepoint = sqlx::Connection::begin(&mut *tx)
                .await
                .map_err(|e| DbError::TransactionAborted(e.to_string()))?;

            let result = sqlx::query(INSERT_POINT)
                .bind(user_id)
                .bind(point.latitude)
                .bind(point.longitude)
                .bind(point.parsed_timestamp.timestamp_micros())
                .execute(&mut *savepoint)
                .await;

            match result {
                Ok(_) => {
                    savepoint
                        .commit()
                        .await
                        .map_err(|e| DbError::TransactionAborted(e.to_string()))?;
                    report.saved_count += 1;
                }
                Err(e) => {
                    warn!("Skipping point {} for user {}: {}", index, user_id, e);
                    savepoint
                        .rollback()
                        .await
                        .map_err(|e| DbError::TransactionAborted(e.to_string()))?;
                    report.failed_rows.push(RowInsertFailed {
                        index,
                        reason: e.to_string(),
                    });
                }
            }
        }

        // Dropping an uncommitted transaction rolls it back.
        tx.commit().await.map_err(|e| {
            error!("Failed to commit batch for user {}: {}", user_id, e);
            DbError::TransactionAborted(e.to_string())
        })?;

        info!(
            "Saved {}/{} points for user: {}",
            report.saved_count, report.total_count, user_id
        );
        Ok(report)
    }

    async fn query_range(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<LocationPoint>, DbError> {
        debug!(
            "Querying points for user: {} in [{}, {})",
            user_id, start, end
        );

        let query = r#"
            SELECT user_id, latitude, longitude, CAST(timestamp AS TEXT) AS timestamp_micros
            FROM app_locations
            WHERE user_id = $1 AND timestamp >= $2 AND timestamp < $3
            ORDER BY timestamp ASC
        "#;

        let rows = sqlx::query(query)
            .bind(user_id)
            .bind(start.timestamp_micros())
            .bind(end.timestamp_micros())
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to query points: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        rows.iter().map(point_from_row).collect()
    }
}
