//! SQL implementation of the device token repository

use crate::client::DbClient;
use crate::error::DbError;
use crate::repositories::device_token::DeviceTokenRepository;
use beacon_common::models::{
    DeviceTokenRecord, NewDeviceToken, Platform, RegisteredDeviceToken,
};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::any::AnyRow;
use sqlx::{Row, ValueRef};
use tracing::{debug, error, info};

/// SQL implementation of the device token repository
#[derive(Debug, Clone)]
pub struct SqlDeviceTokenRepository {
    /// The database client
    db_client: DbClient,
}

impl SqlDeviceTokenRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    async fn fetch(&self, user_id: &str, platform: Platform) -> Result<Option<DeviceTokenRecord>, DbError> {
        let query = r#"
            SELECT id, user_id, device_token, platform, device_info, created_at, updated_at
            FROM device_tokens
            WHERE user_id = $1 AND platform = $2
        "#;

        let row = sqlx::query(query)
            .bind(user_id)
            .bind(platform.as_str())
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        row.map(|row| record_from_row(&row)).transpose()
    }
}

/// Timestamps are stored as RFC 3339 text with microsecond precision.
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| DbError::DecodeError(format!("invalid stored timestamp {:?}: {}", text, e)))
}

/// The `Any` driver refuses to decode a SQLite NULL as `Option<String>`,
/// so NULL is checked on the raw value first.
fn optional_text(row: &AnyRow, column: &str) -> Result<Option<String>, DbError> {
    if row.try_get_raw(column)?.is_null() {
        return Ok(None);
    }
    Ok(Some(row.try_get(column)?))
}

fn record_from_row(row: &AnyRow) -> Result<DeviceTokenRecord, DbError> {
    let platform: String = row.try_get("platform")?;
    let device_info = optional_text(row, "device_info")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(DeviceTokenRecord {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        device_token: row.try_get("device_token")?,
        platform: platform.parse().map_err(DbError::DecodeError)?,
        device_info: device_info
            .map(|text| serde_json::from_str(&text))
            .transpose()
            .map_err(|e| DbError::DecodeError(format!("invalid stored device_info: {}", e)))?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

impl DeviceTokenRepository for SqlDeviceTokenRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing device token schema");

        let query = format!(
            r#"
            CREATE TABLE IF NOT EXISTS device_tokens (
                {},
                user_id TEXT NOT NULL,
                device_token TEXT NOT NULL,
                platform TEXT NOT NULL,
                device_info TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(user_id, platform)
            )
            "#,
            self.db_client.backend().id_column()
        );

        self.db_client.execute(&query).await?;

        info!("Device token schema initialized successfully");
        Ok(())
    }

    async fn register(&self, token: &NewDeviceToken) -> Result<RegisteredDeviceToken, DbError> {
        debug!(
            "Registering {} token for user: {}",
            token.platform, token.user_id
        );

        let device_info = token
            .device_info
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| DbError::QueryError(format!("device_info is not serializable: {}", e)))?;
        let now = format_timestamp(Utc::now());

        // created_at is only written by the insert branch
        let query = r#"
            INSERT INTO device_tokens
                (user_id, device_token, platform, device_info, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, platform) DO UPDATE SET
                device_token = excluded.device_token,
                device_info = excluded.device_info,
                updated_at = excluded.updated_at
            RETURNING id, created_at, updated_at
        "#;

        let row = sqlx::query(query)
            .bind(&token.user_id)
            .bind(&token.device_token)
            .bind(token.platform.as_str())
            .bind(device_info)
            .bind(&now)
            .bind(&now)
            .fetch_one(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to upsert device token: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        let created_at: String = row.try_get("created_at")?;
        let updated_at: String = row.try_get("updated_at")?;
        let registered = RegisteredDeviceToken {
            id: row.try_get("id")?,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        };

        info!(
            "Device token stored for user: {} (id {})",
            token.user_id, registered.id
        );
        Ok(registered)
    }

    async fn find(&self, user_id: &str, platform: Platform) -> Option<DeviceTokenRecord> {
        debug!("Finding {} token for user: {}", platform, user_id);

        match self.fetch(user_id, platform).await {
            Ok(record) => record,
            Err(e) => {
                error!("Failed to look up device token: {}", e);
                None
            }
        }
    }
}
