// --- File: crates/beacon_common/src/models.rs ---

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Push notification platform of a device.
///
/// Parsed case-insensitively; always stored and displayed lower-cased.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Android, Platform::Ios];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            other => Err(format!("unknown platform: {}", other)),
        }
    }
}

/// A validated token registration, ready for the device token store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDeviceToken {
    pub user_id: String,
    pub device_token: String,
    pub platform: Platform,
    /// Free-form JSON object; `None` when the client sent none.
    pub device_info: Option<Value>,
}

/// A stored device token, one per `(user_id, platform)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceTokenRecord {
    pub id: i64,
    pub user_id: String,
    pub device_token: String,
    pub platform: Platform,
    pub device_info: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What the store reports back after an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisteredDeviceToken {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated location point with its timestamp already parsed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewLocationPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub parsed_timestamp: DateTime<Utc>,
}

/// A stored location point.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationPoint {
    pub user_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_parses_case_insensitively() {
        assert_eq!("IOS".parse::<Platform>(), Ok(Platform::Ios));
        assert_eq!("Android".parse::<Platform>(), Ok(Platform::Android));
        assert!("windows".parse::<Platform>().is_err());
        assert_eq!(Platform::Ios.to_string(), "ios");
    }
}
