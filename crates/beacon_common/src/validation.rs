//! Request validation.
//!
//! Every validator works on untyped JSON input and is free of side effects.
//! Single-field validators return one [`FieldError`]; request-level validators
//! return a [`ValidationError`] carrying every failure they collected.
//!
//! Request-level validators do not all aggregate the same way:
//!
//! - [`validate_register_token_request`] and [`validate_point`] run all of
//!   their field checks and report every failure under `VALIDATION_ERROR`.
//! - [`validate_points_get_request`] also collects everything, but a lone
//!   failure keeps its own code.
//! - [`validate_points_upload_request`] stops at the first bad point and
//!   reports the code that point's validation produced.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde_json::Value;

use crate::error::{ErrorCode, FieldError, ValidationError};
use crate::models::{NewDeviceToken, NewLocationPoint, Platform};

pub const USER_ID_MAX_LEN: usize = 100;
pub const MAX_POINTS_PER_UPLOAD: usize = 1000;
pub const MAX_QUERY_SPAN_DAYS: i64 = 30;

pub const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);
pub const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);

/// Absent, `null`, `false`, zero, `""`, `[]` and `{}` all count as "not given".
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
    }
}

pub fn validate_user_id(value: Option<&Value>) -> Result<&str, FieldError> {
    if is_blank(value) {
        return Err(FieldError::generic("user_id is required"));
    }
    let user_id = value
        .and_then(Value::as_str)
        .ok_or_else(|| FieldError::generic("user_id must be a string"))?;

    let len = user_id.chars().count();
    if !(1..=USER_ID_MAX_LEN).contains(&len) {
        return Err(FieldError::generic(format!(
            "user_id must be between 1 and {} characters",
            USER_ID_MAX_LEN
        )));
    }
    if !user_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(FieldError::generic(
            "user_id may only contain letters, digits, underscores and hyphens",
        ));
    }
    Ok(user_id)
}

pub fn validate_device_token(value: Option<&Value>) -> Result<&str, FieldError> {
    if is_blank(value) {
        return Err(FieldError::generic("device_token is required"));
    }
    let token = value
        .and_then(Value::as_str)
        .ok_or_else(|| FieldError::generic("device_token must be a string"))?;
    if token.trim().is_empty() {
        return Err(FieldError::generic("device_token must not be blank"));
    }
    Ok(token)
}

pub fn validate_platform(value: Option<&Value>) -> Result<Platform, FieldError> {
    if is_blank(value) {
        return Err(FieldError::generic("platform is required"));
    }
    let platform = value
        .and_then(Value::as_str)
        .ok_or_else(|| FieldError::generic("platform must be a string"))?;
    platform.parse::<Platform>().map_err(|_| {
        let allowed: Vec<&str> = Platform::ALL.iter().map(Platform::as_str).collect();
        FieldError::generic(format!("platform must be one of {:?}", allowed))
    })
}

/// `None` and `null` are a valid absent value.
pub fn validate_device_info(value: Option<&Value>) -> Result<Option<Value>, FieldError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(info @ Value::Object(_)) => serde_json::to_string(info)
            .map(|_| Some(info.clone()))
            .map_err(|_| FieldError::generic("device_info must be valid JSON")),
        Some(_) => Err(FieldError::generic("device_info must be a JSON object")),
    }
}

/// Validates a token registration body, reporting every bad field at once.
pub fn validate_register_token_request(data: &Value) -> Result<NewDeviceToken, ValidationError> {
    let user_id = validate_user_id(data.get("user_id")).map_err(|e| e.prefixed("user_id"));
    let device_token =
        validate_device_token(data.get("device_token")).map_err(|e| e.prefixed("device_token"));
    let platform = validate_platform(data.get("platform")).map_err(|e| e.prefixed("platform"));
    let device_info =
        validate_device_info(data.get("device_info")).map_err(|e| e.prefixed("device_info"));

    match (user_id, device_token, platform, device_info) {
        (Ok(user_id), Ok(device_token), Ok(platform), Ok(device_info)) => Ok(NewDeviceToken {
            user_id: user_id.to_string(),
            device_token: device_token.to_string(),
            platform,
            device_info,
        }),
        (user_id, device_token, platform, device_info) => {
            let errors = [
                user_id.err(),
                device_token.err(),
                platform.err(),
                device_info.err(),
            ]
            .into_iter()
            .flatten()
            .collect();
            Err(ValidationError::aggregate(errors))
        }
    }
}

fn validate_coordinate(
    value: Option<&Value>,
    name: &str,
    (min, max): (f64, f64),
    codes: [ErrorCode; 3],
) -> Result<f64, FieldError> {
    let [required, invalid_type, out_of_range] = codes;
    let value = match value {
        None | Some(Value::Null) => {
            return Err(FieldError::new(format!("{} is required", name), required))
        }
        Some(v) => v,
    };
    let number = value
        .as_f64()
        .ok_or_else(|| FieldError::new(format!("{} must be a number", name), invalid_type))?;
    if !(min..=max).contains(&number) {
        return Err(FieldError::new(
            format!("{} must be between {} and {}", name, min, max),
            out_of_range,
        ));
    }
    Ok(number)
}

pub fn validate_latitude(value: Option<&Value>) -> Result<f64, FieldError> {
    validate_coordinate(
        value,
        "latitude",
        LATITUDE_RANGE,
        [
            ErrorCode::LatitudeRequired,
            ErrorCode::LatitudeInvalidType,
            ErrorCode::LatitudeOutOfRange,
        ],
    )
}

pub fn validate_longitude(value: Option<&Value>) -> Result<f64, FieldError> {
    validate_coordinate(
        value,
        "longitude",
        LONGITUDE_RANGE,
        [
            ErrorCode::LongitudeRequired,
            ErrorCode::LongitudeInvalidType,
            ErrorCode::LongitudeOutOfRange,
        ],
    )
}

/// Parses an ISO-8601 date-time.
///
/// Accepts optional fractional seconds and an optional `Z` or `±hh:mm` /
/// `±hhmm` offset. A value without offset is taken to be UTC.
pub fn parse_iso8601(input: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    const OFFSET_FORMATS: [&str; 3] = [
        "%Y-%m-%dT%H:%M:%S%.f%z",
        "%Y-%m-%dT%H:%M:%S%z",
        "%Y-%m-%dT%H:%M%z",
    ];
    if let Some(dt) = OFFSET_FORMATS
        .iter()
        .find_map(|f| DateTime::parse_from_str(input, f).ok())
    {
        return Some(dt.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
    ];
    NAIVE_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(input, f).ok())
        .map(|naive| naive.and_utc())
}

fn validate_timestamp_str(input: &str) -> Result<DateTime<Utc>, FieldError> {
    if input.is_empty() {
        return Err(FieldError::new(
            "timestamp is required",
            ErrorCode::TimestampRequired,
        ));
    }
    parse_iso8601(input).ok_or_else(|| {
        FieldError::new(
            "timestamp must be an ISO-8601 date-time",
            ErrorCode::TimestampInvalidFormat,
        )
    })
}

pub fn validate_timestamp(value: Option<&Value>) -> Result<DateTime<Utc>, FieldError> {
    if is_blank(value) {
        return Err(FieldError::new(
            "timestamp is required",
            ErrorCode::TimestampRequired,
        ));
    }
    let input = value.and_then(Value::as_str).ok_or_else(|| {
        FieldError::new(
            "timestamp must be a string",
            ErrorCode::TimestampInvalidType,
        )
    })?;
    validate_timestamp_str(input)
}

/// Validates one point, reporting every bad field at once.
///
/// On success the parsed timestamp travels forward in the returned
/// [`NewLocationPoint`] so the store never re-parses it.
pub fn validate_point(point: &Value) -> Result<NewLocationPoint, ValidationError> {
    if !point.is_object() {
        return Err(ValidationError::single(FieldError::new(
            "point must be a JSON object",
            ErrorCode::PointInvalidType,
        )));
    }

    let latitude = validate_latitude(point.get("latitude")).map_err(|e| e.prefixed("latitude"));
    let longitude =
        validate_longitude(point.get("longitude")).map_err(|e| e.prefixed("longitude"));
    let timestamp =
        validate_timestamp(point.get("timestamp")).map_err(|e| e.prefixed("timestamp"));

    match (latitude, longitude, timestamp) {
        (Ok(latitude), Ok(longitude), Ok(parsed_timestamp)) => Ok(NewLocationPoint {
            latitude,
            longitude,
            parsed_timestamp,
        }),
        (latitude, longitude, timestamp) => {
            let errors = [latitude.err(), longitude.err(), timestamp.err()]
                .into_iter()
                .flatten()
                .collect();
            Err(ValidationError::aggregate(errors))
        }
    }
}

/// Validates an upload body, stopping at the first bad point.
pub fn validate_points_upload_request(
    data: &Value,
) -> Result<Vec<NewLocationPoint>, ValidationError> {
    if !data.is_object() {
        return Err(FieldError::new(
            "request body must be a JSON object",
            ErrorCode::RequestInvalidType,
        )
        .into());
    }

    let points = data.get("points");
    let points = match points {
        Some(Value::Array(items)) => items,
        other if is_blank(other) => {
            return Err(FieldError::new("points is required", ErrorCode::PointsRequired).into())
        }
        _ => {
            return Err(
                FieldError::new("points must be an array", ErrorCode::PointsInvalidType).into(),
            )
        }
    };

    if points.is_empty() {
        return Err(FieldError::new("points must not be empty", ErrorCode::PointsEmpty).into());
    }
    if points.len() > MAX_POINTS_PER_UPLOAD {
        return Err(FieldError::new(
            format!(
                "at most {} points may be uploaded at once",
                MAX_POINTS_PER_UPLOAD
            ),
            ErrorCode::PointsTooMany,
        )
        .into());
    }

    points
        .iter()
        .enumerate()
        .map(|(i, point)| {
            validate_point(point).map_err(|e| {
                ValidationError::single(FieldError::new(
                    format!("points[{}]: {}", i, e.message()),
                    e.code,
                ))
            })
        })
        .collect()
}

/// Validates the `start_time`/`end_time` pair of a range query.
///
/// Both values are checked independently. Only when both parse are the
/// ordering (`start < end`) and the maximum span of 30 days checked.
pub fn validate_points_get_request(
    start_str: &str,
    end_str: &str,
) -> Result<(DateTime<Utc>, DateTime<Utc>), ValidationError> {
    let start = validate_timestamp_str(start_str).map_err(|e| e.prefixed("start_time"));
    let end = validate_timestamp_str(end_str).map_err(|e| e.prefixed("end_time"));

    let mut errors = Vec::new();
    match (start, end) {
        (Ok(start), Ok(end)) => {
            if start >= end {
                errors.push(FieldError::generic(
                    "start_time must be earlier than end_time",
                ));
            }
            if end - start > Duration::days(MAX_QUERY_SPAN_DAYS) {
                errors.push(FieldError::generic(format!(
                    "the range between start_time and end_time must not exceed {} days",
                    MAX_QUERY_SPAN_DAYS
                )));
            }
            if errors.is_empty() {
                return Ok((start, end));
            }
        }
        (start, end) => errors.extend([start.err(), end.err()].into_iter().flatten()),
    }

    Err(ValidationError::collected(errors))
}
