use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Stable, machine-checkable error tokens returned in the `error_code` field.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    InvalidFormat,
    Unauthorized,
    MissingParameters,
    InternalServerError,
    LatitudeRequired,
    LatitudeInvalidType,
    LatitudeOutOfRange,
    LongitudeRequired,
    LongitudeInvalidType,
    LongitudeOutOfRange,
    TimestampRequired,
    TimestampInvalidType,
    TimestampInvalidFormat,
    PointInvalidType,
    RequestInvalidType,
    PointsRequired,
    PointsInvalidType,
    PointsEmpty,
    PointsTooMany,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::InvalidFormat => "INVALID_FORMAT",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::MissingParameters => "MISSING_PARAMETERS",
            ErrorCode::InternalServerError => "INTERNAL_SERVER_ERROR",
            ErrorCode::LatitudeRequired => "LATITUDE_REQUIRED",
            ErrorCode::LatitudeInvalidType => "LATITUDE_INVALID_TYPE",
            ErrorCode::LatitudeOutOfRange => "LATITUDE_OUT_OF_RANGE",
            ErrorCode::LongitudeRequired => "LONGITUDE_REQUIRED",
            ErrorCode::LongitudeInvalidType => "LONGITUDE_INVALID_TYPE",
            ErrorCode::LongitudeOutOfRange => "LONGITUDE_OUT_OF_RANGE",
            ErrorCode::TimestampRequired => "TIMESTAMP_REQUIRED",
            ErrorCode::TimestampInvalidType => "TIMESTAMP_INVALID_TYPE",
            ErrorCode::TimestampInvalidFormat => "TIMESTAMP_INVALID_FORMAT",
            ErrorCode::PointInvalidType => "POINT_INVALID_TYPE",
            ErrorCode::RequestInvalidType => "REQUEST_INVALID_TYPE",
            ErrorCode::PointsRequired => "POINTS_REQUIRED",
            ErrorCode::PointsInvalidType => "POINTS_INVALID_TYPE",
            ErrorCode::PointsEmpty => "POINTS_EMPTY",
            ErrorCode::PointsTooMany => "POINTS_TOO_MANY",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single failed rule on a single input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub message: String,
    pub code: ErrorCode,
}

impl FieldError {
    pub fn new(message: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }

    /// Generic `VALIDATION_ERROR` failure.
    pub fn generic(message: impl Into<String>) -> Self {
        Self::new(message, ErrorCode::ValidationError)
    }

    /// Prefixes the message with a field or location label, keeping the code.
    pub fn prefixed(self, prefix: &str) -> Self {
        Self {
            message: format!("{}: {}", prefix, self.message),
            code: self.code,
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// A rejected request payload.
///
/// Carries every individual failure that was collected; the user-visible
/// message is those failures joined with `"; "`. `code` is the code reported
/// to the client, which for aggregating validators is the generic
/// `VALIDATION_ERROR` regardless of the per-field codes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", self.message())]
pub struct ValidationError {
    pub code: ErrorCode,
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// Wraps a single failure, keeping its own code.
    pub fn single(error: FieldError) -> Self {
        Self {
            code: error.code,
            errors: vec![error],
        }
    }

    /// Combines collected failures under the generic code.
    pub fn aggregate(errors: Vec<FieldError>) -> Self {
        Self {
            code: ErrorCode::ValidationError,
            errors,
        }
    }

    /// One failure keeps its own code; several fall back to the generic one.
    pub fn collected(mut errors: Vec<FieldError>) -> Self {
        if errors.len() == 1 {
            Self::single(errors.remove(0))
        } else {
            Self::aggregate(errors)
        }
    }

    pub fn message(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl From<FieldError> for ValidationError {
    fn from(error: FieldError) -> Self {
        Self::single(error)
    }
}

/// Errors surfaced at the HTTP handler boundary.
#[derive(Error, Debug)]
pub enum BeaconError {
    /// The request body was not JSON
    #[error("Request body must be JSON")]
    InvalidFormat,

    /// The payload failed validation
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Missing or invalid bearer credential
    #[error("Authentication required")]
    Unauthorized,

    /// Required query parameters were absent
    #[error("{0}")]
    MissingParameters(String),

    /// The store was unreachable or the write failed
    #[error("Persistence error: {0}")]
    Persistence(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for BeaconError {
    fn status_code(&self) -> u16 {
        match self {
            BeaconError::InvalidFormat => 400,
            BeaconError::Validation(_) => 400,
            BeaconError::Unauthorized => 401,
            BeaconError::MissingParameters(_) => 400,
            BeaconError::Persistence(_) => 500,
        }
    }
}

/// Fixed message for every 5xx response; the cause is only logged.
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal server error occurred";

impl BeaconError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            BeaconError::InvalidFormat => ErrorCode::InvalidFormat,
            BeaconError::Validation(e) => e.code,
            BeaconError::Unauthorized => ErrorCode::Unauthorized,
            BeaconError::MissingParameters(_) => ErrorCode::MissingParameters,
            BeaconError::Persistence(_) => ErrorCode::InternalServerError,
        }
    }

    /// The message shown to the client.
    pub fn public_message(&self) -> String {
        match self {
            BeaconError::Persistence(_) => INTERNAL_ERROR_MESSAGE.to_string(),
            BeaconError::Validation(e) => e.message(),
            other => other.to_string(),
        }
    }
}

pub fn persistence_error<T: fmt::Display>(message: T) -> BeaconError {
    BeaconError::Persistence(message.to_string())
}
