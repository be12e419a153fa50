//! Shared building blocks of the Beacon service.
//!
//! - [`validation`]: pure request validators
//! - [`auth`]: bearer credential to identity resolution
//! - [`error`]: error codes, validation errors and the handler-boundary error
//! - [`http`]: error response shaping and the JSON body extractor
//! - [`models`]: device token and location point types
//! - [`logging`]: tracing subscriber setup

pub mod auth;
pub mod error;
pub mod http;
pub mod logging;
pub mod models;
pub mod validation;

pub use auth::{Identity, IdentityResolver, JwtIdentityResolver};
pub use error::{
    persistence_error, BeaconError, ErrorCode, FieldError, HttpStatusCode,
    ValidationError, INTERNAL_ERROR_MESSAGE,
};
pub use http::{ErrorBody, JsonPayload, SuccessBody};
