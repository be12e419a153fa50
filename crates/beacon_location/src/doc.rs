#![allow(dead_code)]
use beacon_common::{ErrorBody, ErrorCode};
use serde::Deserialize;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

use crate::handlers::{PointResponse, PointsRangeResponse, UploadPointsResponse};

/// One point of an upload
#[derive(Debug, Deserialize, ToSchema)]
pub struct PointRequest {
    /// Degrees, -90 to 90 inclusive
    pub latitude: f64,
    /// Degrees, -180 to 180 inclusive
    pub longitude: f64,
    /// ISO 8601 date and time; without an offset it is read as UTC
    pub timestamp: String,
}

/// Request body of `POST /points`
#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadPointsRequest {
    /// 1 to 1000 points
    pub points: Vec<PointRequest>,
}

#[utoipa::path(
    post,
    path = "/points",
    request_body(content = UploadPointsRequest, example = json!({
        "points": [
            {"latitude": 35.6812, "longitude": 139.7671, "timestamp": "2024-01-01T08:00:00Z"},
            {"latitude": 35.6896, "longitude": 139.7006, "timestamp": "2024-01-01T08:05:00Z"}
        ]
    })),
    responses(
        (status = 201, description = "Points stored; rows the store refused are skipped", body = UploadPointsResponse,
         example = json!({
             "status": "success",
             "message": "Saved 2 location points",
             "saved_count": 2,
             "total_count": 2
         })
        ),
        (status = 400, description = "Bad Request", body = ErrorBody,
         example = json!({
             "status": "error",
             "message": "points[1]: latitude: latitude must be between -90 and 90",
             "error_code": "VALIDATION_ERROR"
         })
        ),
        (status = 401, description = "Unauthorized", body = ErrorBody,
         example = json!({
             "status": "error",
             "message": "Authentication required",
             "error_code": "UNAUTHORIZED"
         })
        ),
        (status = 500, description = "Internal Server Error", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Location"
)]
fn doc_upload_points_handler() {}

#[utoipa::path(
    get,
    path = "/points",
    params(
        ("start_time" = String, Query, description = "Inclusive lower bound, ISO 8601"),
        ("end_time" = String, Query, description = "Exclusive upper bound, ISO 8601; at most 30 days after start_time")
    ),
    responses(
        (status = 200, description = "Points in range, oldest first", body = PointsRangeResponse,
         example = json!({
             "points": [
                 {"latitude": 35.6812, "longitude": 139.7671, "timestamp": "2024-01-01T08:00:00+00:00"}
             ],
             "count": 1,
             "start_time": "2024-01-01T00:00:00+00:00",
             "end_time": "2024-01-02T00:00:00+00:00"
         })
        ),
        (status = 400, description = "MISSING_PARAMETERS or a timestamp error", body = ErrorBody,
         example = json!({
             "status": "error",
             "message": "start_time and end_time parameters are required",
             "error_code": "MISSING_PARAMETERS"
         })
        ),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 500, description = "Internal Server Error", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Location"
)]
fn doc_get_points_handler() {}

/// Registers the `bearer_auth` scheme the paths above refer to.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        doc_upload_points_handler,
        doc_get_points_handler,
    ),
    components(
        schemas(
            UploadPointsRequest,
            PointRequest,
            UploadPointsResponse,
            PointsRangeResponse,
            PointResponse,
            ErrorBody,
            ErrorCode,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Location", description = "Location point upload and query API")
    )
)]
pub struct LocationApiDoc;
