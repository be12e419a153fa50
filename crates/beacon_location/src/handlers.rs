//! HTTP handlers for location points
//!
//! Both handlers resolve the caller first. A request without a usable bearer
//! credential is answered with 401 before its body or query is looked at.

use axum::{
    extract::{rejection::QueryRejection, Json, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
};
use beacon_common::{
    persistence_error,
    validation::{validate_points_get_request, validate_points_upload_request},
    BeaconError, Identity, IdentityResolver, JsonPayload,
};
use beacon_db::LocationPointRepository;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared state for the location handlers
pub struct LocationState<R> {
    pub repository: R,
    pub resolver: Arc<dyn IdentityResolver>,
}

pub const MISSING_RANGE_MESSAGE: &str = "start_time and end_time parameters are required";

/// Response body of a point upload
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UploadPointsResponse {
    /// Always `"success"`, also when some points were not stored
    pub status: &'static str,
    pub message: String,
    /// Points that were stored
    pub saved_count: usize,
    /// Points that were submitted
    pub total_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct PointsQuery {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// A stored point as returned by a range query
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PointResponse {
    pub latitude: f64,
    pub longitude: f64,
    /// ISO 8601, UTC
    pub timestamp: String,
}

/// Response body of a range query
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PointsRangeResponse {
    pub points: Vec<PointResponse>,
    pub count: usize,
    /// The parsed lower bound, inclusive
    pub start_time: String,
    /// The parsed upper bound, exclusive
    pub end_time: String,
}

fn iso8601(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// Resolves the caller from the `Authorization` header.
///
/// A missing header, a header without the `Bearer ` prefix and a token that
/// does not verify produce the same error.
fn authenticate(resolver: &dyn IdentityResolver, headers: &HeaderMap) -> Result<Identity, BeaconError> {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    resolver.resolve(authorization).ok_or_else(|| {
        warn!("Authentication failed");
        BeaconError::Unauthorized
    })
}

/// Upload a batch of points for the calling user.
///
/// Points the store refuses are skipped; the response still reports success
/// with `saved_count` below `total_count`.
pub async fn upload_points_handler<R>(
    State(state): State<Arc<LocationState<R>>>,
    headers: HeaderMap,
    payload: Result<JsonPayload, BeaconError>,
) -> Result<(StatusCode, Json<UploadPointsResponse>), BeaconError>
where
    R: LocationPointRepository + Send + Sync + 'static,
{
    let identity = authenticate(state.resolver.as_ref(), &headers)?;
    info!("Point upload started: user_id={}", identity.user_id);

    let JsonPayload(body) = payload?;

    let points = validate_points_upload_request(&body).map_err(|e| {
        warn!("Point upload rejected: {}", e);
        e
    })?;

    let report = state
        .repository
        .insert_batch(&identity.user_id, &points)
        .await
        .map_err(persistence_error)?;

    info!(
        "Point upload finished: user_id={}, saved={}/{}",
        identity.user_id, report.saved_count, report.total_count
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadPointsResponse {
            status: "success",
            message: format!("Saved {} location points", report.saved_count),
            saved_count: report.saved_count,
            total_count: report.total_count,
        }),
    ))
}

/// Points of the calling user in `[start_time, end_time)`, oldest first.
pub async fn get_points_handler<R>(
    State(state): State<Arc<LocationState<R>>>,
    headers: HeaderMap,
    query: Result<Query<PointsQuery>, QueryRejection>,
) -> Result<Json<PointsRangeResponse>, BeaconError>
where
    R: LocationPointRepository + Send + Sync + 'static,
{
    let identity = authenticate(state.resolver.as_ref(), &headers)?;

    let (start_time, end_time) = match query {
        Ok(Query(PointsQuery {
            start_time: Some(start),
            end_time: Some(end),
        })) if !start.is_empty() && !end.is_empty() => (start, end),
        _ => return Err(BeaconError::MissingParameters(MISSING_RANGE_MESSAGE.to_string())),
    };

    let (start, end) = validate_points_get_request(&start_time, &end_time).map_err(|e| {
        warn!("Point query rejected: {}", e);
        e
    })?;

    info!(
        "Point query: user_id={}, range={} - {}",
        identity.user_id, start, end
    );

    let stored = state
        .repository
        .query_range(&identity.user_id, start, end)
        .await
        .map_err(persistence_error)?;

    let points: Vec<PointResponse> = stored
        .into_iter()
        .map(|p| PointResponse {
            latitude: p.latitude,
            longitude: p.longitude,
            timestamp: iso8601(p.timestamp),
        })
        .collect();

    info!(
        "Point query finished: user_id={}, count={}",
        identity.user_id,
        points.len()
    );

    Ok(Json(PointsRangeResponse {
        count: points.len(),
        points,
        start_time: iso8601(start),
        end_time: iso8601(end),
    }))
}
