use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use beacon_backend::app;
use beacon_common::{IdentityResolver, JwtIdentityResolver};
use beacon_config::AuthConfig;
use beacon_db::{
    DbClient, DeviceTokenRepository, LocationPointRepository, SqlDeviceTokenRepository,
    SqlLocationPointRepository,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &str = "backend-test-secret";

async fn test_app() -> Router {
    let db_client = DbClient::from_url("sqlite::memory:").await.unwrap();
    let tokens = SqlDeviceTokenRepository::new(db_client.clone());
    let locations = SqlLocationPointRepository::new(db_client);
    tokens.init_schema().await.unwrap();
    locations.init_schema().await.unwrap();

    let resolver: Arc<dyn IdentityResolver> = Arc::new(JwtIdentityResolver::new(&AuthConfig {
        jwt_secret: SECRET.to_string(),
        issuer: None,
        audience: None,
        leeway_secs: 0,
    }));
    app(tokens, locations, resolver)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn banner_lists_every_endpoint() {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = send(test_app().await, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
    assert!(body["message"].is_string());
    assert_eq!(body["endpoints"].as_object().unwrap().len(), 5);
    assert_eq!(body["endpoints"]["register_token"], "POST /api/register-token");
}

#[tokio::test]
async fn token_routes_are_under_api() {
    let app = test_app().await;

    let request = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let request = Request::builder()
        .method("POST")
        .uri("/api/register-token")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"user_id": "user_1", "device_token": "tok", "platform": "ios"}).to_string(),
        ))
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
}

#[tokio::test]
async fn location_routes_are_at_the_root() {
    let app = test_app().await;
    let token = encode(
        &Header::default(),
        &json!({"sub": "user_1", "exp": chrono::Utc::now().timestamp() + 600}),
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/points")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"points": [
                {"latitude": 1.5, "longitude": 2.5, "timestamp": "2024-05-01T10:00:00Z"}
            ]})
            .to_string(),
        ))
        .unwrap();
    let (status, body) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["saved_count"], 1);

    let request = Request::builder()
        .uri("/points?start_time=2024-05-01T00:00:00Z&end_time=2024-05-02T00:00:00Z")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["points"][0]["longitude"], 2.5);
}

#[tokio::test]
async fn unauthenticated_points_request_is_rejected() {
    let request = Request::builder().uri("/points").body(Body::empty()).unwrap();
    let (status, body) = send(test_app().await, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error_code"], "UNAUTHORIZED");
}
