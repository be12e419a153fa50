use beacon_common::models::NewLocationPoint;
use beacon_db::{DbClient, LocationPointRepository, SqlLocationPointRepository};
use chrono::{DateTime, Duration, Utc};

async fn store() -> SqlLocationPointRepository {
    let db_client = DbClient::from_url("sqlite::memory:").await.unwrap();
    let repo = SqlLocationPointRepository::new(db_client);
    repo.init_schema().await.unwrap();
    repo
}

fn at(text: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(text)
        .unwrap()
        .with_timezone(&Utc)
}

fn point(latitude: f64, longitude: f64, ts: DateTime<Utc>) -> NewLocationPoint {
    NewLocationPoint {
        latitude,
        longitude,
        parsed_timestamp: ts,
    }
}

#[tokio::test]
async fn init_schema_is_idempotent() {
    let repo = store().await;
    repo.init_schema().await.unwrap();
}

#[tokio::test]
async fn batch_saves_every_valid_row() {
    let repo = store().await;
    let base = at("2024-01-01T08:00:00Z");
    let points: Vec<_> = (0..5)
        .map(|i| point(47.0 + i as f64 * 0.01, 8.5, base + Duration::minutes(i)))
        .collect();

    let report = repo.insert_batch("user_1", &points).await.unwrap();
    assert_eq!(report.saved_count, 5);
    assert_eq!(report.total_count, 5);
    assert!(report.failed_rows.is_empty());
    assert!(report.is_complete());
}

#[tokio::test]
async fn rejected_row_does_not_sink_the_batch() {
    let repo = store().await;
    let base = at("2024-01-01T08:00:00Z");
    let points = vec![
        point(47.0, 8.5, base),
        // Violates the latitude CHECK constraint.
        point(120.0, 8.5, base + Duration::minutes(1)),
        point(47.2, 8.5, base + Duration::minutes(2)),
    ];

    let report = repo.insert_batch("user_1", &points).await.unwrap();
    assert_eq!(report.saved_count, 2);
    assert_eq!(report.total_count, 3);
    assert_eq!(report.failed_rows.len(), 1);
    assert_eq!(report.failed_rows[0].index, 1);
    assert!(!report.is_complete());

    let stored = repo
        .query_range("user_1", base, base + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].latitude, 47.0);
    assert_eq!(stored[1].latitude, 47.2);
}

#[tokio::test]
async fn range_is_half_open_and_ordered() {
    let repo = store().await;
    let start = at("2024-01-01T00:00:00Z");
    let end = at("2024-01-02T00:00:00Z");

    // Submitted out of order, with one point on each bound.
    let points = vec![
        point(1.0, 1.0, start + Duration::hours(5)),
        point(2.0, 2.0, end),
        point(3.0, 3.0, start),
        point(4.0, 4.0, start + Duration::hours(1)),
        point(5.0, 5.0, start - Duration::seconds(1)),
    ];
    repo.insert_batch("user_1", &points).await.unwrap();

    let stored = repo.query_range("user_1", start, end).await.unwrap();
    let latitudes: Vec<f64> = stored.iter().map(|p| p.latitude).collect();
    assert_eq!(latitudes, vec![3.0, 4.0, 1.0]);
    assert!(stored.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    assert!(stored.iter().all(|p| p.timestamp != end));
    assert_eq!(stored[0].timestamp, start);

    // Adjacent ranges never count the shared bound twice.
    let next = repo
        .query_range("user_1", end, end + Duration::days(1))
        .await
        .unwrap();
    assert_eq!(next.len(), 1);
    assert_eq!(next[0].latitude, 2.0);
}

#[tokio::test]
async fn users_only_see_their_own_points() {
    let repo = store().await;
    let ts = at("2024-06-01T12:00:00.250Z");
    repo.insert_batch("user_1", &[point(10.0, 20.0, ts)])
        .await
        .unwrap();
    repo.insert_batch("user_2", &[point(-10.0, -20.0, ts)])
        .await
        .unwrap();

    let stored = repo
        .query_range("user_2", ts, ts + Duration::seconds(1))
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].user_id, "user_2");
    assert_eq!(stored[0].longitude, -20.0);
    assert_eq!(stored[0].timestamp, ts);
}

#[tokio::test]
async fn timestamps_round_trip_exactly() {
    let repo = store().await;
    // Microsecond values far beyond 32 bits.
    let first = at("2024-01-01T08:00:00Z");
    let second = at("2038-02-01T00:00:00.123456Z");
    repo.insert_batch("user_1", &[point(1.0, 1.0, second), point(2.0, 2.0, first)])
        .await
        .unwrap();

    let stored = repo
        .query_range("user_1", first, second + Duration::seconds(1))
        .await
        .unwrap();
    let timestamps: Vec<DateTime<Utc>> = stored.iter().map(|p| p.timestamp).collect();
    assert_eq!(timestamps, vec![first, second]);
    assert_eq!(stored[0].timestamp.timestamp_micros(), 1_704_096_000_000_000);
}

#[tokio::test]
async fn duplicates_are_allowed() {
    let repo = store().await;
    let ts = at("2024-06-01T12:00:00Z");
    let report = repo
        .insert_batch("user_1", &[point(1.0, 1.0, ts), point(1.0, 1.0, ts)])
        .await
        .unwrap();
    assert_eq!(report.saved_count, 2);
}

#[tokio::test]
async fn missing_schema_is_a_query_error() {
    let db_client = DbClient::from_url("sqlite::memory:").await.unwrap();
    let repo = SqlLocationPointRepository::new(db_client);
    let now = Utc::now();
    assert!(repo
        .query_range("user_1", now - Duration::hours(1), now)
        .await
        .is_err());
}
