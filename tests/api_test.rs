use anyhow::{anyhow, Result};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tower::ServiceExt;

use eventdesk::auth::{hash_password, StoredAdminAuth};
use eventdesk::db;
use eventdesk::gateway::{GatewayInvoice, InvoiceDraft, PaymentGateway};
use eventdesk::model::ReviewStatus;
use eventdesk::server::{router, AppState};
use eventdesk::util::format_long_date;

async fn setup_pool() -> sqlx::SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

/// These routes never reach the gateway.
struct UnusedGateway;

#[async_trait::async_trait]
impl PaymentGateway for UnusedGateway {
    async fn create_invoice(&self, _draft: &InvoiceDraft) -> Result<GatewayInvoice> {
        Err(anyhow!("gateway must not be called"))
    }
}

fn app(pool: &sqlx::SqlitePool) -> Router {
    router(AppState {
        pool: pool.clone(),
        gateway: Arc::new(UnusedGateway),
        auth: Arc::new(StoredAdminAuth::new(pool.clone(), 60)),
        currency: "INR".into(),
    })
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn get_with_token(app: &Router, uri: &str, token: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn seed_user(pool: &sqlx::SqlitePool, name: &str, mobile: &str) -> i64 {
    db::insert_user(
        pool,
        name,
        Some("user@example.com"),
        mobile,
        None,
        None,
        None,
        None,
        Some("ABCDE - John Doe"),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let pool = setup_pool().await;
    let (status, body) = get(&app(&pool), "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn user_lookup_normalizes_phone() {
    let pool = setup_pool().await;
    let uid = seed_user(&pool, "Meera", "9876543210").await;
    let app = app(&pool);

    let (status, body) = get(&app, "/api/users/lookup?mobileNumber=%2B91%2098765-43210").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isOk"], true);
    assert_eq!(body["user"]["id"], uid);
    assert_eq!(body["user"]["mobileNumber"], "9876543210");
    assert_eq!(body["user"]["referralCode"], "ABCDE");
}

#[tokio::test]
async fn user_lookup_errors() {
    let pool = setup_pool().await;
    let app = app(&pool);

    let (status, body) = get(&app, "/api/users/lookup").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["isOk"], false);

    let (status, _) = get(&app, "/api/users/lookup?mobileNumber=1111111111").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn user_lookup_ignores_non_ascii_digits() {
    let pool = setup_pool().await;
    seed_user(&pool, "Meera", "9876543210").await;
    let app = app(&pool);

    // "+91 १२३४" keeps only the ASCII "91".
    let (status, body) = get(
        &app,
        "/api/users/lookup?mobileNumber=%2B91%20%E0%A5%A7%E0%A5%A8%E0%A5%A9%E0%A5%AA",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["isOk"], false);

    // Devanagari-only input has no ASCII digits at all.
    let (status, _) = get(
        &app,
        "/api/users/lookup?mobileNumber=%E0%A5%AF%E0%A5%AE%E0%A5%AD%E0%A5%AC",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get(
        &app,
        "/api/users/lookup?mobileNumber=%D9%A0%D9%A1%2098765-43210",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["mobileNumber"], "9876543210");
}

#[tokio::test]
async fn malformed_query_strings_use_error_envelope() {
    let pool = setup_pool().await;
    let app = app(&pool);

    let (status, body) = get(&app, "/api/events?category=yoga&category=fitness").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["isOk"], false);
    assert!(body["message"].as_str().unwrap().contains("duplicate field"));

    let (status, body) = get(&app, "/api/users/lookup?mobileNumber=1&mobileNumber=2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["isOk"], false);
}

#[tokio::test]
async fn category_listing_only_shows_open_upcoming_events() {
    let pool = setup_pool().await;
    let now = Utc::now();
    let soon = now + Duration::days(3);
    let later = now + Duration::days(20);

    let open_no_deadline = db::insert_event(&pool, "Open", "yoga", later, 800.0, None)
        .await
        .unwrap();
    let open_with_deadline =
        db::insert_event(&pool, "Deadline ahead", "yoga", soon, 500.0, Some(now + Duration::days(1)))
            .await
            .unwrap();
    db::insert_event(&pool, "Closed", "yoga", later, 500.0, Some(now - Duration::hours(1)))
        .await
        .unwrap();
    db::insert_event(&pool, "Past", "yoga", now - Duration::days(2), 500.0, None)
        .await
        .unwrap();
    db::insert_event(&pool, "Other category", "fitness", soon, 500.0, None)
        .await
        .unwrap();
    db::assign_trainer(&pool, open_no_deadline, "Asha").await.unwrap();
    db::assign_trainer(&pool, open_no_deadline, "Ravi").await.unwrap();

    let (status, body) = get(&app(&pool), "/api/events?category=yoga").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isOk"], true);

    let events = body["events"].as_array().unwrap();
    let ids: Vec<i64> = events.iter().map(|e| e["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![open_with_deadline, open_no_deadline]);

    assert_eq!(events[0]["trainers"], json!([]));
    assert_eq!(events[1]["trainers"], json!(["Asha", "Ravi"]));
    assert_eq!(events[1]["eventDate"], format_long_date(&later));
    assert!(events[1]["mediaLink"].as_str().unwrap().ends_with("yoga.mp4"));
    assert!(events[1].get("trainerLinks").is_none());
}

#[tokio::test]
async fn category_listing_validation_and_unknown_category() {
    let pool = setup_pool().await;
    db::insert_event(&pool, "Wheel throwing", "pottery", Utc::now() + Duration::days(5), 900.0, None)
        .await
        .unwrap();
    let app = app(&pool);

    let (status, _) = get(&app, "/api/events").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = get(&app, "/api/events?category=%20%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get(&app, "/api/events?category=pottery").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["events"].as_array().unwrap().len(), 1);
    assert!(body["events"][0].get("mediaLink").is_none());
}

#[tokio::test]
async fn event_reviews_average_completed_positive_ratings() {
    let pool = setup_pool().await;
    let uid = seed_user(&pool, "Meera", "9876543210").await;
    let event = db::insert_event(&pool, "Retreat", "retreat", Utc::now(), 0.0, None)
        .await
        .unwrap();
    let base = Utc::now() - Duration::days(1);
    for (i, rating) in [Some(5.0), Some(0.0), Some(4.0), Some(-1.0), None]
        .into_iter()
        .enumerate()
    {
        db::insert_review(
            &pool,
            uid,
            event,
            rating,
            None,
            ReviewStatus::Completed,
            base + Duration::minutes(i as i64),
        )
        .await
        .unwrap();
    }
    db::insert_review(&pool, uid, event, Some(1.0), None, ReviewStatus::Pending, base)
        .await
        .unwrap();

    let (status, body) = get(&app(&pool), &format!("/api/events/{event}/reviews")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["averageRating"], 4.5);
    assert_eq!(body["totalReviews"], 5);
    assert_eq!(body["reviews"][0]["user"]["name"], "Meera");
    assert_eq!(body["reviews"][0]["event"]["title"], "Retreat");
    assert!(body["reviews"]
        .as_array()
        .unwrap()
        .iter()
        .all(|r| r["status"] == "completed"));
}

#[tokio::test]
async fn event_reviews_without_ratings_average_zero() {
    let pool = setup_pool().await;
    let app = app(&pool);

    let (status, body) = get(&app, "/api/events/42/reviews").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["averageRating"], 0.0);
    assert_eq!(body["totalReviews"], 0);

    let (status, _) = get(&app, "/api/events/not-a-number/reviews").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_login_and_review_listing() {
    let pool = setup_pool().await;
    db::insert_admin(&pool, "root", &hash_password("s3cret", 4).unwrap())
        .await
        .unwrap();
    let uid = seed_user(&pool, "Meera", "9876543210").await;
    let first = db::insert_event(&pool, "First", "yoga", Utc::now(), 0.0, None)
        .await
        .unwrap();
    let second = db::insert_event(&pool, "Second", "fitness", Utc::now(), 0.0, None)
        .await
        .unwrap();
    let old = Utc::now() - Duration::days(3);
    let older_id = db::insert_review(&pool, uid, first, Some(4.0), None, ReviewStatus::Completed, old)
        .await
        .unwrap();
    let newer_id = db::insert_review(
        &pool,
        uid,
        second,
        None,
        Some("pending feedback"),
        ReviewStatus::Pending,
        old + Duration::days(1),
    )
    .await
    .unwrap();
    let app = app(&pool);

    let (status, _) = post_json(&app, "/api/admin/login", json!({ "username": "root" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post_json(
        &app,
        "/api/admin/login",
        json!({ "username": "root", "password": "nope" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["isOk"], false);

    let (status, _) = get(&app, "/api/admin/reviews").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = get_with_token(&app, "/api/admin/reviews", "adm_forged").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = post_json(
        &app,
        "/api/admin/login",
        json!({ "username": "root", "password": "s3cret" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = get_with_token(&app, "/api/admin/reviews", &token).await;
    assert_eq!(status, StatusCode::OK);
    let reviews = body["reviews"].as_array().unwrap();
    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0]["id"], newer_id);
    assert_eq!(reviews[0]["event"]["title"], "Second");
    assert_eq!(reviews[1]["id"], older_id);
    assert_eq!(reviews[1]["user"]["email"], "user@example.com");
}
