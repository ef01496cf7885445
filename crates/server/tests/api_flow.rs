use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use server::routes::auth::ServerState;

const ADMIN_PASSWORD: &str = "admin-pass-123";
const SAMPLE_PASSWORD: &str = "sample-pass-123";

async fn build_app() -> anyhow::Result<Router> {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opts).await?;
    migration::Migrator::up(&db, None).await?;
    service::seed::seed_sample_data(&db, ADMIN_PASSWORD, SAMPLE_PASSWORD).await?;

    let mut cfg = configs::AppConfig::default();
    cfg.database.url = "sqlite::memory:".into();
    cfg.auth.jwt_secret = "test-secret".into();
    Ok(server::build_app(ServerState::new(db, cfg)))
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> anyhow::Result<(StatusCode, Value)> {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(b) => req.header(header::CONTENT_TYPE, "application/json").body(Body::from(serde_json::to_vec(&b)?))?,
        None => req.body(Body::empty())?,
    };
    let resp = app.clone().oneshot(req).await?;
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
    Ok((status, value))
}

async fn login(app: &Router, email: &str, password: &str) -> anyhow::Result<String> {
    let (status, body) = send(app, "POST", "/auth/login", None, Some(json!({"email": email, "password": password}))).await?;
    assert_eq!(status, StatusCode::OK, "login failed for {email}: {body}");
    Ok(body["token"].as_str().unwrap_or_default().to_string())
}

async fn register_customer(app: &Router) -> anyhow::Result<String> {
    let email = format!("cust_{}@example.com", Uuid::new_v4().simple());
    let (status, _) = send(app, "POST", "/auth/register", None, Some(json!({
        "email": email, "first_name": "Meera", "last_name": "Iyer", "password": "Customer#2024"
    }))).await?;
    assert_eq!(status, StatusCode::OK);
    login(app, &email, "Customer#2024").await
}

#[tokio::test]
async fn public_endpoints_respond() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = build_app().await?;

    let (status, body) = send(&app, "GET", "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, "GET", "/api/categories", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(6));

    let (status, body) = send(&app, "GET", "/api/categories/plumbing/services", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);

    let (status, _) = send(&app, "GET", "/api/categories/no-such-thing/services", None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "GET", "/api-docs/openapi.json", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/auth/login"].is_object());
    Ok(())
}

#[tokio::test]
async fn auth_errors_use_the_right_status() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = build_app().await?;

    let (status, body) = send(&app, "GET", "/api/bookings", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(&app, "GET", "/api/bookings", Some("not-a-jwt"), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let customer = register_customer(&app).await?;
    let (status, _) = send(&app, "GET", "/api/admin/dashboard", Some(&customer), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "GET", "/auth/me", Some(&customer), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "customer");
    assert_eq!(body["dashboard"], "/api/bookings");

    let (status, _) = send(&app, "POST", "/auth/login", None, Some(json!({"email": service::seed::ADMIN_EMAIL, "password": "wrong-password"}))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "POST", "/auth/register", None, Some(json!({"email": "x@example.com", "first_name": "X", "password": "short"}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn login_sets_http_only_cookie() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = build_app().await?;
    let req = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&json!({"email": service::seed::ADMIN_EMAIL, "password": ADMIN_PASSWORD}))?))?;
    let resp = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp.headers().get(header::SET_COOKIE).and_then(|v| v.to_str().ok()).unwrap_or_default().to_string();
    assert!(cookie.starts_with("auth_token="));
    assert!(cookie.contains("HttpOnly"));

    let token_pair = cookie.split(';').next().unwrap_or_default().to_string();
    let req = Request::builder().uri("/api/admin/dashboard").header(header::COOKIE, token_pair).body(Body::empty())?;
    let resp = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn book_pay_approve_and_invoice() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = build_app().await?;
    let customer = register_customer(&app).await?;
    let admin = login(&app, service::seed::ADMIN_EMAIL, ADMIN_PASSWORD).await?;

    let (_, services) = send(&app, "GET", "/api/services?search=pipe", None, None).await?;
    let service_id = services["items"][0]["id"].as_str().unwrap_or_default().to_string();
    let price = services["items"][0]["price"].as_i64().unwrap_or_default();
    assert_eq!(price, 45_000);

    let (status, booked) = send(&app, "POST", &format!("/api/services/{service_id}/book"), Some(&customer), Some(json!({
        "booking_date": (Utc::now() + Duration::days(2)).to_rfc3339(),
        "start_time": "09:00",
        "end_time": "11:00",
        "address": "12 MG Road, Bengaluru",
        "phone_number": "+919845012345"
    }))).await?;
    assert_eq!(status, StatusCode::OK, "{booked}");
    assert_eq!(booked["status"], "pending");
    let booking_id = booked["id"].as_str().unwrap_or_default().to_string();

    // providers cannot book
    let provider = login(&app, "ravi.provider@homeservice.local", SAMPLE_PASSWORD).await?;
    let (status, _) = send(&app, "POST", &format!("/api/services/{service_id}/book"), Some(&provider), Some(json!({}))).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "GET", &format!("/api/invoices/{booking_id}"), Some(&customer), None).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, paid) = send(&app, "POST", &format!("/api/payments/{booking_id}"), Some(&customer), Some(json!({"payment_method": "upi"}))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["success"], true);
    assert_eq!(paid["payment"]["amount"], 53_100);

    let (status, approved) = send(&app, "POST", &format!("/api/admin/bookings/{booking_id}/approve"), Some(&admin), Some(json!({"admin_notes": "Verified address"}))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["booking"]["status"], "confirmed");
    assert_eq!(approved["stats"]["total_revenue"], 45_000);

    let (status, again) = send(&app, "POST", &format!("/api/admin/bookings/{booking_id}/approve"), Some(&admin), None).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(again["message"], "Booking is already confirmed. Cannot approve again.");

    let (status, inv) = send(&app, "GET", &format!("/api/invoices/{booking_id}"), Some(&customer), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(inv["tax_amount"], 8_100);
    assert_eq!(inv["total_amount"], 53_100);
    assert!(inv["invoice_number"].as_str().is_some_and(|n| n.starts_with("INV-")));

    let req = Request::builder()
        .uri(format!("/api/invoices/{booking_id}/download"))
        .header(header::AUTHORIZATION, format!("Bearer {customer}"))
        .body(Body::empty())?;
    let resp = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()), Some("application/pdf"));
    let pdf = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    assert!(pdf.starts_with(b"%PDF"));

    // another customer sees nothing
    let stranger = register_customer(&app).await?;
    let (status, _) = send(&app, "GET", &format!("/api/bookings/{booking_id}"), Some(&stranger), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
