use std::path::Path as FsPath;

use axum::{
    http::{header, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;

use common::types::Health;

use crate::auth::{require_admin, require_auth, require_customer, require_provider};
use crate::errors::JsonApiError;
use crate::openapi::ApiDoc;

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod catalog;
pub mod provider;

use auth::ServerState;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn metrics() -> Result<impl IntoResponse, JsonApiError> {
    let body = common::metrics::encode_metrics()
        .map_err(|e| JsonApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Metrics Error", Some(e.to_string())))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the full application router: public catalog, authenticated user routes, and role-gated groups.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let frontend = state.config.server.frontend_dir.clone();
    let index = FsPath::new(&frontend).join("index.html");
    let static_dir = ServeDir::new(&frontend).fallback(ServeFile::new(index));

    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/api-docs/openapi.json", get(openapi_json))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/api/categories", get(catalog::list_categories))
        .route("/api/categories/:slug/services", get(catalog::category_services))
        .route("/api/services", get(catalog::list_services))
        .route("/api/services/:id", get(catalog::service_detail))
        .route("/api/services/:id/reviews", get(catalog::service_reviews));

    // any signed-in user; ownership is checked by the service layer
    let user = Router::new()
        .route("/api/bookings", get(bookings::list_bookings))
        .route("/api/bookings/:id", get(bookings::get_booking))
        .route("/api/invoices/:booking_id", get(bookings::get_invoice))
        .route("/api/invoices/:booking_id/status", get(bookings::invoice_status))
        .route("/api/invoices/:booking_id/download", get(bookings::download_invoice))
        .route("/api/invoices/:booking_id/qr", get(bookings::invoice_qr));

    let customer = Router::new()
        .route("/api/services/:id/book", post(bookings::book_service))
        .route("/api/bookings/:id/update", post(bookings::update_booking))
        .route("/api/bookings/:id/reschedule", post(bookings::reschedule_booking))
        .route("/api/bookings/:id/cancel", post(bookings::cancel_booking))
        .route("/api/payments/:booking_id", get(bookings::payment_quote).post(bookings::pay))
        .route("/api/payments/:booking_id/record", get(bookings::payment_record))
        .route("/api/reviews/:booking_id", post(bookings::add_review))
        .route_layer(middleware::from_fn(require_customer));

    let provider_routes = Router::new()
        .route("/api/provider/dashboard", get(provider::dashboard))
        .route("/api/provider/profile", get(provider::get_profile).put(provider::update_profile))
        .route("/api/provider/schedule", get(provider::list_schedule).post(provider::set_schedule))
        .route("/api/provider/schedule/:day", delete(provider::delete_schedule))
        .route("/api/provider/services", get(provider::list_services).post(provider::create_service))
        .route("/api/provider/services/:id", put(provider::update_service).delete(provider::delete_service))
        .route("/api/servicer/dashboard", get(provider::servicer_dashboard))
        .route("/api/servicer/status", post(provider::servicer_status))
        .route_layer(middleware::from_fn(require_provider));

    let admin_routes = Router::new()
        .route("/api/admin/dashboard", get(admin::dashboard))
        .route("/api/admin/bookings", get(admin::list_bookings))
        .route("/api/admin/bookings/pending", get(admin::pending_bookings))
        .route("/api/admin/bookings/:id", get(admin::booking_detail))
        .route("/api/admin/bookings/:id/approve", post(admin::approve_booking))
        .route("/api/admin/bookings/:id/reject", post(admin::reject_booking))
        .route("/api/admin/providers", get(admin::list_providers))
        .route("/api/admin/providers/:id/verify", post(admin::verify_provider))
        .route("/api/admin/reviews", get(admin::list_reviews))
        .route("/api/admin/categories", get(admin::list_categories).post(admin::create_category))
        .route("/api/admin/services", get(admin::list_services).post(admin::create_service))
        .route("/api/admin/services/:id", put(admin::update_service).delete(admin::delete_service))
        .route("/api/admin/services/:id/images", post(admin::add_image))
        .route("/api/admin/service-images/:id", delete(admin::delete_image))
        .route_layer(middleware::from_fn(require_admin));

    // role layers run inside the authentication layer, which puts the Actor in extensions
    let protected = Router::new()
        .merge(user)
        .merge(customer)
        .merge(provider_routes)
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    public
        .merge(protected)
        .fallback_service(static_dir)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // 响应返回时打点，包含状态码与耗时
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 失败（5xx 等）时以 ERROR 记录
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
