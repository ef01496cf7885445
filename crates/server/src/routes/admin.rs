//! Administrator endpoints. Every route here sits behind the admin role check.
use axum::{extract::{Path, Query, State}, http::StatusCode, Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use models::{provider_profile, service_category, service_image, BookingStatus};
use service::admin::{self, ApprovalOutcome, BookingDetail, DashboardStats, ProviderView};
use service::booking::BookingSummary;
use service::catalog::{self, CategoryInput, CategorySummary, CreateServiceInput, ImageInput, ReviewView, ServiceSummary, UpdateServiceInput};
use service::pagination::{Page, Pagination};
use service::Actor;

use crate::errors::JsonApiError;
use crate::routes::auth::ServerState;
use crate::routes::catalog::ServiceQuery;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct BookingListQuery {
    #[param(value_type = Option<String>)]
    pub status: Option<BookingStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApproveBody {
    #[serde(default)]
    pub admin_notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectBody {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub admin_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyBody {
    #[serde(default = "default_verified")]
    pub verified: bool,
}

fn default_verified() -> bool { true }

#[utoipa::path(get, path = "/api/admin/dashboard", tag = "admin", responses((status = 200, description = "Dashboard figures"), (status = 403, description = "Admins only")))]
pub async fn dashboard(State(state): State<ServerState>) -> Result<Json<DashboardStats>, JsonApiError> {
    Ok(Json(admin::dashboard_stats(&state.db, Utc::now()).await?))
}

#[utoipa::path(get, path = "/api/admin/bookings", tag = "admin", params(BookingListQuery), responses((status = 200, description = "OK")))]
pub async fn list_bookings(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Query(q): Query<BookingListQuery>,
) -> Result<Json<Page<BookingSummary>>, JsonApiError> {
    let d = Pagination::default();
    let page = Pagination { page: q.page.unwrap_or(d.page), per_page: q.per_page.unwrap_or(d.per_page) };
    Ok(Json(admin::list_bookings(&state.db, &actor, q.status, page).await?))
}

pub async fn pending_bookings(State(state): State<ServerState>, Extension(actor): Extension<Actor>) -> Result<Json<Vec<BookingSummary>>, JsonApiError> {
    Ok(Json(admin::pending_bookings(&state.db, &actor).await?))
}

pub async fn booking_detail(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingDetail>, JsonApiError> {
    Ok(Json(admin::booking_detail(&state.db, &actor, id).await?))
}

#[utoipa::path(post, path = "/api/admin/bookings/{id}/approve", tag = "admin", params(("id" = Uuid, Path, description = "Booking ID")), responses((status = 200, description = "Approved"), (status = 409, description = "Already processed")))]
pub async fn approve_booking(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    body: Option<Json<ApproveBody>>,
) -> Result<Json<ApprovalOutcome>, JsonApiError> {
    let notes = body.and_then(|Json(b)| b.admin_notes);
    Ok(Json(admin::approve_booking(&state.db, &state.config.billing, &actor, id, notes).await?))
}

#[utoipa::path(post, path = "/api/admin/bookings/{id}/reject", tag = "admin", params(("id" = Uuid, Path, description = "Booking ID")), responses((status = 200, description = "Rejected"), (status = 409, description = "Already processed")))]
pub async fn reject_booking(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    body: Option<Json<RejectBody>>,
) -> Result<Json<BookingSummary>, JsonApiError> {
    let Json(body) = body.unwrap_or_default();
    Ok(Json(admin::reject_booking(&state.db, &actor, id, body.reason, body.admin_notes).await?))
}

pub async fn list_providers(State(state): State<ServerState>, Extension(actor): Extension<Actor>) -> Result<Json<Vec<ProviderView>>, JsonApiError> {
    Ok(Json(admin::list_providers(&state.db, &actor).await?))
}

pub async fn verify_provider(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<VerifyBody>,
) -> Result<Json<provider_profile::Model>, JsonApiError> {
    Ok(Json(admin::set_provider_verified(&state.db, &actor, user_id, body.verified).await?))
}

pub async fn list_reviews(State(state): State<ServerState>, Extension(actor): Extension<Actor>) -> Result<Json<Vec<ReviewView>>, JsonApiError> {
    Ok(Json(admin::list_reviews(&state.db, &actor).await?))
}

pub async fn list_categories(State(state): State<ServerState>) -> Result<Json<Vec<CategorySummary>>, JsonApiError> {
    Ok(Json(catalog::list_categories(&state.db).await?))
}

#[utoipa::path(post, path = "/api/admin/categories", tag = "admin", request_body = crate::openapi::CategoryRequest, responses((status = 200, description = "Created"), (status = 409, description = "Duplicate name or slug")))]
pub async fn create_category(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<CategoryInput>,
) -> Result<Json<service_category::Model>, JsonApiError> {
    Ok(Json(catalog::create_category(&state.db, &actor, input).await?))
}

/// Every service, including inactive ones.
pub async fn list_services(State(state): State<ServerState>, Query(q): Query<ServiceQuery>) -> Result<Json<Page<ServiceSummary>>, JsonApiError> {
    let (filter, page) = q.split(false);
    Ok(Json(catalog::list_services(&state.db, filter, page).await?))
}

pub async fn create_service(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<CreateServiceInput>,
) -> Result<Json<ServiceSummary>, JsonApiError> {
    Ok(Json(catalog::create_service(&state.db, &actor, input).await?))
}

pub async fn update_service(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateServiceInput>,
) -> Result<Json<ServiceSummary>, JsonApiError> {
    Ok(Json(catalog::update_service(&state.db, &actor, id, input).await?))
}

pub async fn delete_service(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, JsonApiError> {
    catalog::delete_service(&state.db, &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_image(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(input): Json<ImageInput>,
) -> Result<Json<service_image::Model>, JsonApiError> {
    Ok(Json(catalog::add_service_image(&state.db, &actor, id, input).await?))
}

pub async fn delete_image(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, JsonApiError> {
    catalog::delete_service_image(&state.db, &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
