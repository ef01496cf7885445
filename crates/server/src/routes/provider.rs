//! Provider self-service and the servicer job board.
use axum::{extract::{Path, State}, http::StatusCode, Extension, Json};
use uuid::Uuid;

use models::{booking, provider_profile, provider_schedule, Weekday};
use service::catalog::{self, CreateServiceInput, ServiceSummary, UpdateServiceInput};
use service::provider::{self, ProfileUpdate, ProviderDashboard, ScheduleInput};
use service::servicer::{self, ServicerDashboard, StatusUpdate};
use service::Actor;

use crate::errors::JsonApiError;
use crate::routes::auth::ServerState;

#[utoipa::path(get, path = "/api/provider/dashboard", tag = "provider", responses((status = 200, description = "OK"), (status = 403, description = "Providers only")))]
pub async fn dashboard(State(state): State<ServerState>, Extension(actor): Extension<Actor>) -> Result<Json<ProviderDashboard>, JsonApiError> {
    Ok(Json(provider::dashboard(&state.db, &actor).await?))
}

pub async fn get_profile(State(state): State<ServerState>, Extension(actor): Extension<Actor>) -> Result<Json<provider_profile::Model>, JsonApiError> {
    Ok(Json(provider::get_profile(&state.db, &actor).await?))
}

pub async fn update_profile(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<ProfileUpdate>,
) -> Result<Json<provider_profile::Model>, JsonApiError> {
    Ok(Json(provider::update_profile(&state.db, &actor, input).await?))
}

pub async fn list_schedule(State(state): State<ServerState>, Extension(actor): Extension<Actor>) -> Result<Json<Vec<provider_schedule::Model>>, JsonApiError> {
    Ok(Json(provider::list_schedule(&state.db, &actor).await?))
}

pub async fn set_schedule(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<ScheduleInput>,
) -> Result<Json<provider_schedule::Model>, JsonApiError> {
    Ok(Json(provider::set_schedule_entry(&state.db, &actor, input).await?))
}

pub async fn delete_schedule(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(day): Path<Weekday>,
) -> Result<StatusCode, JsonApiError> {
    provider::delete_schedule_entry(&state.db, &actor, day).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_services(State(state): State<ServerState>, Extension(actor): Extension<Actor>) -> Result<Json<Vec<ServiceSummary>>, JsonApiError> {
    Ok(Json(provider::list_own_services(&state.db, &actor).await?))
}

#[utoipa::path(post, path = "/api/provider/services", tag = "provider", request_body = crate::openapi::ServiceRequest, responses((status = 200, description = "Created"), (status = 400, description = "Validation Error")))]
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

#[utoipa::path(get, path = "/api/servicer/dashboard", tag = "servicer", responses((status = 200, description = "Confirmed jobs assigned to the caller")))]
pub async fn servicer_dashboard(State(state): State<ServerState>, Extension(actor): Extension<Actor>) -> Result<Json<ServicerDashboard>, JsonApiError> {
    Ok(Json(servicer::dashboard(&state.db, &actor).await?))
}

#[utoipa::path(post, path = "/api/servicer/status", tag = "servicer", request_body = crate::openapi::ServicerStatusRequest, responses((status = 200, description = "Updated"), (status = 403, description = "Not assigned"), (status = 404, description = "Unknown invoice")))]
pub async fn servicer_status(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<booking::Model>, JsonApiError> {
    Ok(Json(servicer::update_service_status(&state.db, &actor, update).await?))
}
