//! Customer-facing booking flow: book, manage, pay, invoice and review.
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use models::{payment, review, BookingStatus};
use service::booking::{self, BookingInput, BookingSummary, RescheduleInput, UpdateBookingInput};
use service::invoice::{self, InvoiceStatus, InvoiceView};
use service::payment::{self as payments, PaymentOutcome, PaymentQuote, PaymentRequest};
use service::review::ReviewInput;
use service::Actor;

use crate::errors::JsonApiError;
use crate::routes::auth::ServerState;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct StatusQuery {
    #[param(value_type = Option<String>)]
    pub status: Option<BookingStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelBody {
    #[serde(default)]
    pub reason: Option<String>,
}

#[utoipa::path(post, path = "/api/services/{id}/book", tag = "bookings", params(("id" = Uuid, Path, description = "Service ID")), request_body = crate::openapi::BookingRequest, responses((status = 200, description = "Booking created"), (status = 400, description = "Validation Error"), (status = 403, description = "Customers only")))]
pub async fn book_service(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(service_id): Path<Uuid>,
    Json(input): Json<BookingInput>,
) -> Result<Json<BookingSummary>, JsonApiError> {
    Ok(Json(booking::create_booking(&state.db, &actor, service_id, input).await?))
}

#[utoipa::path(get, path = "/api/bookings", tag = "bookings", params(StatusQuery), responses((status = 200, description = "Own bookings, newest first")))]
pub async fn list_bookings(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Query(q): Query<StatusQuery>,
) -> Result<Json<Vec<BookingSummary>>, JsonApiError> {
    Ok(Json(booking::list_bookings_for_customer(&state.db, &actor, q.status).await?))
}

#[utoipa::path(get, path = "/api/bookings/{id}", tag = "bookings", params(("id" = Uuid, Path, description = "Booking ID")), responses((status = 200, description = "OK"), (status = 404, description = "Not Found")))]
pub async fn get_booking(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingSummary>, JsonApiError> {
    Ok(Json(booking::get_booking_for_user(&state.db, &actor, id).await?))
}

pub async fn update_booking(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateBookingInput>,
) -> Result<Json<BookingSummary>, JsonApiError> {
    Ok(Json(booking::update_booking(&state.db, &actor, id, input).await?))
}

pub async fn reschedule_booking(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(input): Json<RescheduleInput>,
) -> Result<Json<BookingSummary>, JsonApiError> {
    Ok(Json(booking::reschedule_booking(&state.db, &actor, id, input).await?))
}

#[utoipa::path(post, path = "/api/bookings/{id}/cancel", tag = "bookings", params(("id" = Uuid, Path, description = "Booking ID")), responses((status = 200, description = "Cancelled"), (status = 409, description = "Already processed")))]
pub async fn cancel_booking(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    body: Option<Json<CancelBody>>,
) -> Result<Json<BookingSummary>, JsonApiError> {
    let reason = body.and_then(|Json(b)| b.reason);
    Ok(Json(booking::cancel_booking(&state.db, &actor, id, reason).await?))
}

#[utoipa::path(get, path = "/api/payments/{booking_id}", tag = "payments", params(("booking_id" = Uuid, Path, description = "Booking ID")), responses((status = 200, description = "Amount breakdown and methods")))]
pub async fn payment_quote(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<PaymentQuote>, JsonApiError> {
    Ok(Json(payments::quote(&state.db, &state.config.billing, &actor, booking_id).await?))
}

#[utoipa::path(post, path = "/api/payments/{booking_id}", tag = "payments", params(("booking_id" = Uuid, Path, description = "Booking ID")), request_body = crate::openapi::PaymentRequestDoc, responses((status = 200, description = "Payment attempted"), (status = 409, description = "Already paid")))]
pub async fn pay(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(booking_id): Path<Uuid>,
    Json(req): Json<PaymentRequest>,
) -> Result<Json<PaymentOutcome>, JsonApiError> {
    Ok(Json(payments::process_payment(&state.db, &state.config.billing, &actor, booking_id, req).await?))
}

pub async fn payment_record(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Option<payment::Model>>, JsonApiError> {
    Ok(Json(payments::get_payment(&state.db, &actor, booking_id).await?))
}

#[utoipa::path(get, path = "/api/invoices/{booking_id}", tag = "invoices", params(("booking_id" = Uuid, Path, description = "Booking ID")), responses((status = 200, description = "Invoice"), (status = 409, description = "Not yet invoiceable")))]
pub async fn get_invoice(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<InvoiceView>, JsonApiError> {
    Ok(Json(invoice::get_invoice_for_user(&state.db, &state.config.billing, &actor, booking_id).await?))
}

pub async fn invoice_status(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<InvoiceStatus>, JsonApiError> {
    Ok(Json(invoice::invoice_status(&state.db, &actor, booking_id).await?))
}

#[utoipa::path(get, path = "/api/invoices/{booking_id}/download", tag = "invoices", params(("booking_id" = Uuid, Path, description = "Booking ID")), responses((status = 200, description = "PDF document", content_type = "application/pdf")))]
pub async fn download_invoice(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(booking_id): Path<Uuid>,
) -> Result<impl IntoResponse, JsonApiError> {
    let doc = invoice::build_document(&state.db, &state.config.billing, &actor, booking_id).await?;
    let bytes = invoice::render_pdf(&doc)?;
    let disposition = format!("attachment; filename=\"invoice_{}.pdf\"", doc.invoice_number);
    Ok(([(header::CONTENT_TYPE, "application/pdf".to_string()), (header::CONTENT_DISPOSITION, disposition)], bytes))
}

pub async fn invoice_qr(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(booking_id): Path<Uuid>,
) -> Result<impl IntoResponse, JsonApiError> {
    let svg = invoice::invoice_qr(&state.db, &state.config.billing, &actor, booking_id).await?;
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg))
}

#[utoipa::path(post, path = "/api/reviews/{booking_id}", tag = "reviews", params(("booking_id" = Uuid, Path, description = "Booking ID")), request_body = crate::openapi::ReviewRequest, responses((status = 200, description = "Review saved"), (status = 409, description = "Already reviewed")))]
pub async fn add_review(
    State(state): State<ServerState>,
    Extension(actor): Extension<Actor>,
    Path(booking_id): Path<Uuid>,
    Json(input): Json<ReviewInput>,
) -> Result<Json<review::Model>, JsonApiError> {
    Ok(Json(service::review::add_review(&state.db, &actor, booking_id, input).await?))
}
