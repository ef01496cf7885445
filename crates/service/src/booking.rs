//! Customer bookings: create, view, edit, reschedule and cancel.
use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use models::{booking, invoice, money, service, user, validation, BookingStatus, Role};

use crate::catalog::provider_names;
use crate::errors::ServiceError;
use crate::{invoice as invoice_svc, Actor};

pub const MAX_DAYS_AHEAD: i64 = 365;
pub const DEFAULT_CANCEL_REASON: &str = "User requested cancellation";

#[derive(Debug, Clone, Deserialize)]
pub struct BookingInput {
    pub booking_date: DateTime<Utc>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    pub address: String,
    pub phone_number: String,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBookingInput {
    pub booking_date: Option<DateTime<Utc>>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub special_instructions: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RescheduleInput {
    pub booking_date: DateTime<Utc>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

/// A booking with the names a listing needs.
#[derive(Debug, Clone, Serialize)]
pub struct BookingSummary {
    #[serde(flatten)]
    pub booking: booking::Model,
    pub service_name: String,
    pub provider_name: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub total_display: String,
    pub invoice_number: Option<String>,
}

/// Future, and no more than a year out.
pub fn validate_booking_date(date: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), ServiceError> {
    if date <= now {
        return Err(ServiceError::Validation("booking date must be in the future".into()));
    }
    if date > now + Duration::days(MAX_DAYS_AHEAD) {
        return Err(ServiceError::Validation("booking date cannot be more than one year ahead".into()));
    }
    Ok(())
}

fn validate_window(start: Option<&str>, end: Option<&str>) -> Result<(), ServiceError> {
    match (start, end) {
        (Some(s), Some(e)) => {
            validation::validate_time_window(s, e)?;
        }
        (Some(t), None) | (None, Some(t)) => {
            validation::parse_hhmm(t)?;
        }
        (None, None) => {}
    }
    Ok(())
}

pub async fn summarize_bookings<C: ConnectionTrait>(db: &C, rows: Vec<booking::Model>) -> Result<Vec<BookingSummary>, ServiceError> {
    let service_ids: Vec<Uuid> = rows.iter().map(|b| b.service_id).collect();
    let services: HashMap<Uuid, String> = service::Entity::find()
        .filter(service::Column::Id.is_in(service_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();
    let customer_ids: Vec<Uuid> = rows.iter().map(|b| b.customer_id).collect();
    let customers: HashMap<Uuid, user::Model> = user::Entity::find()
        .filter(user::Column::Id.is_in(customer_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    let provider_ids: Vec<Uuid> = rows.iter().filter_map(|b| b.provider_id).collect();
    let providers = provider_names(db, &provider_ids).await?;
    let booking_ids: Vec<Uuid> = rows.iter().map(|b| b.id).collect();
    let invoices: HashMap<Uuid, String> = invoice::Entity::find()
        .filter(invoice::Column::BookingId.is_in(booking_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|i| (i.booking_id, i.invoice_number))
        .collect();

    Ok(rows
        .into_iter()
        .map(|b| {
            let customer = customers.get(&b.customer_id);
            BookingSummary {
                service_name: services.get(&b.service_id).cloned().unwrap_or_default(),
                provider_name: b.provider_id.and_then(|p| providers.get(&p).cloned()),
                customer_name: customer.map(|c| c.full_name()).unwrap_or_default(),
                customer_email: customer.map(|c| c.email.clone()).unwrap_or_default(),
                total_display: money::format_inr(b.total_amount),
                invoice_number: invoices.get(&b.id).cloned(),
                booking: b,
            }
        })
        .collect())
}

pub async fn summarize_one<C: ConnectionTrait>(db: &C, b: booking::Model) -> Result<BookingSummary, ServiceError> {
    summarize_bookings(db, vec![b])
        .await?
        .pop()
        .ok_or_else(|| ServiceError::not_found("booking"))
}

/// Load a booking that belongs to `actor` as its customer. Other people's bookings look missing.
pub(crate) async fn load_own<C: ConnectionTrait>(db: &C, actor: &Actor, id: Uuid) -> Result<booking::Model, ServiceError> {
    let b = booking::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("booking"))?;
    if b.customer_id != actor.user_id {
        return Err(ServiceError::not_found("booking"));
    }
    Ok(b)
}

fn ensure_open(b: &booking::Model, action: &str) -> Result<(), ServiceError> {
    if !b.status.is_open() {
        return Err(ServiceError::InvalidState(format!("cannot {action} a {} booking", b.status)));
    }
    Ok(())
}

#[instrument(skip(db, input), fields(customer = %actor.user_id, service_id = %service_id))]
pub async fn create_booking(db: &DatabaseConnection, actor: &Actor, service_id: Uuid, input: BookingInput) -> Result<BookingSummary, ServiceError> {
    actor.require(Role::Customer)?;
    let svc = service::Entity::find_by_id(service_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("service"))?;
    if !svc.is_bookable() {
        return Err(ServiceError::InvalidState("this service is not available for booking".into()));
    }
    validate_booking_date(input.booking_date, Utc::now())?;
    validate_window(input.start_time.as_deref(), input.end_time.as_deref())?;
    if let Some(si) = input.special_instructions.as_deref() {
        validation::validate_max_len("special_instructions", si, 1000)?;
    }

    let provider_name = provider_names(db, &[svc.provider_id])
        .await?
        .remove(&svc.provider_id)
        .unwrap_or_default();
    let mut notes = format!("Booking for {} - Provider: {}", svc.name, provider_name);
    if notes.chars().count() > validation::MAX_NOTES {
        notes = notes.chars().take(validation::MAX_NOTES).collect();
    }

    let created = booking::create(db, booking::NewBooking {
        customer_id: actor.user_id,
        service_id: svc.id,
        provider_id: Some(svc.provider_id),
        booking_date: input.booking_date.into(),
        start_time: input.start_time.as_deref(),
        end_time: input.end_time.as_deref(),
        address: &input.address,
        phone_number: &input.phone_number,
        total_amount: svc.price,
        notes,
        special_instructions: input.special_instructions.as_deref(),
    })
    .await?;
    common::metrics::BOOKINGS_CREATED_TOTAL.inc();
    info!(booking_id = %created.id, amount = created.total_amount, event = "booking_created", "booking created");
    summarize_one(db, created).await
}

/// The actor's own bookings, newest first.
pub async fn list_bookings_for_customer(db: &DatabaseConnection, actor: &Actor, status: Option<BookingStatus>) -> Result<Vec<BookingSummary>, ServiceError> {
    let mut q = booking::Entity::find().filter(booking::Column::CustomerId.eq(actor.user_id));
    if let Some(s) = status {
        q = q.filter(booking::Column::Status.eq(s));
    }
    let rows = q.order_by_desc(booking::Column::CreatedAt).all(db).await?;
    summarize_bookings(db, rows).await
}

/// Bookings visible to the actor: the customer who made it, the assigned provider, or an administrator.
pub async fn get_booking_for_user(db: &DatabaseConnection, actor: &Actor, id: Uuid) -> Result<BookingSummary, ServiceError> {
    let b = booking::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("booking"))?;
    let visible = actor.is_admin() || b.customer_id == actor.user_id || b.provider_id == Some(actor.user_id);
    if !visible {
        return Err(ServiceError::not_found("booking"));
    }
    summarize_one(db, b).await
}

#[instrument(skip(db, input), fields(customer = %actor.user_id, booking_id = %id))]
pub async fn update_booking(db: &DatabaseConnection, actor: &Actor, id: Uuid, input: UpdateBookingInput) -> Result<BookingSummary, ServiceError> {
    let b = load_own(db, actor, id).await?;
    ensure_open(&b, "update")?;
    let start = input.start_time.clone().or_else(|| b.start_time.clone());
    let end = input.end_time.clone().or_else(|| b.end_time.clone());
    validate_window(start.as_deref(), end.as_deref())?;

    let mut am: booking::ActiveModel = b.into();
    if let Some(date) = input.booking_date {
        validate_booking_date(date, Utc::now())?;
        am.booking_date = Set(date.into());
    }
    if input.start_time.is_some() {
        am.start_time = Set(start);
    }
    if input.end_time.is_some() {
        am.end_time = Set(end);
    }
    if let Some(addr) = input.address {
        validation::validate_required("address", &addr, 1000)?;
        am.address = Set(addr.trim().to_string());
    }
    if let Some(phone) = input.phone_number {
        validation::validate_phone(&phone)?;
        am.phone_number = Set(phone.trim().to_string());
    }
    if let Some(si) = input.special_instructions {
        validation::validate_max_len("special_instructions", &si, 1000)?;
        am.special_instructions = Set(Some(si.trim().to_string()).filter(|s| !s.is_empty()));
    }
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    info!(event = "booking_updated", "booking updated");
    summarize_one(db, updated).await
}

#[instrument(skip(db, input), fields(customer = %actor.user_id, booking_id = %id))]
pub async fn reschedule_booking(db: &DatabaseConnection, actor: &Actor, id: Uuid, input: RescheduleInput) -> Result<BookingSummary, ServiceError> {
    let b = load_own(db, actor, id).await?;
    ensure_open(&b, "reschedule")?;
    validate_booking_date(input.booking_date, Utc::now())?;
    validate_window(input.start_time.as_deref(), input.end_time.as_deref())?;
    let mut am: booking::ActiveModel = b.into();
    am.booking_date = Set(input.booking_date.into());
    if input.start_time.is_some() || input.end_time.is_some() {
        am.start_time = Set(input.start_time);
        am.end_time = Set(input.end_time);
    }
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    info!(new_date = %input.booking_date, event = "booking_rescheduled", "booking rescheduled");
    summarize_one(db, updated).await
}

/// Cancel a pending or confirmed booking. Guarded by a conditional update on the current status;
/// any issued invoice is voided in the same transaction.
#[instrument(skip(db, reason), fields(customer = %actor.user_id, booking_id = %id))]
pub async fn cancel_booking(db: &DatabaseConnection, actor: &Actor, id: Uuid, reason: Option<String>) -> Result<BookingSummary, ServiceError> {
    let b = load_own(db, actor, id).await?;
    ensure_open(&b, "cancel")?;
    let reason = reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| DEFAULT_CANCEL_REASON.to_string());
    validation::validate_max_len("cancellation_reason", &reason, validation::MAX_REASON)?;

    let now = Utc::now();
    let txn = db.begin().await?;
    let res = booking::Entity::update_many()
        .set(booking::ActiveModel {
            status: Set(BookingStatus::Cancelled),
            cancellation_reason: Set(Some(reason)),
            cancellation_date: Set(Some(now.into())),
            updated_at: Set(now.into()),
            ..Default::default()
        })
        .filter(booking::Column::Id.eq(id))
        .filter(booking::Column::Status.is_in([BookingStatus::Pending, BookingStatus::Confirmed]))
        .exec(&txn)
        .await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::InvalidState("booking was already processed".into()));
    }
    let voided = invoice_svc::void_for_booking(&txn, id).await?;
    txn.commit().await?;
    info!(invoice_voided = voided, event = "booking_cancelled", "booking cancelled");
    let b = load_own(db, actor, id).await?;
    summarize_one(db, b).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{booking_input, get_db, make_service, make_user};

    #[test]
    fn booking_date_window() {
        let now = Utc::now();
        assert!(validate_booking_date(now + Duration::hours(1), now).is_ok());
        assert!(validate_booking_date(now - Duration::hours(1), now).is_err());
        assert!(validate_booking_date(now, now).is_err());
        assert!(validate_booking_date(now + Duration::days(366), now).is_err());
    }

    #[tokio::test]
    async fn create_booking_is_pending_and_private() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let (svc, provider) = make_service(&db, 79_900).await?;
        let (_, customer) = make_user(&db, Role::Customer).await?;
        let (_, stranger) = make_user(&db, Role::Customer).await?;

        let b = create_booking(&db, &customer, svc.id, booking_input()).await?;
        assert_eq!(b.booking.status, BookingStatus::Pending);
        assert_eq!(b.booking.total_amount, 79_900);
        assert_eq!(b.booking.provider_id, Some(provider.user_id));
        assert_eq!(b.booking.notes, "Booking for Deep Cleaning - Provider: Test Services Co");

        assert_eq!(list_bookings_for_customer(&db, &customer, None).await?.len(), 1);
        assert!(list_bookings_for_customer(&db, &stranger, None).await?.is_empty());
        assert!(matches!(get_booking_for_user(&db, &stranger, b.booking.id).await, Err(ServiceError::NotFound(_))));
        assert!(get_booking_for_user(&db, &provider, b.booking.id).await.is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn create_booking_rejects_past_date_and_inactive_service() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let (svc, provider) = make_service(&db, 1_000).await?;
        let (_, customer) = make_user(&db, Role::Customer).await?;

        let mut past = booking_input();
        past.booking_date = Utc::now() - Duration::days(1);
        assert!(matches!(create_booking(&db, &customer, svc.id, past).await, Err(ServiceError::Validation(_))));
        assert!(matches!(create_booking(&db, &provider, svc.id, booking_input()).await, Err(ServiceError::Forbidden(_))));

        crate::catalog::update_service(&db, &provider, svc.id, crate::catalog::UpdateServiceInput { is_available: Some(false), ..Default::default() }).await?;
        assert!(matches!(create_booking(&db, &customer, svc.id, booking_input()).await, Err(ServiceError::InvalidState(_))));
        Ok(())
    }

    #[tokio::test]
    async fn cancel_uses_default_reason_and_only_once() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let (svc, _) = make_service(&db, 1_000).await?;
        let (_, customer) = make_user(&db, Role::Customer).await?;
        let b = create_booking(&db, &customer, svc.id, booking_input()).await?;

        let cancelled = cancel_booking(&db, &customer, b.booking.id, Some("   ".into())).await?;
        assert_eq!(cancelled.booking.status, BookingStatus::Cancelled);
        assert_eq!(cancelled.booking.cancellation_reason.as_deref(), Some(DEFAULT_CANCEL_REASON));
        assert!(cancelled.booking.cancellation_date.is_some());

        assert!(matches!(cancel_booking(&db, &customer, b.booking.id, None).await, Err(ServiceError::InvalidState(_))));
        let resched = RescheduleInput { booking_date: Utc::now() + Duration::days(5), start_time: None, end_time: None };
        assert!(matches!(reschedule_booking(&db, &customer, b.booking.id, resched).await, Err(ServiceError::InvalidState(_))));
        Ok(())
    }

    #[tokio::test]
    async fn cancelling_an_invoiced_booking_voids_the_invoice() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let billing = configs::BillingConfig::default();
        let (svc, _) = make_service(&db, 40_000).await?;
        let (_, customer) = make_user(&db, Role::Customer).await?;
        let (_, admin) = make_user(&db, Role::Admin).await?;
        let b = create_booking(&db, &customer, svc.id, booking_input()).await?;
        let pay = crate::payment::PaymentRequest { payment_method: models::PaymentMethod::Upi, simulate_failure: false };
        crate::payment::process_payment(&db, &billing, &customer, b.booking.id, pay).await?;
        let approved = crate::admin::approve_booking(&db, &billing, &admin, b.booking.id, None).await?;
        assert!(approved.invoice.is_some());

        cancel_booking(&db, &customer, b.booking.id, None).await?;

        let res = invoice_svc::get_invoice_for_user(&db, &billing, &customer, b.booking.id).await;
        assert!(matches!(res, Err(ServiceError::InvalidState(_))));
        let status = invoice_svc::invoice_status(&db, &customer, b.booking.id).await?;
        assert!(!status.available);
        assert!(status.invoice_number.is_none());
        let stored = invoice::Entity::find()
            .filter(invoice::Column::BookingId.eq(b.booking.id))
            .one(&db)
            .await?;
        assert_eq!(stored.map(|i| i.is_active), Some(false));
        let payment = models::payment::Entity::find()
            .filter(models::payment::Column::BookingId.eq(b.booking.id))
            .one(&db)
            .await?;
        assert_eq!(payment.map(|p| p.payment_status), Some(models::TransactionStatus::Refunded));
        Ok(())
    }

    #[tokio::test]
    async fn update_and_reschedule_change_fields() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let (svc, _) = make_service(&db, 1_000).await?;
        let (_, customer) = make_user(&db, Role::Customer).await?;
        let b = create_booking(&db, &customer, svc.id, booking_input()).await?;

        let upd = UpdateBookingInput { special_instructions: Some("Bring a ladder".into()), ..Default::default() };
        let updated = update_booking(&db, &customer, b.booking.id, upd).await?;
        assert_eq!(updated.booking.special_instructions.as_deref(), Some("Bring a ladder"));

        let bad_window = UpdateBookingInput { end_time: Some("09:00".into()), ..Default::default() };
        assert!(update_booking(&db, &customer, b.booking.id, bad_window).await.is_err());

        let target = Utc::now() + Duration::days(30);
        let moved = reschedule_booking(&db, &customer, b.booking.id, RescheduleInput { booking_date: target, start_time: Some("14:00".into()), end_time: Some("16:00".into()) }).await?;
        assert_eq!(moved.booking.booking_date.timestamp(), target.timestamp());
        assert_eq!(moved.booking.start_time.as_deref(), Some("14:00"));

        let too_far = RescheduleInput { booking_date: Utc::now() + Duration::days(400), start_time: None, end_time: None };
        assert!(matches!(reschedule_booking(&db, &customer, b.booking.id, too_far).await, Err(ServiceError::Validation(_))));
        Ok(())
    }
}
