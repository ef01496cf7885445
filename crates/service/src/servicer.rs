//! The field view for providers: confirmed jobs to carry out, closed by invoice number.
use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use models::{booking, invoice, money, service, user, validation, BookingStatus, Role};

use crate::errors::ServiceError;
use crate::{invoice as invoice_svc, Actor};

pub const DEFAULT_SERVICER_REJECT_NOTE: &str = "Rejected by servicer";

#[derive(Debug, Clone, Serialize)]
pub struct AssignedJob {
    pub booking_id: Uuid,
    pub invoice_number: Option<String>,
    pub service_name: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub booking_date: chrono::DateTime<chrono::FixedOffset>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub address: String,
    pub amount: i64,
    pub amount_display: String,
    pub special_instructions: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServicerDashboard {
    pub jobs: Vec<AssignedJob>,
    pub total_assigned: u64,
    pub total_completed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServicerAction {
    Completed,
    Rejected,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdate {
    pub invoice_number: String,
    pub status: ServicerAction,
    #[serde(default)]
    pub note: Option<String>,
}

#[instrument(skip(db), fields(servicer = %actor.user_id))]
pub async fn dashboard(db: &DatabaseConnection, actor: &Actor) -> Result<ServicerDashboard, ServiceError> {
    actor.require(Role::Provider)?;
    let me = actor.user_id;
    let rows = booking::Entity::find()
        .filter(booking::Column::ProviderId.eq(me))
        .filter(booking::Column::Status.eq(BookingStatus::Confirmed))
        .order_by_asc(booking::Column::BookingDate)
        .all(db)
        .await?;

    let booking_ids: Vec<Uuid> = rows.iter().map(|b| b.id).collect();
    let invoices: HashMap<Uuid, String> = invoice::Entity::find()
        .filter(invoice::Column::BookingId.is_in(booking_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|i| (i.booking_id, i.invoice_number))
        .collect();
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

    let jobs = rows
        .into_iter()
        .map(|b| {
            let customer = customers.get(&b.customer_id);
            AssignedJob {
                booking_id: b.id,
                invoice_number: invoices.get(&b.id).cloned(),
                service_name: services.get(&b.service_id).cloned().unwrap_or_default(),
                customer_name: customer.map(|c| c.full_name()).unwrap_or_default(),
                customer_email: customer.map(|c| c.email.clone()).unwrap_or_default(),
                customer_phone: b.phone_number,
                booking_date: b.booking_date,
                start_time: b.start_time,
                end_time: b.end_time,
                address: b.address,
                amount: b.total_amount,
                amount_display: money::format_inr(b.total_amount),
                special_instructions: b.special_instructions,
            }
        })
        .collect();

    Ok(ServicerDashboard {
        jobs,
        total_assigned: booking::Entity::find()
            .filter(booking::Column::ProviderId.eq(me))
            .count(db)
            .await?,
        total_completed: booking::Entity::find()
            .filter(booking::Column::CompletedBy.eq(me))
            .filter(booking::Column::Status.eq(BookingStatus::Completed))
            .count(db)
            .await?,
    })
}

/// Close out an invoiced job as completed, or turn it down.
#[instrument(skip(db, update), fields(servicer = %actor.user_id, invoice = %update.invoice_number, action = ?update.status))]
pub async fn update_service_status(db: &DatabaseConnection, actor: &Actor, update: StatusUpdate) -> Result<booking::Model, ServiceError> {
    actor.require(Role::Provider)?;
    let number = update.invoice_number.trim();
    if number.is_empty() {
        return Err(ServiceError::Validation("invoice_number is required".into()));
    }
    let inv = invoice::Entity::find()
        .filter(invoice::Column::InvoiceNumber.eq(number))
        .filter(invoice::Column::IsActive.eq(true))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("invoice"))?;
    let b = booking::Entity::find_by_id(inv.booking_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("booking"))?;
    if b.provider_id != Some(actor.user_id) {
        return Err(ServiceError::Forbidden("this booking is not assigned to you".into()));
    }
    if b.status != BookingStatus::Confirmed {
        return Err(ServiceError::InvalidState(format!("cannot update a {} booking", b.status)));
    }

    let now = Utc::now();
    let mut change = booking::ActiveModel { updated_at: Set(now.into()), ..Default::default() };
    match update.status {
        ServicerAction::Completed => {
            change.status = Set(BookingStatus::Completed);
            change.completed_by = Set(Some(actor.user_id));
            change.completed_at = Set(Some(now.into()));
        }
        ServicerAction::Rejected => {
            let note = update
                .note
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| DEFAULT_SERVICER_REJECT_NOTE.to_string());
            validation::validate_max_len("note", &note, validation::MAX_REASON)?;
            change.status = Set(BookingStatus::Rejected);
            change.rejected_by = Set(Some(actor.user_id));
            change.rejected_at = Set(Some(now.into()));
            change.rejection_reason = Set(Some(note));
        }
    }
    let txn = db.begin().await?;
    let res = booking::Entity::update_many()
        .set(change)
        .filter(booking::Column::Id.eq(b.id))
        .filter(booking::Column::Status.eq(BookingStatus::Confirmed))
        .exec(&txn)
        .await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::InvalidState("booking was already processed".into()));
    }
    if update.status == ServicerAction::Rejected {
        invoice_svc::void_for_booking(&txn, b.id).await?;
    }
    txn.commit().await?;
    if update.status == ServicerAction::Rejected {
        common::metrics::BOOKINGS_REJECTED_TOTAL.inc();
    }
    info!(booking_id = %b.id, event = "servicer_status_updated", "service status updated");
    booking::Entity::find_by_id(b.id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("booking"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::approve_booking;
    use crate::booking::create_booking;
    use crate::payment::{process_payment, PaymentRequest};
    use crate::test_support::{booking_input, get_db, make_service, make_user};
    use configs::BillingConfig;
    use models::PaymentMethod;

    /// A paid, approved booking and its invoice number.
    async fn invoiced_job(db: &DatabaseConnection) -> anyhow::Result<(Uuid, String, Actor)> {
        let billing = BillingConfig::default();
        let (svc, provider) = make_service(db, 25_000).await?;
        let (_, customer) = make_user(db, Role::Customer).await?;
        let (_, admin) = make_user(db, Role::Admin).await?;
        let b = create_booking(db, &customer, svc.id, booking_input()).await?;
        process_payment(db, &billing, &customer, b.booking.id, PaymentRequest { payment_method: PaymentMethod::Card, simulate_failure: false }).await?;
        let out = approve_booking(db, &billing, &admin, b.booking.id, None).await?;
        let number = out.invoice.map(|i| i.invoice_number).unwrap_or_default();
        Ok((b.booking.id, number, provider))
    }

    #[tokio::test]
    async fn servicer_completes_assigned_job() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let (booking_id, number, provider) = invoiced_job(&db).await?;

        let dash = dashboard(&db, &provider).await?;
        assert_eq!(dash.jobs.len(), 1);
        assert_eq!(dash.jobs[0].invoice_number.as_deref(), Some(number.as_str()));
        assert_eq!(dash.total_completed, 0);

        let done = update_service_status(&db, &provider, StatusUpdate { invoice_number: number.clone(), status: ServicerAction::Completed, note: None }).await?;
        assert_eq!(done.id, booking_id);
        assert_eq!(done.status, BookingStatus::Completed);
        assert_eq!(done.completed_by, Some(provider.user_id));

        let again = update_service_status(&db, &provider, StatusUpdate { invoice_number: number, status: ServicerAction::Rejected, note: None }).await;
        assert!(matches!(again, Err(ServiceError::InvalidState(_))));

        let dash = dashboard(&db, &provider).await?;
        assert!(dash.jobs.is_empty());
        assert_eq!(dash.total_completed, 1);
        Ok(())
    }

    #[tokio::test]
    async fn other_providers_and_unknown_invoices_are_refused() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let (_, number, _) = invoiced_job(&db).await?;
        let (_, stranger) = make_user(&db, Role::Provider).await?;

        let res = update_service_status(&db, &stranger, StatusUpdate { invoice_number: number, status: ServicerAction::Completed, note: None }).await;
        assert!(matches!(res, Err(ServiceError::Forbidden(_))));

        let res = update_service_status(&db, &stranger, StatusUpdate { invoice_number: "INV-00000000-DEADBEEF".into(), status: ServicerAction::Completed, note: None }).await;
        assert!(matches!(res, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn servicer_reject_records_default_note() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let (_, number, provider) = invoiced_job(&db).await?;
        let b = update_service_status(&db, &provider, StatusUpdate { invoice_number: number, status: ServicerAction::Rejected, note: None }).await?;
        assert_eq!(b.status, BookingStatus::Rejected);
        assert_eq!(b.rejection_reason.as_deref(), Some(DEFAULT_SERVICER_REJECT_NOTE));
        Ok(())
    }

    #[tokio::test]
    async fn servicer_reject_voids_invoice_and_refunds() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let billing = BillingConfig::default();
        let (booking_id, number, provider) = invoiced_job(&db).await?;
        let customer_id = booking::Entity::find_by_id(booking_id)
            .one(&db)
            .await?
            .map(|b| b.customer_id)
            .unwrap_or_default();
        let customer = Actor::new(customer_id, Role::Customer);

        update_service_status(&db, &provider, StatusUpdate { invoice_number: number.clone(), status: ServicerAction::Rejected, note: None }).await?;

        let res = invoice_svc::get_invoice_for_user(&db, &billing, &customer, booking_id).await;
        assert!(matches!(res, Err(ServiceError::InvalidState(_))));
        let status = invoice_svc::invoice_status(&db, &customer, booking_id).await?;
        assert!(!status.available);
        let pay = models::payment::Entity::find()
            .filter(models::payment::Column::BookingId.eq(booking_id))
            .one(&db)
            .await?;
        assert_eq!(pay.map(|p| p.payment_status), Some(models::TransactionStatus::Refunded));

        let reused = update_service_status(&db, &provider, StatusUpdate { invoice_number: number, status: ServicerAction::Completed, note: None }).await;
        assert!(matches!(reused, Err(ServiceError::NotFound(_))));
        Ok(())
    }
}
