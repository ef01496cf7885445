//! Administrator operations: dashboard figures, approval workflow and oversight listings.
use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, NaiveTime, TimeZone, Utc};
use configs::BillingConfig;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use models::{
    booking, invoice, money, payment, provider_profile, service, user, validation, BookingStatus, Role,
};

use crate::booking::{summarize_bookings, summarize_one, BookingSummary};
use crate::catalog::{reviews_for_services, ReviewView};
use crate::errors::ServiceError;
use crate::pagination::{Page, Pagination};
use crate::{invoice as invoice_svc, Actor};

pub const DEFAULT_REJECT_REASON: &str = "No reason provided";

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DashboardStats {
    pub total_services: u64,
    pub total_bookings: u64,
    /// Paise, paid bookings that are confirmed or completed.
    pub total_revenue: i64,
    pub total_revenue_display: String,
    pub pending_bookings: u64,
    pub confirmed_bookings: u64,
    pub rejected_bookings: u64,
    pub completed_bookings: u64,
    pub cancelled_bookings: u64,
    pub today_bookings: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApprovalOutcome {
    pub booking: BookingSummary,
    pub invoice: Option<invoice::Model>,
    pub stats: DashboardStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingDetail {
    pub booking: BookingSummary,
    pub customer: Option<user::Model>,
    pub service: Option<service::Model>,
    pub payment: Option<payment::Model>,
    pub invoice: Option<invoice::Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderView {
    pub user: user::Model,
    pub profile: Option<provider_profile::Model>,
    pub service_count: u64,
}

async fn count_status<C: ConnectionTrait>(db: &C, status: BookingStatus) -> Result<u64, ServiceError> {
    Ok(booking::Entity::find()
        .filter(booking::Column::Status.eq(status))
        .count(db)
        .await?)
}

pub async fn dashboard_stats<C: ConnectionTrait>(db: &C, now: DateTime<Utc>) -> Result<DashboardStats, ServiceError> {
    let revenue: i64 = booking::Entity::find()
        .filter(booking::Column::IsPaid.eq(true))
        .filter(booking::Column::Status.is_in([BookingStatus::Confirmed, BookingStatus::Completed]))
        .all(db)
        .await?
        .iter()
        .fold(0i64, |acc, b| acc.saturating_add(b.total_amount));
    let midnight: DateTime<FixedOffset> = Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN)).into();
    let today = booking::Entity::find()
        .filter(booking::Column::CreatedAt.gte(midnight))
        .count(db)
        .await?;

    Ok(DashboardStats {
        total_services: service::Entity::find().count(db).await?,
        total_bookings: booking::Entity::find().count(db).await?,
        total_revenue: revenue,
        total_revenue_display: money::format_inr(revenue),
        pending_bookings: count_status(db, BookingStatus::Pending).await?,
        confirmed_bookings: count_status(db, BookingStatus::Confirmed).await?,
        rejected_bookings: count_status(db, BookingStatus::Rejected).await?,
        completed_bookings: count_status(db, BookingStatus::Completed).await?,
        cancelled_bookings: count_status(db, BookingStatus::Cancelled).await?,
        today_bookings: today,
    })
}

/// The service's own provider if still active, otherwise the longest-standing active provider.
async fn pick_provider<C: ConnectionTrait>(db: &C, b: &booking::Model) -> Result<Option<Uuid>, ServiceError> {
    if let Some(svc) = service::Entity::find_by_id(b.service_id).one(db).await? {
        let owner = user::Entity::find_by_id(svc.provider_id).one(db).await?;
        if owner.is_some_and(|u| u.is_active && u.role == Role::Provider) {
            return Ok(Some(svc.provider_id));
        }
    }
    Ok(user::Entity::find()
        .filter(user::Column::Role.eq(Role::Provider))
        .filter(user::Column::IsActive.eq(true))
        .order_by_asc(user::Column::CreatedAt)
        .one(db)
        .await?
        .map(|u| u.id))
}

fn clean_notes(notes: Option<String>) -> Result<Option<String>, ServiceError> {
    let notes = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
    if let Some(n) = notes.as_deref() {
        validation::validate_max_len("admin_notes", n, validation::MAX_NOTES)?;
    }
    Ok(notes)
}

/// Approve a pending booking. A concurrent approval or rejection makes this one fail.
#[instrument(skip(db, billing, admin_notes), fields(admin = %actor.user_id, booking_id = %booking_id))]
pub async fn approve_booking(
    db: &DatabaseConnection,
    billing: &BillingConfig,
    actor: &Actor,
    booking_id: Uuid,
    admin_notes: Option<String>,
) -> Result<ApprovalOutcome, ServiceError> {
    actor.require_admin()?;
    let admin_notes = clean_notes(admin_notes)?;
    let txn = db.begin().await?;
    let b = booking::Entity::find_by_id(booking_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("booking"))?;
    if b.status != BookingStatus::Pending {
        return Err(already_processed(b.status));
    }
    let provider_id = match b.provider_id {
        Some(p) => Some(p),
        None => pick_provider(&txn, &b).await?,
    };
    if provider_id.is_none() {
        warn!(event = "no_provider_available", "approving without an assigned provider");
    }

    let now = Utc::now();
    let res = booking::Entity::update_many()
        .set(booking::ActiveModel {
            status: Set(BookingStatus::Confirmed),
            provider_id: Set(provider_id),
            approved_by: Set(Some(actor.user_id)),
            approved_at: Set(Some(now.into())),
            admin_notes: Set(admin_notes),
            updated_at: Set(now.into()),
            ..Default::default()
        })
        .filter(booking::Column::Id.eq(booking_id))
        .filter(booking::Column::Status.eq(BookingStatus::Pending))
        .exec(&txn)
        .await?;
    if res.rows_affected == 0 {
        let current = booking::Entity::find_by_id(booking_id).one(&txn).await?.map(|b| b.status);
        return Err(already_processed(current.unwrap_or(BookingStatus::Confirmed)));
    }

    let b = booking::Entity::find_by_id(booking_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("booking"))?;
    let issued = if b.is_paid {
        let email = user::Entity::find_by_id(b.customer_id)
            .one(&txn)
            .await?
            .map(|u| u.email)
            .unwrap_or_default();
        Some(invoice_svc::ensure_invoice(&txn, &b, &email, billing).await?)
    } else {
        None
    };
    txn.commit().await?;
    if let Some(i) = &issued {
        i.record();
    }
    let invoice = issued.map(|i| i.invoice);

    common::metrics::BOOKINGS_APPROVED_TOTAL.inc();
    info!(provider_id = ?provider_id, invoiced = invoice.is_some(), event = "booking_approved", "booking approved");
    Ok(ApprovalOutcome {
        booking: summarize_one(db, b).await?,
        invoice,
        stats: dashboard_stats(db, now).await?,
    })
}

fn already_processed(status: BookingStatus) -> ServiceError {
    ServiceError::InvalidState(format!("Booking is already {}. Cannot approve again.", status))
}

#[instrument(skip(db, reason, admin_notes), fields(admin = %actor.user_id, booking_id = %booking_id))]
pub async fn reject_booking(
    db: &DatabaseConnection,
    actor: &Actor,
    booking_id: Uuid,
    reason: Option<String>,
    admin_notes: Option<String>,
) -> Result<BookingSummary, ServiceError> {
    actor.require_admin()?;
    let admin_notes = clean_notes(admin_notes)?;
    let reason = reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| DEFAULT_REJECT_REASON.to_string());
    validation::validate_max_len("rejection_reason", &reason, validation::MAX_REASON)?;

    let b = booking::Entity::find_by_id(booking_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("booking"))?;
    if b.status != BookingStatus::Pending {
        return Err(ServiceError::InvalidState(format!("Booking is already {}. Cannot reject.", b.status)));
    }
    let now = Utc::now();
    let res = booking::Entity::update_many()
        .set(booking::ActiveModel {
            status: Set(BookingStatus::Rejected),
            rejected_by: Set(Some(actor.user_id)),
            rejected_at: Set(Some(now.into())),
            rejection_reason: Set(Some(reason)),
            admin_notes: Set(admin_notes),
            updated_at: Set(now.into()),
            ..Default::default()
        })
        .filter(booking::Column::Id.eq(booking_id))
        .filter(booking::Column::Status.eq(BookingStatus::Pending))
        .exec(db)
        .await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::InvalidState("Booking was processed by someone else. Cannot reject.".into()));
    }
    common::metrics::BOOKINGS_REJECTED_TOTAL.inc();
    info!(event = "booking_rejected", "booking rejected");
    let b = booking::Entity::find_by_id(booking_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("booking"))?;
    summarize_one(db, b).await
}

/// All bookings, newest first.
pub async fn list_bookings(
    db: &DatabaseConnection,
    actor: &Actor,
    status: Option<BookingStatus>,
    opts: Pagination,
) -> Result<Page<BookingSummary>, ServiceError> {
    actor.require_admin()?;
    let mut q = booking::Entity::find();
    if let Some(s) = status {
        q = q.filter(booking::Column::Status.eq(s));
    }
    let (page_idx, per_page) = opts.normalize();
    let paginator = q.order_by_desc(booking::Column::CreatedAt).paginate(db, per_page);
    let total = paginator.num_items().await?;
    let rows = paginator.fetch_page(page_idx).await?;
    Ok(Page::new(summarize_bookings(db, rows).await?, opts, total))
}

/// Pending bookings, oldest first so the queue is worked in order.
pub async fn pending_bookings(db: &DatabaseConnection, actor: &Actor) -> Result<Vec<BookingSummary>, ServiceError> {
    actor.require_admin()?;
    let rows = booking::Entity::find()
        .filter(booking::Column::Status.eq(BookingStatus::Pending))
        .order_by_asc(booking::Column::CreatedAt)
        .all(db)
        .await?;
    summarize_bookings(db, rows).await
}

pub async fn booking_detail(db: &DatabaseConnection, actor: &Actor, booking_id: Uuid) -> Result<BookingDetail, ServiceError> {
    actor.require_admin()?;
    let b = booking::Entity::find_by_id(booking_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("booking"))?;
    let customer = user::Entity::find_by_id(b.customer_id).one(db).await?;
    let svc = service::Entity::find_by_id(b.service_id).one(db).await?;
    let pay = payment::Entity::find()
        .filter(payment::Column::BookingId.eq(b.id))
        .one(db)
        .await?;
    let inv = invoice::Entity::find()
        .filter(invoice::Column::BookingId.eq(b.id))
        .one(db)
        .await?;
    Ok(BookingDetail {
        booking: summarize_one(db, b).await?,
        customer,
        service: svc,
        payment: pay,
        invoice: inv,
    })
}

pub async fn list_providers(db: &DatabaseConnection, actor: &Actor) -> Result<Vec<ProviderView>, ServiceError> {
    actor.require_admin()?;
    let providers = user::Entity::find()
        .filter(user::Column::Role.eq(Role::Provider))
        .order_by_asc(user::Column::CreatedAt)
        .all(db)
        .await?;
    let ids: Vec<Uuid> = providers.iter().map(|u| u.id).collect();
    let mut profiles: HashMap<Uuid, provider_profile::Model> = provider_profile::Entity::find()
        .filter(provider_profile::Column::UserId.is_in(ids.clone()))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.user_id, p))
        .collect();
    let mut counts: HashMap<Uuid, u64> = HashMap::new();
    for s in service::Entity::find()
        .filter(service::Column::ProviderId.is_in(ids))
        .all(db)
        .await?
    {
        *counts.entry(s.provider_id).or_default() += 1;
    }
    Ok(providers
        .into_iter()
        .map(|u| ProviderView {
            profile: profiles.remove(&u.id),
            service_count: counts.get(&u.id).copied().unwrap_or(0),
            user: u,
        })
        .collect())
}

pub async fn list_reviews(db: &DatabaseConnection, actor: &Actor) -> Result<Vec<ReviewView>, ServiceError> {
    actor.require_admin()?;
    reviews_for_services(db, None, None).await
}

#[instrument(skip(db), fields(admin = %actor.user_id, provider = %user_id))]
pub async fn set_provider_verified(
    db: &DatabaseConnection,
    actor: &Actor,
    user_id: Uuid,
    verified: bool,
) -> Result<provider_profile::Model, ServiceError> {
    actor.require_admin()?;
    let profile = provider_profile::find_by_user(db, user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("provider profile"))?;
    let mut am: provider_profile::ActiveModel = profile.into();
    am.is_verified = Set(verified);
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    info!(verified, event = "provider_verification_changed", "provider verification updated");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::create_booking;
    use crate::payment::{process_payment, PaymentRequest};
    use crate::test_support::{booking_input, get_db, make_service, make_user};
    use models::PaymentMethod;

    #[tokio::test]
    async fn approving_twice_fails() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let billing = BillingConfig::default();
        let (svc, provider) = make_service(&db, 20_000).await?;
        let (_, customer) = make_user(&db, Role::Customer).await?;
        let (_, admin) = make_user(&db, Role::Admin).await?;
        let b = create_booking(&db, &customer, svc.id, booking_input()).await?;

        let first = approve_booking(&db, &billing, &admin, b.booking.id, Some("ok".into())).await?;
        assert_eq!(first.booking.booking.status, BookingStatus::Confirmed);
        assert_eq!(first.booking.booking.provider_id, Some(provider.user_id));
        assert_eq!(first.booking.booking.approved_by, Some(admin.user_id));
        assert!(first.invoice.is_none());
        assert_eq!(first.stats.confirmed_bookings, 1);

        let second = approve_booking(&db, &billing, &admin, b.booking.id, None).await;
        match second {
            Err(ServiceError::InvalidState(msg)) => assert_eq!(msg, "Booking is already confirmed. Cannot approve again."),
            other => panic!("unexpected: {other:?}"),
        }

        let reject = reject_booking(&db, &admin, b.booking.id, None, None).await;
        assert!(matches!(reject, Err(ServiceError::InvalidState(_))));
        Ok(())
    }

    #[tokio::test]
    async fn approving_paid_booking_issues_invoice_and_counts_revenue() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let billing = BillingConfig::default();
        let (svc, _) = make_service(&db, 30_000).await?;
        let (_, customer) = make_user(&db, Role::Customer).await?;
        let (_, admin) = make_user(&db, Role::Admin).await?;

        let paid = create_booking(&db, &customer, svc.id, booking_input()).await?;
        process_payment(&db, &billing, &customer, paid.booking.id, PaymentRequest { payment_method: PaymentMethod::Upi, simulate_failure: false }).await?;
        // paid but never approved: no revenue
        create_booking(&db, &customer, svc.id, booking_input()).await?;
        assert_eq!(dashboard_stats(&db, Utc::now()).await?.total_revenue, 0);

        let out = approve_booking(&db, &billing, &admin, paid.booking.id, None).await?;
        let inv = out.invoice.expect("invoice for paid booking");
        assert_eq!(inv.subtotal, 30_000);
        assert_eq!(inv.tax_amount, 5_400);
        assert_eq!(inv.total_amount, 35_400);
        assert_eq!(out.stats.total_revenue, 30_000);
        assert_eq!(out.stats.pending_bookings, 1);
        assert_eq!(out.stats.total_bookings, 2);
        assert_eq!(out.stats.today_bookings, 2);
        Ok(())
    }

    #[tokio::test]
    async fn reject_uses_default_reason_and_requires_admin() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let (svc, provider) = make_service(&db, 10_000).await?;
        let (_, customer) = make_user(&db, Role::Customer).await?;
        let (_, admin) = make_user(&db, Role::Admin).await?;
        let b = create_booking(&db, &customer, svc.id, booking_input()).await?;

        let denied = reject_booking(&db, &provider, b.booking.id, None, None).await;
        assert!(matches!(denied, Err(ServiceError::Forbidden(_))));

        let rejected = reject_booking(&db, &admin, b.booking.id, Some("  ".into()), None).await?;
        assert_eq!(rejected.booking.status, BookingStatus::Rejected);
        assert_eq!(rejected.booking.rejection_reason.as_deref(), Some(DEFAULT_REJECT_REASON));

        let page = list_bookings(&db, &admin, Some(BookingStatus::Rejected), Pagination::default()).await?;
        assert_eq!(page.total, 1);
        assert!(pending_bookings(&db, &admin).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn verify_provider_and_list() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let (_, provider) = make_service(&db, 10_000).await?;
        let (_, admin) = make_user(&db, Role::Admin).await?;
        let p = set_provider_verified(&db, &admin, provider.user_id, true).await?;
        assert!(p.is_verified);

        let listed = list_providers(&db, &admin).await?;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].service_count, 1);
        assert!(listed[0].profile.as_ref().is_some_and(|p| p.is_verified));

        let missing = set_provider_verified(&db, &admin, admin.user_id, true).await;
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));
        Ok(())
    }
}
