//! Invoices: one per paid, approved booking, plus PDF and QR renderings.
pub mod pdf;
pub mod qr;

use chrono::{DateTime, FixedOffset, Utc};
use configs::BillingConfig;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use models::{booking, invoice, money, payment, service, user, BookingStatus, PaymentStatus, TransactionStatus};

use crate::catalog::provider_names;
use crate::errors::ServiceError;
use crate::Actor;

pub use pdf::render_pdf;
pub use qr::render_qr_svg;

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceView {
    #[serde(flatten)]
    pub invoice: invoice::Model,
    pub subtotal_display: String,
    pub tax_display: String,
    pub total_display: String,
    pub tax_rate: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceStatus {
    pub booking_id: Uuid,
    pub available: bool,
    pub invoice_number: Option<String>,
    pub booking_status: BookingStatus,
    pub payment_status: PaymentStatus,
}

/// Everything printed on an invoice, already resolved to display strings.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceDocument {
    pub company_name: String,
    pub currency: String,
    pub invoice_number: String,
    pub generated_at: DateTime<FixedOffset>,
    pub booking_id: Uuid,
    pub booking_date: DateTime<FixedOffset>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub service_name: String,
    pub provider_name: String,
    pub address: String,
    pub subtotal: i64,
    pub tax_amount: i64,
    pub tax_rate: String,
    pub total_amount: i64,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
}

pub fn qr_payload(invoice_number: &str, booking_id: Uuid, total: i64, customer_email: &str) -> String {
    format!(
        "HomeService Invoice: {invoice_number}\nBooking ID: {booking_id}\nAmount: {}\nCustomer: {customer_email}",
        money::format_inr(total)
    )
}

/// The rate the invoice was issued at, not the one currently configured.
fn stored_rate_label(inv: &invoice::Model) -> String {
    money::rate_label(inv.tax_rate_bps.unsigned_abs())
}

fn view(inv: invoice::Model) -> InvoiceView {
    InvoiceView {
        subtotal_display: money::format_inr(inv.subtotal),
        tax_display: money::format_inr(inv.tax_amount),
        total_display: money::format_inr(inv.total_amount),
        tax_rate: format!("{}%", stored_rate_label(&inv)),
        invoice: inv,
    }
}

async fn find_for_booking<C: ConnectionTrait>(db: &C, booking_id: Uuid) -> Result<Option<invoice::Model>, ServiceError> {
    Ok(invoice::Entity::find()
        .filter(invoice::Column::BookingId.eq(booking_id))
        .filter(invoice::Column::IsActive.eq(true))
        .one(db)
        .await?)
}

/// Result of [`ensure_invoice`]; `created` is false when the invoice already existed.
#[derive(Debug, Clone)]
pub struct IssuedInvoice {
    pub invoice: invoice::Model,
    pub created: bool,
}

impl IssuedInvoice {
    /// Count a newly generated invoice. Call after the enclosing transaction commits.
    pub fn record(&self) {
        if self.created {
            common::metrics::INVOICES_GENERATED_TOTAL.inc();
        }
    }
}

/// Get or create the invoice for a paid, confirmed (or completed) booking.
#[instrument(skip_all, fields(booking_id = %b.id))]
pub async fn ensure_invoice<C: ConnectionTrait>(db: &C, b: &booking::Model, customer_email: &str, billing: &BillingConfig) -> Result<IssuedInvoice, ServiceError> {
    if !b.is_invoiceable() {
        return Err(ServiceError::InvalidState("an invoice is only issued for confirmed, paid bookings".into()));
    }
    if let Some(existing) = find_for_booking(db, b.id).await? {
        return Ok(IssuedInvoice { invoice: existing, created: false });
    }
    let rate_bps = i32::try_from(billing.tax_rate_bps)
        .map_err(|_| ServiceError::InvalidState("configured tax rate out of range".into()))?;
    let now = Utc::now();
    let number = invoice::new_invoice_number(now);
    let (tax, total) = money::with_tax(b.total_amount, billing.tax_rate_bps)?;
    let am = invoice::ActiveModel {
        id: Set(Uuid::new_v4()),
        booking_id: Set(b.id),
        invoice_number: Set(number.clone()),
        subtotal: Set(b.total_amount),
        tax_amount: Set(tax),
        total_amount: Set(total),
        qr_payload: Set(qr_payload(&number, b.id, total, customer_email)),
        tax_rate_bps: Set(rate_bps),
        generated_at: Set(now.into()),
        is_active: Set(true),
    };
    let created = am
        .insert(db)
        .await
        .map_err(|e| ServiceError::conflict_or_db(e, "invoice already exists"))?;
    info!(invoice_number = %created.invoice_number, total = created.total_amount, event = "invoice_generated", "invoice generated");
    Ok(IssuedInvoice { invoice: created, created: true })
}

/// Deactivate the booking's invoice and mark its completed payment refunded.
/// Returns whether an active invoice was voided.
pub(crate) async fn void_for_booking<C: ConnectionTrait>(db: &C, booking_id: Uuid) -> Result<bool, ServiceError> {
    let res = invoice::Entity::update_many()
        .set(invoice::ActiveModel { is_active: Set(false), ..Default::default() })
        .filter(invoice::Column::BookingId.eq(booking_id))
        .filter(invoice::Column::IsActive.eq(true))
        .exec(db)
        .await?;
    payment::Entity::update_many()
        .set(payment::ActiveModel {
            payment_status: Set(TransactionStatus::Refunded),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        })
        .filter(payment::Column::BookingId.eq(booking_id))
        .filter(payment::Column::PaymentStatus.eq(TransactionStatus::Completed))
        .exec(db)
        .await?;
    if res.rows_affected > 0 {
        info!(booking_id = %booking_id, event = "invoice_voided", "invoice voided");
    }
    Ok(res.rows_affected > 0)
}

/// Bookings whose invoice the actor may see: the customer's own, or any for an administrator.
async fn load_visible(db: &DatabaseConnection, actor: &Actor, booking_id: Uuid) -> Result<booking::Model, ServiceError> {
    let b = booking::Entity::find_by_id(booking_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("booking"))?;
    if !actor.is_admin() && b.customer_id != actor.user_id {
        return Err(ServiceError::not_found("booking"));
    }
    Ok(b)
}

/// The booking's invoice, generated on first access once the booking qualifies.
pub async fn get_invoice_for_user(db: &DatabaseConnection, billing: &BillingConfig, actor: &Actor, booking_id: Uuid) -> Result<InvoiceView, ServiceError> {
    let b = load_visible(db, actor, booking_id).await?;
    if let Some(inv) = find_for_booking(db, b.id).await? {
        return Ok(view(inv));
    }
    if !b.is_invoiceable() {
        return Err(ServiceError::InvalidState(
            "invoice is available once the booking is confirmed and paid".into(),
        ));
    }
    let customer = user::Entity::find_by_id(b.customer_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("customer"))?;
    let issued = ensure_invoice(db, &b, &customer.email, billing).await?;
    issued.record();
    Ok(view(issued.invoice))
}

pub async fn invoice_status(db: &DatabaseConnection, actor: &Actor, booking_id: Uuid) -> Result<InvoiceStatus, ServiceError> {
    let b = load_visible(db, actor, booking_id).await?;
    let inv = find_for_booking(db, b.id).await?;
    Ok(InvoiceStatus {
        booking_id: b.id,
        available: inv.is_some() || b.is_invoiceable(),
        invoice_number: inv.map(|i| i.invoice_number),
        booking_status: b.status,
        payment_status: b.payment_status,
    })
}

/// Resolve the printable invoice for a booking.
pub async fn build_document(db: &DatabaseConnection, billing: &BillingConfig, actor: &Actor, booking_id: Uuid) -> Result<InvoiceDocument, ServiceError> {
    let inv = get_invoice_for_user(db, billing, actor, booking_id).await?.invoice;
    let b = load_visible(db, actor, booking_id).await?;
    let customer = user::Entity::find_by_id(b.customer_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("customer"))?;
    let svc = service::Entity::find_by_id(b.service_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("service"))?;
    let provider_id = b.provider_id.unwrap_or(svc.provider_id);
    let provider_name = provider_names(db, &[provider_id]).await?.remove(&provider_id).unwrap_or_default();
    let pay = payment::Entity::find()
        .filter(payment::Column::BookingId.eq(b.id))
        .one(db)
        .await?;
    let tax_rate = stored_rate_label(&inv);

    Ok(InvoiceDocument {
        company_name: billing.company_name.clone(),
        currency: billing.currency.clone(),
        invoice_number: inv.invoice_number,
        generated_at: inv.generated_at,
        booking_id: b.id,
        booking_date: b.booking_date,
        customer_name: customer.full_name(),
        customer_email: customer.email,
        customer_phone: b.phone_number,
        service_name: svc.name,
        provider_name,
        address: b.address,
        subtotal: inv.subtotal,
        tax_amount: inv.tax_amount,
        tax_rate,
        total_amount: inv.total_amount,
        payment_method: pay.as_ref().map(|p| p.payment_method.label().to_string()),
        transaction_id: pay.map(|p| p.transaction_id).or(b.payment_intent_id),
    })
}

/// QR image for the booking's invoice.
pub async fn invoice_qr(db: &DatabaseConnection, billing: &BillingConfig, actor: &Actor, booking_id: Uuid) -> Result<String, ServiceError> {
    let inv = get_invoice_for_user(db, billing, actor, booking_id).await?;
    render_qr_svg(&inv.invoice.qr_payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{booking_input, get_db, make_service, make_user};
    use models::Role;

    /// A confirmed, paid booking that has no invoice yet.
    async fn invoiceable_booking(db: &DatabaseConnection, price: i64) -> anyhow::Result<(booking::Model, Actor)> {
        let (svc, _) = make_service(db, price).await?;
        let (_, customer) = make_user(db, Role::Customer).await?;
        let b = crate::booking::create_booking(db, &customer, svc.id, booking_input()).await?;
        let mut am: booking::ActiveModel = b.booking.into();
        am.status = Set(BookingStatus::Confirmed);
        am.is_paid = Set(true);
        am.payment_status = Set(PaymentStatus::Paid);
        Ok((am.update(db).await?, customer))
    }

    #[test]
    fn qr_payload_lines() {
        let id = Uuid::nil();
        let p = qr_payload("INV-20240101-ABCDEF12", id, 118_000, "c@x.io");
        let lines: Vec<&str> = p.lines().collect();
        assert_eq!(lines[0], "HomeService Invoice: INV-20240101-ABCDEF12");
        assert_eq!(lines[1], format!("Booking ID: {id}"));
        assert_eq!(lines[2], "Amount: \u{20b9}1180.00");
        assert_eq!(lines[3], "Customer: c@x.io");
    }

    #[tokio::test]
    async fn ensure_invoice_reports_whether_it_created() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let billing = BillingConfig::default();
        let (b, _) = invoiceable_booking(&db, 50_000).await?;

        let first = ensure_invoice(&db, &b, "c@x.io", &billing).await?;
        assert!(first.created);
        assert_eq!(first.invoice.tax_amount, 9_000);
        let second = ensure_invoice(&db, &b, "c@x.io", &billing).await?;
        assert!(!second.created);
        assert_eq!(second.invoice.id, first.invoice.id);
        Ok(())
    }

    #[tokio::test]
    async fn tax_rate_label_comes_from_the_issued_invoice() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let (b, customer) = invoiceable_booking(&db, 10_000).await?;
        let issued_at = BillingConfig { tax_rate_bps: 1250, ..Default::default() };
        let view = get_invoice_for_user(&db, &issued_at, &customer, b.id).await?;
        assert_eq!(view.tax_rate, "12.5%");
        assert_eq!(view.invoice.tax_amount, 1_250);

        let changed = BillingConfig { tax_rate_bps: 500, ..Default::default() };
        let view = get_invoice_for_user(&db, &changed, &customer, b.id).await?;
        assert_eq!(view.tax_rate, "12.5%");
        assert_eq!(view.invoice.tax_amount, 1_250);
        let doc = build_document(&db, &changed, &customer, b.id).await?;
        assert_eq!(doc.tax_rate, "12.5");
        Ok(())
    }
}
