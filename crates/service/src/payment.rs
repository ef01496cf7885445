//! Simulated payments. No gateway is contacted; the outcome is decided by the request.
use chrono::Utc;
use configs::BillingConfig;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use models::{booking, invoice, money, payment, user, BookingStatus, PaymentMethod, PaymentStatus, TransactionStatus};

use crate::errors::ServiceError;
use crate::{booking as booking_svc, invoice as invoice_svc, Actor};

#[derive(Debug, Clone, Serialize)]
pub struct MethodOption {
    pub code: PaymentMethod,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentQuote {
    pub booking_id: Uuid,
    pub subtotal: i64,
    pub tax_rate_bps: u32,
    pub tax_rate: String,
    pub tax: i64,
    pub total: i64,
    pub subtotal_display: String,
    pub tax_display: String,
    pub total_display: String,
    pub methods: Vec<MethodOption>,
    pub already_paid: bool,
    pub payment: Option<payment::Model>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRequest {
    pub payment_method: PaymentMethod,
    /// Force the simulated gateway to decline.
    #[serde(default)]
    pub simulate_failure: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentOutcome {
    pub success: bool,
    pub message: String,
    pub payment: payment::Model,
    pub booking: booking::Model,
    pub invoice: Option<invoice::Model>,
}

fn ensure_payable(b: &booking::Model) -> Result<(), ServiceError> {
    if b.is_paid || b.payment_status == PaymentStatus::Paid {
        return Err(ServiceError::Conflict("booking is already paid".into()));
    }
    if !b.status.is_open() {
        return Err(ServiceError::InvalidState(format!("cannot pay for a {} booking", b.status)));
    }
    Ok(())
}

/// Amount breakdown and payment options for one of the actor's bookings.
pub async fn quote(db: &DatabaseConnection, billing: &BillingConfig, actor: &Actor, booking_id: Uuid) -> Result<PaymentQuote, ServiceError> {
    let b = booking_svc::load_own(db, actor, booking_id).await?;
    let (tax, total) = money::with_tax(b.total_amount, billing.tax_rate_bps)?;
    let existing = payment::Entity::find()
        .filter(payment::Column::BookingId.eq(b.id))
        .one(db)
        .await?;
    Ok(PaymentQuote {
        booking_id: b.id,
        subtotal: b.total_amount,
        tax_rate_bps: billing.tax_rate_bps,
        tax_rate: format!("{}%", money::rate_label(billing.tax_rate_bps)),
        tax,
        total,
        subtotal_display: money::format_inr(b.total_amount),
        tax_display: money::format_inr(tax),
        total_display: money::format_inr(total),
        methods: PaymentMethod::ALL.iter().map(|m| MethodOption { code: *m, label: m.label() }).collect(),
        already_paid: b.is_paid,
        payment: existing,
    })
}

/// Run a simulated payment for the actor's booking.
///
/// Success marks the booking paid and, when it is already confirmed, issues the invoice in the
/// same transaction. Failure records the declined attempt; the customer may retry.
#[instrument(skip(db, billing, req), fields(customer = %actor.user_id, booking_id = %booking_id, method = ?req.payment_method))]
pub async fn process_payment(
    db: &DatabaseConnection,
    billing: &BillingConfig,
    actor: &Actor,
    booking_id: Uuid,
    req: PaymentRequest,
) -> Result<PaymentOutcome, ServiceError> {
    let txn = db.begin().await?;
    let b = booking_svc::load_own(&txn, actor, booking_id).await?;
    ensure_payable(&b)?;

    let (_, total) = money::with_tax(b.total_amount, billing.tax_rate_bps)?;
    let success = !req.simulate_failure;
    let now = Utc::now();
    let txn_id = payment::new_transaction_id();
    let gateway = serde_json::json!({
        "gateway": "simulated",
        "status": if success { "success" } else { "failed" },
        "transaction_id": txn_id,
        "method": req.payment_method,
        "amount": total,
        "processed_at": now.to_rfc3339(),
    })
    .to_string();
    let status = if success { TransactionStatus::Completed } else { TransactionStatus::Failed };

    let existing = payment::Entity::find()
        .filter(payment::Column::BookingId.eq(b.id))
        .one(&txn)
        .await?;
    let pay = match existing {
        Some(p) => {
            let mut am: payment::ActiveModel = p.into();
            am.payment_method = Set(req.payment_method);
            am.amount = Set(total);
            am.payment_status = Set(status);
            am.transaction_id = Set(txn_id.clone());
            am.gateway_response = Set(Some(gateway));
            am.paid_at = Set(success.then(|| now.into()));
            am.updated_at = Set(now.into());
            am.update(&txn).await?
        }
        None => {
            payment::ActiveModel {
                id: Set(Uuid::new_v4()),
                booking_id: Set(b.id),
                payment_method: Set(req.payment_method),
                amount: Set(total),
                payment_status: Set(status),
                transaction_id: Set(txn_id.clone()),
                gateway_response: Set(Some(gateway)),
                paid_at: Set(success.then(|| now.into())),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            }
            .insert(&txn)
            .await
            .map_err(|e| ServiceError::conflict_or_db(e, "payment already in progress"))?
        }
    };

    let update = if success {
        booking::ActiveModel {
            payment_status: Set(PaymentStatus::Paid),
            is_paid: Set(true),
            payment_intent_id: Set(Some(txn_id.clone())),
            updated_at: Set(now.into()),
            ..Default::default()
        }
    } else {
        booking::ActiveModel {
            payment_status: Set(PaymentStatus::Failed),
            updated_at: Set(now.into()),
            ..Default::default()
        }
    };
    let res = booking::Entity::update_many()
        .set(update)
        .filter(booking::Column::Id.eq(b.id))
        .filter(booking::Column::IsPaid.eq(false))
        .filter(booking::Column::Status.is_in([BookingStatus::Pending, BookingStatus::Confirmed]))
        .exec(&txn)
        .await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::Conflict("booking changed while paying; reload and retry".into()));
    }
    let b = booking_svc::load_own(&txn, actor, booking_id).await?;

    let issued = if success && b.status == BookingStatus::Confirmed {
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

    let outcome = if success { "success" } else { "failed" };
    common::metrics::PAYMENTS_TOTAL.with_label_values(&[outcome]).inc();
    let message = if success {
        info!(transaction_id = %txn_id, amount = total, event = "payment_completed", "payment completed");
        format!("Payment of {} completed. Transaction ID: {}", money::format_inr(total), txn_id)
    } else {
        warn!(transaction_id = %txn_id, event = "payment_failed", "simulated payment declined");
        "Payment failed. Please try again.".to_string()
    };
    Ok(PaymentOutcome { success, message, payment: pay, booking: b, invoice })
}

/// Payment record for one of the actor's bookings (administrators may read any).
pub async fn get_payment(db: &DatabaseConnection, actor: &Actor, booking_id: Uuid) -> Result<Option<payment::Model>, ServiceError> {
    if !actor.is_admin() {
        booking_svc::load_own(db, actor, booking_id).await?;
    }
    Ok(payment::Entity::find()
        .filter(payment::Column::BookingId.eq(booking_id))
        .one(db)
        .await?)
}
