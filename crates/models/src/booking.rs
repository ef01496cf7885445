use chrono::Utc;
use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::{BookingStatus, PaymentStatus};
use crate::errors::{invalid, ModelError};
use crate::{service, user, validation};

/// A customer's request for a service. `total_amount` is the tax-exclusive
/// service price captured at booking time, in paise.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "booking")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub customer_id: Uuid,
    pub service_id: Uuid,
    pub provider_id: Option<Uuid>,
    pub status: BookingStatus,
    pub booking_date: DateTimeWithTimeZone,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub address: String,
    pub phone_number: String,
    pub total_amount: i64,
    pub payment_status: PaymentStatus,
    pub is_paid: bool,
    pub payment_intent_id: Option<String>,
    pub notes: String,
    pub special_instructions: Option<String>,
    pub admin_notes: Option<String>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTimeWithTimeZone>,
    pub rejected_by: Option<Uuid>,
    pub rejected_at: Option<DateTimeWithTimeZone>,
    pub rejection_reason: Option<String>,
    pub cancellation_reason: Option<String>,
    pub cancellation_date: Option<DateTimeWithTimeZone>,
    pub completed_by: Option<Uuid>,
    pub completed_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Customer,
    Service,
    Provider,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Customer => Entity::belongs_to(user::Entity)
                .from(Column::CustomerId)
                .to(user::Column::Id)
                .into(),
            Relation::Service => Entity::belongs_to(service::Entity)
                .from(Column::ServiceId)
                .to(service::Column::Id)
                .into(),
            Relation::Provider => Entity::belongs_to(user::Entity)
                .from(Column::ProviderId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<service::Entity> for Entity {
    fn to() -> RelationDef { Relation::Service.def() }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Paid and approved (or already delivered): the only state in which an invoice may exist.
    pub fn is_invoiceable(&self) -> bool {
        self.is_paid && matches!(self.status, BookingStatus::Confirmed | BookingStatus::Completed)
    }

    pub fn is_payable(&self) -> bool {
        self.status.is_open() && !self.is_paid
    }
}

#[derive(Debug, Clone)]
pub struct NewBooking<'a> {
    pub customer_id: Uuid,
    pub service_id: Uuid,
    pub provider_id: Option<Uuid>,
    pub booking_date: DateTimeWithTimeZone,
    pub start_time: Option<&'a str>,
    pub end_time: Option<&'a str>,
    pub address: &'a str,
    pub phone_number: &'a str,
    pub total_amount: i64,
    pub notes: String,
    pub special_instructions: Option<&'a str>,
}

pub async fn create<C: ConnectionTrait>(db: &C, new: NewBooking<'_>) -> Result<Model, ModelError> {
    validation::validate_required("address", new.address, 1000)?;
    validation::validate_phone(new.phone_number)?;
    validation::validate_max_len("notes", &new.notes, validation::MAX_NOTES)?;
    if new.total_amount < 0 {
        return Err(invalid("total_amount must be non-negative"));
    }
    if let (Some(s), Some(e)) = (new.start_time, new.end_time) {
        validation::validate_time_window(s, e)?;
    }
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        customer_id: Set(new.customer_id),
        service_id: Set(new.service_id),
        provider_id: Set(new.provider_id),
        status: Set(BookingStatus::Pending),
        booking_date: Set(new.booking_date),
        start_time: Set(new.start_time.map(str::to_string)),
        end_time: Set(new.end_time.map(str::to_string)),
        address: Set(new.address.trim().to_string()),
        phone_number: Set(new.phone_number.trim().to_string()),
        total_amount: Set(new.total_amount),
        payment_status: Set(PaymentStatus::Pending),
        is_paid: Set(false),
        payment_intent_id: Set(None),
        notes: Set(new.notes),
        special_instructions: Set(new.special_instructions.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())),
        admin_notes: Set(None),
        approved_by: Set(None),
        approved_at: Set(None),
        rejected_by: Set(None),
        rejected_at: Set(None),
        rejection_reason: Set(None),
        cancellation_reason: Set(None),
        cancellation_date: Set(None),
        completed_by: Set(None),
        completed_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}
