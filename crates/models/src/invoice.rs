use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::booking;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoice")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub booking_id: Uuid,
    #[sea_orm(unique)]
    pub invoice_number: String,
    pub subtotal: i64,
    pub tax_amount: i64,
    pub total_amount: i64,
    /// Basis points applied when the invoice was issued.
    pub tax_rate_bps: i32,
    pub qr_payload: String,
    pub generated_at: DateTimeWithTimeZone,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Booking }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Booking => Entity::belongs_to(booking::Entity)
                .from(Column::BookingId)
                .to(booking::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// `INV-YYYYMMDD-XXXXXXXX` with 8 uppercase hex characters.
pub fn new_invoice_number(at: DateTime<Utc>) -> String {
    let hex = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("INV-{}-{}", at.format("%Y%m%d"), &hex[..8])
}
