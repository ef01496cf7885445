use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::booking;
use crate::enums::{PaymentMethod, TransactionStatus};

/// Simulated payment for a booking. `amount` is tax inclusive, in paise.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub booking_id: Uuid,
    pub payment_method: PaymentMethod,
    pub amount: i64,
    pub payment_status: TransactionStatus,
    #[sea_orm(unique)]
    pub transaction_id: String,
    pub gateway_response: Option<String>,
    pub paid_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
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

/// `TXN-` followed by 12 uppercase hex characters.
pub fn new_transaction_id() -> String {
    let hex = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("TXN-{}", &hex[..12])
}

#[cfg(test)]
mod tests {
    use super::new_transaction_id;

    #[test]
    fn transaction_id_shape() {
        let id = new_transaction_id();
        assert_eq!(id.len(), 16);
        assert!(id.starts_with("TXN-"));
        assert!(id[4..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        assert_ne!(id, new_transaction_id());
    }
}
