//! Create `payment`: one simulated payment record per booking.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Payment::Table)
                    .if_not_exists()
                    .col(uuid(Payment::Id).primary_key())
                    .col(uuid(Payment::BookingId).unique_key().not_null())
                    .col(string_len(Payment::PaymentMethod, 16).not_null())
                    .col(big_integer(Payment::Amount).not_null())
                    .col(string_len(Payment::PaymentStatus, 16).not_null())
                    .col(string_len(Payment::TransactionId, 100).unique_key().not_null())
                    .col(text_null(Payment::GatewayResponse))
                    .col(timestamp_with_time_zone_null(Payment::PaidAt))
                    .col(timestamp_with_time_zone(Payment::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Payment::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_booking")
                            .from(Payment::Table, Payment::BookingId)
                            .to(Booking::Table, Booking::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Payment::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Payment {
    Table,
    Id,
    BookingId,
    PaymentMethod,
    Amount,
    PaymentStatus,
    TransactionId,
    GatewayResponse,
    PaidAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Booking { Table, Id }
