//! Create `invoice`: one-to-one with `booking`, amounts in paise.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Invoice::Table)
                    .if_not_exists()
                    .col(uuid(Invoice::Id).primary_key())
                    .col(uuid(Invoice::BookingId).unique_key().not_null())
                    .col(string_len(Invoice::InvoiceNumber, 50).unique_key().not_null())
                    .col(big_integer(Invoice::Subtotal).not_null())
                    .col(big_integer(Invoice::TaxAmount).not_null())
                    .col(big_integer(Invoice::TotalAmount).not_null())
                    .col(integer(Invoice::TaxRateBps).not_null().default(1800))
                    .col(text(Invoice::QrPayload).not_null())
                    .col(timestamp_with_time_zone(Invoice::GeneratedAt).not_null())
                    .col(boolean(Invoice::IsActive).not_null().default(true))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_invoice_booking")
                            .from(Invoice::Table, Invoice::BookingId)
                            .to(Booking::Table, Booking::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Invoice::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Invoice {
    Table,
    Id,
    BookingId,
    InvoiceNumber,
    Subtotal,
    TaxAmount,
    TotalAmount,
    TaxRateBps,
    QrPayload,
    GeneratedAt,
    IsActive,
}

#[derive(DeriveIden)]
enum Booking { Table, Id }
