//! Create `booking`. Status and payment status columns hold lowercase enum strings;
//! audit columns (approved/rejected/cancelled/completed) stay NULL until the transition happens.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Booking::Table)
                    .if_not_exists()
                    .col(uuid(Booking::Id).primary_key())
                    .col(uuid(Booking::CustomerId).not_null())
                    .col(uuid(Booking::ServiceId).not_null())
                    .col(uuid_null(Booking::ProviderId))
                    .col(string_len(Booking::Status, 16).not_null())
                    .col(timestamp_with_time_zone(Booking::BookingDate).not_null())
                    .col(string_len_null(Booking::StartTime, 5))
                    .col(string_len_null(Booking::EndTime, 5))
                    .col(text(Booking::Address).not_null())
                    .col(string_len(Booking::PhoneNumber, 15).not_null())
                    .col(big_integer(Booking::TotalAmount).not_null())
                    .col(string_len(Booking::PaymentStatus, 16).not_null())
                    .col(boolean(Booking::IsPaid).not_null().default(false))
                    .col(string_len_null(Booking::PaymentIntentId, 64))
                    .col(string_len(Booking::Notes, 500).not_null())
                    .col(text_null(Booking::SpecialInstructions))
                    .col(text_null(Booking::AdminNotes))
                    .col(uuid_null(Booking::ApprovedBy))
                    .col(timestamp_with_time_zone_null(Booking::ApprovedAt))
                    .col(uuid_null(Booking::RejectedBy))
                    .col(timestamp_with_time_zone_null(Booking::RejectedAt))
                    .col(string_len_null(Booking::RejectionReason, 200))
                    .col(string_len_null(Booking::CancellationReason, 200))
                    .col(timestamp_with_time_zone_null(Booking::CancellationDate))
                    .col(uuid_null(Booking::CompletedBy))
                    .col(timestamp_with_time_zone_null(Booking::CompletedAt))
                    .col(timestamp_with_time_zone(Booking::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Booking::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_customer")
                            .from(Booking::Table, Booking::CustomerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_service")
                            .from(Booking::Table, Booking::ServiceId)
                            .to(Service::Table, Service::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_provider")
                            .from(Booking::Table, Booking::ProviderId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Booking::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Booking {
    Table,
    Id,
    CustomerId,
    ServiceId,
    ProviderId,
    Status,
    BookingDate,
    StartTime,
    EndTime,
    Address,
    PhoneNumber,
    TotalAmount,
    PaymentStatus,
    IsPaid,
    PaymentIntentId,
    Notes,
    SpecialInstructions,
    AdminNotes,
    ApprovedBy,
    ApprovedAt,
    RejectedBy,
    RejectedAt,
    RejectionReason,
    CancellationReason,
    CancellationDate,
    CompletedBy,
    CompletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User { Table, Id }

#[derive(DeriveIden)]
enum Service { Table, Id }
