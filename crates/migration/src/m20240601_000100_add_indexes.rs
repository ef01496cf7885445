use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Service: lookups by category and by provider
        manager
            .create_index(
                Index::create()
                    .name("idx_service_category")
                    .table(Service::Table)
                    .col(Service::CategoryId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_service_provider")
                    .table(Service::Table)
                    .col(Service::ProviderId)
                    .to_owned(),
            )
            .await?;

        // ServiceImage: gallery ordering
        manager
            .create_index(
                Index::create()
                    .name("idx_service_image_order")
                    .table(ServiceImage::Table)
                    .col(ServiceImage::ServiceId)
                    .col(ServiceImage::SortOrder)
                    .to_owned(),
            )
            .await?;

        // Booking: per-customer history, per-provider queues, admin status filters
        manager
            .create_index(
                Index::create()
                    .name("idx_booking_customer")
                    .table(Booking::Table)
                    .col(Booking::CustomerId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_booking_provider_status")
                    .table(Booking::Table)
                    .col(Booking::ProviderId)
                    .col(Booking::Status)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_booking_status_created")
                    .table(Booking::Table)
                    .col(Booking::Status)
                    .col(Booking::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ProviderSchedule: one entry per provider and weekday
        manager
            .create_index(
                Index::create()
                    .name("uniq_provider_schedule_day")
                    .table(ProviderSchedule::Table)
                    .col(ProviderSchedule::ProviderId)
                    .col(ProviderSchedule::Day)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_service_category").table(Service::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_service_provider").table(Service::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_service_image_order").table(ServiceImage::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_booking_customer").table(Booking::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_booking_provider_status").table(Booking::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_booking_status_created").table(Booking::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("uniq_provider_schedule_day").table(ProviderSchedule::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Service { Table, CategoryId, ProviderId }

#[derive(DeriveIden)]
enum ServiceImage { Table, ServiceId, SortOrder }

#[derive(DeriveIden)]
enum Booking { Table, CustomerId, ProviderId, Status, CreatedAt }

#[derive(DeriveIden)]
enum ProviderSchedule { Table, ProviderId, Day }
