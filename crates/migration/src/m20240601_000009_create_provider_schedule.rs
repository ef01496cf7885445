use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProviderSchedule::Table)
                    .if_not_exists()
                    .col(uuid(ProviderSchedule::Id).primary_key())
                    .col(uuid(ProviderSchedule::ProviderId).not_null())
                    .col(string_len(ProviderSchedule::Day, 10).not_null())
                    .col(string_len(ProviderSchedule::StartTime, 5).not_null())
                    .col(string_len(ProviderSchedule::EndTime, 5).not_null())
                    .col(boolean(ProviderSchedule::IsAvailable).not_null().default(true))
                    .col(timestamp_with_time_zone(ProviderSchedule::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(ProviderSchedule::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_provider_schedule_user")
                            .from(ProviderSchedule::Table, ProviderSchedule::ProviderId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProviderSchedule::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ProviderSchedule { Table, Id, ProviderId, Day, StartTime, EndTime, IsAvailable, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum User { Table, Id }
