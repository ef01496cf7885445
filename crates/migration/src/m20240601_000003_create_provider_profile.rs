//! Create `provider_profile`: business details for users with the provider role.
//! `rating` is stored in hundredths (0..=500).
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProviderProfile::Table)
                    .if_not_exists()
                    .col(uuid(ProviderProfile::Id).primary_key())
                    .col(uuid(ProviderProfile::UserId).unique_key().not_null())
                    .col(string_len(ProviderProfile::CompanyName, 200).not_null())
                    .col(text(ProviderProfile::BusinessDescription).not_null())
                    .col(text(ProviderProfile::Address).not_null())
                    .col(string_len(ProviderProfile::PhoneNumber, 15).not_null())
                    .col(integer(ProviderProfile::Rating).not_null().default(0))
                    .col(integer(ProviderProfile::TotalReviews).not_null().default(0))
                    .col(boolean(ProviderProfile::IsVerified).not_null().default(false))
                    .col(boolean(ProviderProfile::IsAvailable).not_null().default(true))
                    .col(timestamp_with_time_zone(ProviderProfile::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(ProviderProfile::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_provider_profile_user")
                            .from(ProviderProfile::Table, ProviderProfile::UserId)
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
            .drop_table(Table::drop().table(ProviderProfile::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ProviderProfile {
    Table,
    Id,
    UserId,
    CompanyName,
    BusinessDescription,
    Address,
    PhoneNumber,
    Rating,
    TotalReviews,
    IsVerified,
    IsAvailable,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User { Table, Id }
