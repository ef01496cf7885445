use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServiceImage::Table)
                    .if_not_exists()
                    .col(uuid(ServiceImage::Id).primary_key())
                    .col(uuid(ServiceImage::ServiceId).not_null())
                    .col(string_len(ServiceImage::ImageUrl, 500).not_null())
                    .col(string_len(ServiceImage::Caption, 200).not_null())
                    .col(boolean(ServiceImage::IsPrimary).not_null().default(false))
                    .col(integer(ServiceImage::SortOrder).not_null().default(0))
                    .col(timestamp_with_time_zone(ServiceImage::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_image_service")
                            .from(ServiceImage::Table, ServiceImage::ServiceId)
                            .to(Service::Table, Service::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ServiceImage::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ServiceImage { Table, Id, ServiceId, ImageUrl, Caption, IsPrimary, SortOrder, CreatedAt }

#[derive(DeriveIden)]
enum Service { Table, Id }
