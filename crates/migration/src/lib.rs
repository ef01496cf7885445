//! Migrator registering table migrations in foreign-key order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240601_000001_create_user;
mod m20240601_000002_create_user_credentials;
mod m20240601_000003_create_provider_profile;
mod m20240601_000004_create_service_category;
mod m20240601_000005_create_service;
mod m20240601_000006_create_service_image;
mod m20240601_000007_create_booking;
mod m20240601_000008_create_review;
mod m20240601_000009_create_provider_schedule;
mod m20240601_000010_create_payment;
mod m20240601_000011_create_invoice;
mod m20240601_000100_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_user::Migration),
            Box::new(m20240601_000002_create_user_credentials::Migration),
            Box::new(m20240601_000003_create_provider_profile::Migration),
            Box::new(m20240601_000004_create_service_category::Migration),
            Box::new(m20240601_000005_create_service::Migration),
            Box::new(m20240601_000006_create_service_image::Migration),
            Box::new(m20240601_000007_create_booking::Migration),
            Box::new(m20240601_000008_create_review::Migration),
            Box::new(m20240601_000009_create_provider_schedule::Migration),
            Box::new(m20240601_000010_create_payment::Migration),
            Box::new(m20240601_000011_create_invoice::Migration),
            // Indexes should always be applied last
            Box::new(m20240601_000100_add_indexes::Migration),
        ]
    }
}
