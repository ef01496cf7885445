#![cfg(test)]
use chrono::{Duration, Utc};
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tokio::sync::OnceCell;
use uuid::Uuid;

use models::{service, service_category, user, Role};

use crate::Actor;

// Shared databases are migrated only once across the entire test process
static MIGRATED: OnceCell<()> = OnceCell::const_new();

/// A migrated database for one test.
///
/// Without `TEST_DATABASE_URL` every call gets its own in-memory SQLite database,
/// so tests never see each other's rows.
pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        let mut opts = ConnectOptions::new("sqlite::memory:");
        opts.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opts).await?;
        migration::Migrator::up(&db, None).await?;
        return Ok(db);
    };

    MIGRATED
        .get_or_init(|| async {
            let db = Database::connect(url.as_str()).await.expect("connect db for migration");
            migration::Migrator::up(&db, None).await.expect("migrate up");
            drop(db);
        })
        .await;

    // Return a fresh connection for the current test's runtime
    let mut opts = ConnectOptions::new(url);
    opts.max_connections(5).min_connections(1).acquire_timeout(std::time::Duration::from_secs(10));
    Ok(Database::connect(opts).await?)
}

pub async fn make_user(db: &DatabaseConnection, role: Role) -> anyhow::Result<(user::Model, Actor)> {
    let email = format!("{}_{}@example.com", role.as_str(), Uuid::new_v4().simple());
    let u = user::create(db, user::NewUser {
        email: &email,
        first_name: "Test",
        last_name: role.as_str(),
        role,
        phone_number: Some("+919812345678"),
    })
    .await?;
    if role == Role::Provider {
        models::provider_profile::create_default(db, u.id, "Test Services Co", "+919812345678").await?;
    }
    let actor = Actor::new(u.id, role);
    Ok((u, actor))
}

/// Category plus one active service priced at `price` paise, owned by a new provider.
pub async fn make_service(db: &DatabaseConnection, price: i64) -> anyhow::Result<(service::Model, Actor)> {
    let (_, provider) = make_user(db, Role::Provider).await?;
    let slug = format!("cat-{}", &Uuid::new_v4().simple().to_string()[..8]);
    let category = service_category::create(db, &slug, &slug, "test category", None).await?;
    let svc = service::create(db, service::NewService {
        name: "Deep Cleaning",
        category_id: category.id,
        provider_id: provider.user_id,
        description: "Whole-home cleaning",
        price,
        duration_hours: 3,
        image_url: None,
    })
    .await?;
    Ok((svc, provider))
}

pub fn booking_input() -> crate::booking::BookingInput {
    crate::booking::BookingInput {
        booking_date: Utc::now() + Duration::days(3),
        start_time: Some("10:00".into()),
        end_time: Some("13:00".into()),
        address: "221B Park Street, Kolkata".into(),
        phone_number: "+919876543210".into(),
        special_instructions: Some("Ring twice".into()),
    }
}
