//! Entity-level CRUD against a freshly migrated database.
use anyhow::Result;
use chrono::{Duration, Utc};
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, EntityTrait, ModelTrait, TransactionTrait};

use crate::{booking, enums::*, review, service, service_category, service_image, user, user_credentials};

/// Setup test database with migrations
async fn setup_test_db() -> Result<DatabaseConnection> {
    let url = std::env::var("TEST_DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());
    let mut opts = ConnectOptions::new(url);
    opts.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opts).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn unique_email(prefix: &str) -> String {
    format!("{prefix}_{}@example.com", uuid::Uuid::new_v4().simple())
}

async fn seed_service(db: &DatabaseConnection) -> Result<(user::Model, service::Model)> {
    let provider = user::create(db, user::NewUser {
        email: &unique_email("provider"),
        first_name: "Ravi",
        last_name: "Kumar",
        role: Role::Provider,
        phone_number: Some("+919800000001"),
    })
    .await?;
    let slug = format!("plumbing-{}", &uuid::Uuid::new_v4().simple().to_string()[..6]);
    let category = service_category::create(db, &format!("Plumbing {slug}"), &slug, "Pipes", None).await?;
    let svc = service::create(db, service::NewService {
        name: "Tap repair",
        category_id: category.id,
        provider_id: provider.id,
        description: "Fix leaking taps",
        price: 49_900,
        duration_hours: 1,
        image_url: None,
    })
    .await?;
    Ok((provider, svc))
}

#[tokio::test]
async fn test_user_create_normalizes_email() -> Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let db = setup_test_db().await?;
    let email = unique_email("MiXeD").to_uppercase();
    let u = user::create(&db, user::NewUser {
        email: &email,
        first_name: " Asha ",
        last_name: "",
        role: Role::Customer,
        phone_number: None,
    })
    .await?;
    assert_eq!(u.email, email.to_lowercase());
    assert_eq!(u.full_name(), "Asha");

    let found = user::find_by_email(&db, &email).await?;
    assert_eq!(found.map(|f| f.id), Some(u.id));

    let creds = user_credentials::upsert_password(&db, u.id, "hash-1".into(), "argon2").await?;
    let again = user_credentials::upsert_password(&db, u.id, "hash-2".into(), "argon2").await?;
    assert_eq!(creds.id, again.id);
    assert_eq!(again.password_hash, "hash-2");
    Ok(())
}

#[tokio::test]
async fn test_user_rejects_bad_input() -> Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let db = setup_test_db().await?;
    let res = user::create(&db, user::NewUser {
        email: "not-an-email",
        first_name: "A",
        last_name: "B",
        role: Role::Customer,
        phone_number: None,
    })
    .await;
    assert!(matches!(res, Err(crate::errors::ModelError::Validation(_))));
    Ok(())
}

#[tokio::test]
async fn test_booking_and_review_crud() -> Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let db = setup_test_db().await?;
    let (provider, svc) = seed_service(&db).await?;
    let customer = user::create(&db, user::NewUser {
        email: &unique_email("customer"),
        first_name: "Meera",
        last_name: "Shah",
        role: Role::Customer,
        phone_number: None,
    })
    .await?;

    let b = booking::create(&db, booking::NewBooking {
        customer_id: customer.id,
        service_id: svc.id,
        provider_id: Some(provider.id),
        booking_date: (Utc::now() + Duration::days(2)).into(),
        start_time: Some("10:00"),
        end_time: Some("11:00"),
        address: "12 MG Road",
        phone_number: "+919800000002",
        total_amount: svc.price,
        notes: "Booking for Tap repair".into(),
        special_instructions: Some("  "),
    })
    .await?;
    assert_eq!(b.status, BookingStatus::Pending);
    assert_eq!(b.payment_status, PaymentStatus::Pending);
    assert!(b.special_instructions.is_none());
    assert!(!b.is_invoiceable());
    assert!(b.is_payable());

    let (_, with_service) = booking::Entity::find_by_id(b.id)
        .find_also_related(service::Entity)
        .one(&db)
        .await?
        .expect("booking row");
    assert_eq!(with_service.map(|s| s.id), Some(svc.id));

    let r = review::create(&db, b.id, customer.id, 5, "Great").await?;
    assert!(review::create(&db, b.id, customer.id, 4, "Again").await.is_err());
    r.delete(&db).await?;
    Ok(())
}

#[tokio::test]
async fn test_booking_rejects_inverted_window() -> Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let db = setup_test_db().await?;
    let (provider, svc) = seed_service(&db).await?;
    let res = booking::create(&db, booking::NewBooking {
        customer_id: provider.id,
        service_id: svc.id,
        provider_id: None,
        booking_date: Utc::now().into(),
        start_time: Some("12:00"),
        end_time: Some("11:00"),
        address: "x",
        phone_number: "+919800000002",
        total_amount: 1,
        notes: String::new(),
        special_instructions: None,
    })
    .await;
    assert!(res.is_err());
    Ok(())
}

#[tokio::test]
async fn test_service_images_ordered_and_rollback() -> Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let db = setup_test_db().await?;
    let (_, svc) = seed_service(&db).await?;
    service_image::create(&db, svc.id, "/img/b.jpg", "second", false, 2).await?;
    service_image::create(&db, svc.id, "/img/a.jpg", "first", true, 1).await?;

    let txn = db.begin().await?;
    service_image::create(&txn, svc.id, "/img/c.jpg", "discarded", false, 0).await?;
    txn.rollback().await?;

    let images = service_image::list_for_service(&db, svc.id).await?;
    let captions: Vec<_> = images.iter().map(|i| i.caption.as_str()).collect();
    assert_eq!(captions, vec!["first", "second"]);
    Ok(())
}
