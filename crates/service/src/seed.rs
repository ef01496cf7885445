//! Sample data for demos and local development. Running it again only fills in what is missing.
use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait};
use serde::Serialize;
use tracing::{info, instrument};

use models::{provider_profile, service, service_category, user, user_credentials, Role};

use crate::auth::hash_password;
use crate::errors::ServiceError;

pub const ADMIN_EMAIL: &str = "admin@homeservice.local";
pub const CUSTOMER_EMAIL: &str = "customer@homeservice.local";

struct SeedProvider {
    email: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    company: &'static str,
    phone: &'static str,
}

const PROVIDERS: &[SeedProvider] = &[
    SeedProvider { email: "ravi.provider@homeservice.local", first_name: "Ravi", last_name: "Kumar", company: "Kumar Home Fixes", phone: "+919800000001" },
    SeedProvider { email: "anita.provider@homeservice.local", first_name: "Anita", last_name: "Sharma", company: "Sparkle Cleaning Co", phone: "+919800000002" },
];

/// (name, slug, description)
const CATEGORIES: &[(&str, &str, &str)] = &[
    ("Plumbing", "plumbing", "Leaks, pipes, taps and water heaters"),
    ("Electrical", "electrical", "Wiring, lighting and switchboards"),
    ("Cleaning", "cleaning", "Home and kitchen deep cleaning"),
    ("Carpentry", "carpentry", "Furniture repair and fittings"),
    ("Appliance Repair", "appliance-repair", "AC, fridge and washing machine service"),
    ("Pest Control", "pest-control", "Cockroach, termite and bed bug treatment"),
];

/// (category slug, name, description, price in paise, duration hours, provider index)
const SERVICES: &[(&str, &str, &str, i64, i32, usize)] = &[
    ("plumbing", "Pipe Repair", "Repair of leaking or damaged copper, PVC and PEX pipes.", 45_000, 2, 0),
    ("plumbing", "Water Heater Repair", "Repair and maintenance of gas and electric water heaters.", 75_000, 2, 0),
    ("electrical", "Lighting Repair", "Fix broken lights and install new fixtures.", 50_000, 2, 0),
    ("electrical", "Circuit Breaker Repair", "Troubleshooting, safety checks and breaker replacement.", 60_000, 2, 0),
    ("cleaning", "Full Home Deep Cleaning", "Top to bottom cleaning of every room.", 2_50_000, 6, 1),
    ("cleaning", "Kitchen Cleaning", "Degreasing of chimney, stove, tiles and cabinets.", 1_20_000, 3, 1),
    ("carpentry", "Furniture Repair", "Fix loose joints, hinges, drawers and handles.", 55_000, 2, 0),
    ("appliance-repair", "AC Service", "Filter cleaning, gas check and cooling test.", 65_000, 1, 0),
    ("pest-control", "General Pest Control", "Odourless spray treatment for common pests.", 90_000, 2, 1),
];

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SeedReport {
    pub users_created: u32,
    pub categories_created: u32,
    pub services_created: u32,
}

#[allow(clippy::too_many_arguments)]
async fn ensure_user<C: ConnectionTrait>(
    db: &C,
    report: &mut SeedReport,
    email: &str,
    first_name: &str,
    last_name: &str,
    role: Role,
    phone: Option<&str>,
    password: &str,
) -> Result<user::Model, ServiceError> {
    if let Some(u) = user::find_by_email(db, email).await? {
        return Ok(u);
    }
    let u = user::create(db, user::NewUser { email, first_name, last_name, role, phone_number: phone }).await?;
    user_credentials::upsert_password(db, u.id, hash_password(password)?, "argon2").await?;
    report.users_created += 1;
    Ok(u)
}

/// Create the administrator, sample providers and customer, and a starter catalog.
#[instrument(skip_all)]
pub async fn seed_sample_data(db: &DatabaseConnection, admin_password: &str, sample_password: &str) -> Result<SeedReport, ServiceError> {
    if admin_password.len() < 8 || sample_password.len() < 8 {
        return Err(ServiceError::Validation("seed passwords must be at least 8 characters".into()));
    }
    let txn = db.begin().await?;
    let mut report = SeedReport::default();

    ensure_user(&txn, &mut report, ADMIN_EMAIL, "Site", "Admin", Role::Admin, None, admin_password).await?;
    ensure_user(&txn, &mut report, CUSTOMER_EMAIL, "Priya", "Nair", Role::Customer, Some("+919800000009"), sample_password).await?;

    let mut providers = Vec::with_capacity(PROVIDERS.len());
    for p in PROVIDERS {
        let u = ensure_user(&txn, &mut report, p.email, p.first_name, p.last_name, Role::Provider, Some(p.phone), sample_password).await?;
        if provider_profile::find_by_user(&txn, u.id).await?.is_none() {
            provider_profile::create_default(&txn, u.id, p.company, p.phone).await?;
        }
        providers.push(u.id);
    }

    for (name, slug, description) in CATEGORIES {
        if service_category::find_by_slug(&txn, slug).await?.is_none() {
            service_category::create(&txn, name, slug, description, None).await?;
            report.categories_created += 1;
        }
    }

    for (slug, name, description, price, hours, provider_idx) in SERVICES {
        let Some(category) = service_category::find_by_slug(&txn, slug).await? else {
            continue;
        };
        let exists = service::Entity::find()
            .filter(service::Column::CategoryId.eq(category.id))
            .filter(service::Column::Name.eq(*name))
            .one(&txn)
            .await?
            .is_some();
        if exists {
            continue;
        }
        service::create(&txn, service::NewService {
            name,
            category_id: category.id,
            provider_id: providers[*provider_idx],
            description,
            price: *price,
            duration_hours: *hours,
            image_url: None,
        })
        .await?;
        report.services_created += 1;
    }

    txn.commit().await?;
    info!(
        users = report.users_created,
        categories = report.categories_created,
        services = report.services_created,
        event = "seed_complete",
        "sample data seeded"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::domain::LoginInput;
    use crate::auth::repo::seaorm::SeaOrmAuthRepository;
    use crate::auth::service::AuthConfig;
    use crate::auth::AuthService;

    #[tokio::test]
    async fn seeding_twice_creates_nothing_new() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = crate::test_support::get_db().await?;
        let first = seed_sample_data(&db, "admin-pass-123", "sample-pass-123").await?;
        assert_eq!(first.users_created, 4);
        assert_eq!(first.categories_created, 6);
        assert_eq!(first.services_created, SERVICES.len() as u32);

        let second = seed_sample_data(&db, "admin-pass-123", "sample-pass-123").await?;
        assert_eq!(second, SeedReport::default());

        let admin = user::find_by_email(&db, ADMIN_EMAIL).await?.expect("admin seeded");
        assert_eq!(admin.role, Role::Admin);
        Ok(())
    }

    #[tokio::test]
    async fn seeded_admin_can_log_in() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = crate::test_support::get_db().await?;
        seed_sample_data(&db, "admin-pass-123", "sample-pass-123").await?;
        let repo = std::sync::Arc::new(SeaOrmAuthRepository::new(db.clone()));
        let auth = AuthService::new(repo, AuthConfig { jwt_secret: Some("test-secret".into()), ..Default::default() });
        let session = auth.login(LoginInput { email: ADMIN_EMAIL.into(), password: "admin-pass-123".into() }).await?;
        assert!(session.token.is_some());
        Ok(())
    }

    #[test]
    fn every_seed_service_has_a_category_and_provider() {
        for (slug, _, _, _, _, idx) in SERVICES {
            assert!(CATEGORIES.iter().any(|(_, s, _)| s == slug));
            assert!(*idx < PROVIDERS.len());
        }
    }
}
