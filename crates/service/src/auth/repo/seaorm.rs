use sea_orm::{DatabaseConnection, EntityTrait, TransactionTrait};
use uuid::Uuid;

use models::errors::ModelError;
use models::{provider_profile, user, user_credentials, Role};

use crate::auth::domain::{AuthUser, Credentials, RegisterInput};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmAuthRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

fn map_model_err(e: ModelError) -> AuthError {
    match e {
        ModelError::Validation(m) => AuthError::Validation(m),
        ModelError::Db(m) if m.to_lowercase().contains("unique") => AuthError::Conflict,
        ModelError::Db(m) => AuthError::Repository(m),
    }
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        let res = user::find_by_email(&self.db, email).await.map_err(map_model_err)?;
        Ok(res.map(AuthUser::from))
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
        let res = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(AuthUser::from))
    }

    async fn create_user(&self, input: &RegisterInput, password_hash: String, password_algorithm: String) -> Result<AuthUser, AuthError> {
        let txn = self.db.begin().await.map_err(|e| AuthError::Repository(e.to_string()))?;
        let created = user::create(&txn, user::NewUser {
            email: &input.email,
            first_name: &input.first_name,
            last_name: &input.last_name,
            role: input.role,
            phone_number: input.phone_number.as_deref(),
        })
        .await
        .map_err(map_model_err)?;
        user_credentials::upsert_password(&txn, created.id, password_hash, &password_algorithm)
            .await
            .map_err(map_model_err)?;
        if created.role == Role::Provider {
            let phone = input.phone_number.as_deref().unwrap_or_default();
            provider_profile::create_default(&txn, created.id, "", phone)
                .await
                .map_err(map_model_err)?;
        }
        txn.commit().await.map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(created.into())
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
        let res = user_credentials::find_for_user(&self.db, user_id).await.map_err(map_model_err)?;
        Ok(res.map(|c| Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(email: &str, role: Role) -> RegisterInput {
        RegisterInput {
            email: email.into(),
            first_name: "Meera".into(),
            last_name: "Iyer".into(),
            password: "longenough".into(),
            role,
            phone_number: Some("9876543210".into()),
        }
    }

    #[tokio::test]
    async fn create_user_stores_credentials_with_the_user() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let repo = SeaOrmAuthRepository::new(crate::test_support::get_db().await?);
        let email = format!("{}@example.com", Uuid::new_v4().simple());
        let user = repo.create_user(&input(&email, Role::Provider), "hash".into(), "argon2".into()).await?;
        let creds = repo.get_credentials(user.id).await?.map(|c| c.password_algorithm);
        assert_eq!(creds.as_deref(), Some("argon2"));
        Ok(())
    }

    #[tokio::test]
    async fn failed_credential_write_leaves_no_user() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let repo = SeaOrmAuthRepository::new(crate::test_support::get_db().await?);
        let email = format!("{}@example.com", Uuid::new_v4().simple());
        let res = repo.create_user(&input(&email, Role::Customer), "  ".into(), "argon2".into()).await;
        assert!(matches!(res, Err(AuthError::Validation(_))));
        assert!(repo.find_user_by_email(&email).await?.is_none());
        Ok(())
    }
}
