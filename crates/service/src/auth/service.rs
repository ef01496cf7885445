use std::sync::Arc;

use argon2::{password_hash::{PasswordHasher, PasswordVerifier, SaltString}, Argon2, PasswordHash};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use models::Role;
use rand::rngs::OsRng;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::domain::{AuthSession, AuthUser, Claims, LoginInput, RegisterInput};
use super::errors::AuthError;
use super::repository::AuthRepository;

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
    pub password_algorithm: String,
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { jwt_secret: None, password_algorithm: "argon2".into(), token_ttl_hours: 12 }
    }
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

/// Argon2id PHC string for `password` with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::HashError(e.to_string()))?
        .to_string())
}

pub fn verify_password(password: &str, phc: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(phc).map_err(|e| AuthError::HashError(e.to_string()))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

pub fn issue_token(secret: &str, user: &AuthUser, ttl_hours: i64) -> Result<String, AuthError> {
    let exp = (chrono::Utc::now() + chrono::Duration::hours(ttl_hours)).timestamp() as usize;
    let claims = Claims { sub: user.email.clone(), uid: user.id.to_string(), role: user.role, exp };
    encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AuthError::TokenError(e.to_string()))
}

/// Verify signature and expiry of an HS256 token.
pub fn decode_token(secret: &str, token: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| AuthError::TokenError(e.to_string()))
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    /// Register a new customer or provider with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::RegisterInput;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig::default());
    /// let input = RegisterInput {
    ///     email: "User@Example.com".into(),
    ///     first_name: "Asha".into(),
    ///     last_name: "Rao".into(),
    ///     password: "Secret123".into(),
    ///     role: models::Role::Customer,
    ///     phone_number: None,
    /// };
    /// let user = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(user.email, "user@example.com");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email, role = ?input.role))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthUser, AuthError> {
        if input.password.len() < 8 {
            return Err(AuthError::Validation("password too short (>=8)".into()));
        }
        if input.role == Role::Admin {
            return Err(AuthError::Validation("admin accounts cannot be self-registered".into()));
        }
        if input.first_name.trim().is_empty() {
            return Err(AuthError::Validation("first_name required".into()));
        }
        models::validation::validate_email(&input.email).map_err(|e| AuthError::Validation(e.to_string()))?;
        if let Some(existing) = self.repo.find_user_by_email(&input.email).await? {
            debug!("user exists: {}", existing.email);
            return Err(AuthError::Conflict);
        }

        let hash = hash_password(&input.password)?;
        let user = self.repo.create_user(&input, hash, self.cfg.password_algorithm.clone()).await?;
        info!(user_id = %user.id, email = %user.email, role = user.role.as_str(), "user_registered");
        Ok(user)
    }

    /// Authenticate a user and issue a token when a secret is configured.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::{RegisterInput, LoginInput};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let cfg = AuthConfig { jwt_secret: Some("secret".into()), ..AuthConfig::default() };
    /// let svc = AuthService::new(repo.clone(), cfg);
    /// let _ = tokio_test::block_on(svc.register(RegisterInput {
    ///     email: "u@e.com".into(), first_name: "N".into(), last_name: String::new(),
    ///     password: "Passw0rd".into(), role: models::Role::Provider, phone_number: None,
    /// }));
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// let claims = service::auth::decode_token("secret", session.token.as_deref().unwrap()).unwrap();
    /// assert_eq!(claims.role, models::Role::Provider);
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = self.repo
            .find_user_by_email(&input.email)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let cred = self.repo
            .get_credentials(user.id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        if !verify_password(&input.password, &cred.password_hash)? {
            warn!(user_id = %user.id, "login_failed");
            return Err(AuthError::Unauthorized);
        }
        if !user.is_active {
            return Err(AuthError::Inactive);
        }

        let token = match &self.cfg.jwt_secret {
            Some(secret) => Some(issue_token(secret, &user, self.cfg.token_ttl_hours)?),
            None => None,
        };
        info!(user_id = %user.id, "user_logged_in");
        Ok(AuthSession { user, token })
    }

    /// Current state of the account behind a verified token.
    pub async fn current_user(&self, id: Uuid) -> Result<AuthUser, AuthError> {
        let user = self.repo.find_user_by_id(id).await?.ok_or(AuthError::NotFound)?;
        if !user.is_active {
            return Err(AuthError::Inactive);
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::mock::MockAuthRepository;

    fn svc() -> (Arc<MockAuthRepository>, AuthService<MockAuthRepository>) {
        let repo = Arc::new(MockAuthRepository::default());
        let cfg = AuthConfig { jwt_secret: Some("unit-secret".into()), ..AuthConfig::default() };
        (repo.clone(), AuthService::new(repo, cfg))
    }

    fn input(email: &str, role: Role) -> RegisterInput {
        RegisterInput {
            email: email.into(),
            first_name: "Kiran".into(),
            last_name: "Das".into(),
            password: "longenough".into(),
            role,
            phone_number: None,
        }
    }

    #[tokio::test]
    async fn register_rejects_short_password_and_admin_role() {
        let (_, svc) = svc();
        let mut short = input("a@b.co", Role::Customer);
        short.password = "short".into();
        assert!(matches!(svc.register(short).await, Err(AuthError::Validation(_))));
        assert!(matches!(svc.register(input("a@b.co", Role::Admin)).await, Err(AuthError::Validation(_))));
        assert!(matches!(svc.register(input("bad-email", Role::Customer)).await, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn register_stores_credentials_with_the_account() {
        let (repo, svc) = svc();
        let user = svc.register(input("creds@example.com", Role::Provider)).await.unwrap();
        let creds = repo.get_credentials(user.id).await.unwrap().unwrap();
        assert_eq!(creds.password_algorithm, "argon2");
        assert!(verify_password("longenough", &creds.password_hash).unwrap());
    }

    #[tokio::test]
    async fn duplicate_email_conflicts_case_insensitively() {
        let (_, svc) = svc();
        svc.register(input("dup@example.com", Role::Customer)).await.unwrap();
        let err = svc.register(input("DUP@example.com", Role::Customer)).await.unwrap_err();
        assert_eq!(err.code(), 1002);
    }

    #[tokio::test]
    async fn login_issues_decodable_token() {
        let (_, svc) = svc();
        let user = svc.register(input("login@example.com", Role::Customer)).await.unwrap();
        let session = svc
            .login(LoginInput { email: "login@example.com".into(), password: "longenough".into() })
            .await
            .unwrap();
        let claims = decode_token("unit-secret", session.token.as_deref().unwrap()).unwrap();
        assert_eq!(claims.uid, user.id.to_string());
        assert_eq!(claims.role, Role::Customer);
        assert!(decode_token("other-secret", session.token.as_deref().unwrap()).is_err());
    }

    #[tokio::test]
    async fn wrong_password_and_inactive_account_are_rejected() {
        let (repo, svc) = svc();
        svc.register(input("x@example.com", Role::Customer)).await.unwrap();
        let bad = svc.login(LoginInput { email: "x@example.com".into(), password: "nope-nope".into() }).await;
        assert!(matches!(bad, Err(AuthError::Unauthorized)));

        repo.set_active("x@example.com", false);
        let inactive = svc.login(LoginInput { email: "x@example.com".into(), password: "longenough".into() }).await;
        assert!(matches!(inactive, Err(AuthError::Inactive)));
    }

    #[test]
    fn expired_token_fails_validation() {
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: "e@x.io".into(),
            first_name: "E".into(),
            last_name: String::new(),
            role: Role::Admin,
            is_active: true,
        };
        let token = issue_token("s", &user, -2).unwrap();
        assert!(decode_token("s", &token).is_err());
    }
}
