use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{AuthUser, Credentials, RegisterInput};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError>;
    /// Create the user, its password credentials and, for providers, an empty business profile.
    /// Either all rows are written or none are.
    async fn create_user(&self, input: &RegisterInput, password_hash: String, password_algorithm: String) -> Result<AuthUser, AuthError>;

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError>;
}

/// In-memory accounts keyed by lowercase email; used by unit tests, doc examples and the bench.
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Mutex, MutexGuard};

    fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>, AuthError> {
        m.lock().map_err(|_| AuthError::Repository("mock store poisoned".into()))
    }

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<HashMap<String, AuthUser>>,  // key: lowercase email
        creds: Mutex<HashMap<Uuid, Credentials>>, // key: user_id
    }

    impl MockAuthRepository {
        /// Flip `is_active` for a stored user.
        pub fn set_active(&self, email: &str, active: bool) {
            if let Ok(mut users) = self.users.lock() {
                if let Some(u) = users.get_mut(&email.to_lowercase()) {
                    u.is_active = active;
                }
            }
        }
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
            let users = lock(&self.users)?;
            Ok(users.get(&email.trim().to_lowercase()).cloned())
        }

        async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
            let users = lock(&self.users)?;
            Ok(users.values().find(|u| u.id == id).cloned())
        }

        async fn create_user(&self, input: &RegisterInput, password_hash: String, password_algorithm: String) -> Result<AuthUser, AuthError> {
            let key = input.email.trim().to_lowercase();
            let mut users = lock(&self.users)?;
            let mut creds = lock(&self.creds)?;
            if users.contains_key(&key) {
                return Err(AuthError::Conflict);
            }
            if password_hash.trim().is_empty() {
                return Err(AuthError::Validation("password hash required".into()));
            }
            let user = AuthUser {
                id: Uuid::new_v4(),
                email: key.clone(),
                first_name: input.first_name.clone(),
                last_name: input.last_name.clone(),
                role: input.role,
                is_active: true,
            };
            creds.insert(user.id, Credentials { user_id: user.id, password_hash, password_algorithm });
            users.insert(key, user.clone());
            Ok(user)
        }

        async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
            let creds = lock(&self.creds)?;
            Ok(creds.get(&user_id).cloned())
        }
    }
}
