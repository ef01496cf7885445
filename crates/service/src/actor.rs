use models::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;

/// The authenticated caller of a service operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: Uuid, role: Role) -> Self { Self { user_id, role } }

    pub fn is_admin(&self) -> bool { self.role == Role::Admin }

    pub fn require(&self, role: Role) -> Result<(), ServiceError> {
        if self.role != role {
            return Err(ServiceError::Forbidden(format!("{} access required", role.as_str())));
        }
        Ok(())
    }

    pub fn require_admin(&self) -> Result<(), ServiceError> { self.require(Role::Admin) }
}
