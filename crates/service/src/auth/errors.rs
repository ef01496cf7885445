use thiserror::Error;

/// Failures of registration, login and token handling.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("an account with this email already exists")]
    Conflict,
    #[error("account not found")]
    NotFound,
    #[error("invalid email or password")]
    Unauthorized,
    #[error("this account has been deactivated")]
    Inactive,
    #[error("password hashing failed: {0}")]
    HashError(String),
    #[error("session token error: {0}")]
    TokenError(String),
    #[error("account storage error: {0}")]
    Repository(String),
}

impl AuthError {
    /// Numeric code written to logs next to the message.
    pub fn code(&self) -> u16 {
        match self {
            Self::Validation(_) => 1001,
            Self::Conflict => 1002,
            Self::NotFound => 1003,
            Self::Unauthorized => 1004,
            Self::Inactive => 1005,
            Self::HashError(_) => 1101,
            Self::TokenError(_) => 1102,
            Self::Repository(_) => 1200,
        }
    }

    /// Errors the caller can fix by changing the request.
    pub fn is_client_error(&self) -> bool {
        self.code() < 1100
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_failures_are_not_client_errors() {
        assert!(AuthError::Inactive.is_client_error());
        assert!(!AuthError::Repository("db down".into()).is_client_error());
        assert_eq!(AuthError::Conflict.to_string(), "an account with this email already exists");
    }
}
