use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::error::AppError;

/// The single admin account allowed to write content.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    /// Login email, compared case-insensitively.
    pub email: String,
    /// Argon2 hash in PHC string format.
    pub password_hash: String,
}

impl AdminCredentials {
    pub fn new(email: String, password_hash: String) -> Self {
        Self { email, password_hash }
    }

    /// Whether an admin login is possible at all.
    pub fn is_configured(&self) -> bool {
        !self.email.trim().is_empty() && PasswordHash::new(&self.password_hash).is_ok()
    }

    /// Check a login attempt. Wrong email and wrong password report the same
    /// error.
    pub fn verify(&self, email: &str, password: &str) -> Result<(), AppError> {
        let invalid = || AppError::Auth("Invalid email or password".into());

        if !email.trim().eq_ignore_ascii_case(self.email.trim()) {
            return Err(invalid());
        }

        let parsed = PasswordHash::new(&self.password_hash).map_err(|e| {
            tracing::error!("Configured admin password hash is invalid: {}", e);
            invalid()
        })?;

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| invalid())
    }
}

/// Hash a password for the `admin.password_hash` setting.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> AdminCredentials {
        AdminCredentials::new(
            "office@consultancy.example".to_string(),
            hash_password("correct horse").unwrap(),
        )
    }

    #[test]
    fn test_verify_success() {
        assert!(credentials().verify("office@consultancy.example", "correct horse").is_ok());
    }

    #[test]
    fn test_email_is_case_insensitive() {
        assert!(credentials().verify(" Office@Consultancy.Example ", "correct horse").is_ok());
    }

    #[test]
    fn test_wrong_password() {
        let result = credentials().verify("office@consultancy.example", "battery staple");
        assert!(matches!(result, Err(AppError::Auth(_))));
    }

    #[test]
    fn test_wrong_email() {
        let result = credentials().verify("someone@else.example", "correct horse");
        assert!(matches!(result, Err(AppError::Auth(_))));
    }

    #[test]
    fn test_unconfigured_hash_rejects_everything() {
        let creds = AdminCredentials::new("office@consultancy.example".into(), String::new());
        assert!(!creds.is_configured());
        assert!(creds.verify("office@consultancy.example", "").is_err());
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }
}
