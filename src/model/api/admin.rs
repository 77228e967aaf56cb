use argon2::Config;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::db::admin::Admin;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Raw admin credentials, received from a user. These are never stored directly,
/// since the password is in plaintext.
#[derive(Clone, Deserialize, Serialize)]
pub struct AdminCredentials {
    pub admin_id: String,
    pub password: String,
}

/// A request to replace an admin's password.
#[derive(Clone, Deserialize, Serialize)]
pub struct CredentialsChange {
    pub admin_id: String,
    pub old_password: String,
    pub new_password: String,
}

impl TryFrom<AdminCredentials> for Admin {
    type Error = Error;

    /// Convert [`AdminCredentials`] to an [`Admin`] by hashing the password.
    /// This enforces that the ID is non-empty, and the password meets minimum length.
    fn try_from(cred: AdminCredentials) -> Result<Self> {
        if cred.admin_id.trim().is_empty() {
            return Err(Error::Validation("Admin ID is required".to_string()));
        }
        if cred.password.len() < MIN_PASSWORD_LENGTH {
            return Err(Error::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        // 16 bytes is recommended for password hashing:
        //  https://en.wikipedia.org/wiki/Argon2
        let mut salt = [0_u8; 16];
        rand::thread_rng().fill(&mut salt);
        let password_hash =
            argon2::hash_encoded(cred.password.as_bytes(), &salt, &Config::default())?;
        Ok(Self {
            admin_id: cred.admin_id.trim().to_string(),
            password_hash,
        })
    }
}
