use mongodb::bson::doc;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{
    api::admin::AdminCredentials,
    mongodb::{is_duplicate_key_error, Coll},
};

/// Seeded on first launch so a fresh deployment can be administered.
pub const DEFAULT_ADMIN_ID: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// An admin user, as stored in the database.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admin {
    #[serde(rename = "_id")]
    pub admin_id: String,
    pub password_hash: String,
}

impl Admin {
    /// Check whether the given password is correct.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> Result<bool> {
        Ok(argon2::verify_encoded(
            &self.password_hash,
            password.as_ref(),
        )?)
    }
}

/// Insert the default admin if there are no admins at all.
pub async fn ensure_admin_exists(admins: &Coll<Admin>) -> Result<()> {
    if admins.count_documents(None, None).await? > 0 {
        return Ok(());
    }

    let admin = Admin::try_from(AdminCredentials {
        admin_id: DEFAULT_ADMIN_ID.to_string(),
        password: DEFAULT_ADMIN_PASSWORD.to_string(),
    })?;
    match admins.insert_one(&admin, None).await {
        Ok(_) => {
            warn!("No admins found, created default admin '{DEFAULT_ADMIN_ID}'; change its password");
            Ok(())
        }
        // Another instance seeded it first.
        Err(e) if is_duplicate_key_error(&e) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl Admin {
        /// `coordinator` / `dreamteam2025`.
        pub fn example() -> Self {
            Admin::try_from(AdminCredentials::example()).unwrap()
        }
    }
}
