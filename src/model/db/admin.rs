use std::ops::{Deref, DerefMut};

use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::{
    config::BootstrapConfig,
    error::{Error, Result},
    model::{
        common::password::{hash_password, verify_password},
        mongodb::{Coll, Id},
    },
};

/// Login identifiers starting with this (in any case) belong to admins.
pub const ADMIN_PREFIX: &str = "admin";

/// Does this login identifier name an admin rather than a voter?
pub fn is_admin_identifier(identifier: &str) -> bool {
    identifier.to_lowercase().starts_with(ADMIN_PREFIX)
}

/// Core admin user data.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCore {
    /// Always lower case, always starting with [`ADMIN_PREFIX`].
    pub username: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub date_joined: DateTime,
}

impl AdminCore {
    /// Create a new active admin, hashing the password.
    pub fn new(username: &str, password: &str) -> Result<Self> {
        let username = username.trim().to_lowercase();
        if !is_admin_identifier(&username) {
            return Err(Error::bad_request(format!(
                "Admin usernames must start with \"{ADMIN_PREFIX}\""
            )));
        }
        if password.is_empty() {
            return Err(Error::bad_request("Admin password must not be empty"));
        }
        Ok(Self {
            username,
            password_hash: hash_password(password)?,
            is_active: true,
            is_staff: true,
            date_joined: DateTime::now(),
        })
    }

    /// Check whether the given password is correct.
    pub fn verify_password(&self, password: &str) -> bool {
        verify_password(password, &self.password_hash)
    }
}

/// An admin without an ID.
pub type NewAdmin = AdminCore;

/// An admin user from the database, with its unique ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct Admin {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub admin: AdminCore,
}

impl Deref for Admin {
    type Target = AdminCore;

    fn deref(&self) -> &Self::Target {
        &self.admin
    }
}

impl DerefMut for Admin {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.admin
    }
}

/// Admins are provisioned out of band. If there are none yet and bootstrap
/// credentials are configured, create the first one from them.
///
/// This operation is idempotent.
pub async fn ensure_admin_exists(
    admins: &Coll<NewAdmin>,
    bootstrap: &BootstrapConfig,
) -> Result<()> {
    if admins.count_documents(None, None).await? > 0 {
        return Ok(());
    }

    match (&bootstrap.admin_username, &bootstrap.admin_password) {
        (Some(username), Some(password)) => {
            let admin = NewAdmin::new(username, password)?;
            admins.insert_one(&admin, None).await?;
            info!("Created first admin account \"{}\"", admin.username);
        }
        _ => warn!(
            "No admin accounts exist; set `admin_username` and `admin_password` to create one"
        ),
    }
    Ok(())
}


#[cfg(test)]
pub use examples::EXAMPLE_PASSWORD;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_prefix_is_case_insensitive() {
        assert!(is_admin_identifier("admin"));
        assert!(is_admin_identifier("ADMIN_OFFICER"));
        assert!(is_admin_identifier("Administrator"));
        assert!(!is_admin_identifier("ABC1234567"));
        assert!(!is_admin_identifier("sysadmin"));
    }

    #[test]
    fn new_admin_is_normalised_and_hashed() {
        let admin = AdminCore::new("  Admin_Officer ", "secret").unwrap();
        assert_eq!(admin.username, "admin_officer");
        assert_ne!(admin.password_hash, "secret");
        assert!(admin.verify_password("secret"));
        assert!(admin.is_active);
        assert!(admin.is_staff);
    }

    #[test]
    fn new_admin_requires_prefix() {
        assert!(AdminCore::new("officer", "secret").is_err());
        assert!(AdminCore::new("admin2", "").is_err());
    }

    #[backend_test]
    async fn bootstrap_creates_first_admin_once(admins: Coll<NewAdmin>) {
        let bootstrap = BootstrapConfig {
            admin_username: Some("admin_root".to_string()),
            admin_password: Some("first-light".to_string()),
        };
        ensure_admin_exists(&admins, &bootstrap).await.unwrap();
        ensure_admin_exists(&admins, &bootstrap).await.unwrap();

        assert_eq!(admins.count_documents(None, None).await.unwrap(), 1);
        let admin = admins
            .find_one(mongodb::bson::doc! { "username": "admin_root" }, None)
            .await
            .unwrap()
            .unwrap();
        assert!(admin.verify_password("first-light"));
    }

    #[backend_test]
    async fn bootstrap_without_credentials_does_nothing(admins: Coll<NewAdmin>) {
        let bootstrap = BootstrapConfig {
            admin_username: None,
            admin_password: None,
        };
        ensure_admin_exists(&admins, &bootstrap).await.unwrap();
        assert_eq!(admins.count_documents(None, None).await.unwrap(), 0);
    }
}
