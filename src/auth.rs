//! Admin accounts. Passwords are stored only as Argon2id PHC strings.

use crate::error::{ResultError, StoreResult};
use crate::model::Admin;
use crate::store::EntityStore;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn hash_password(password: &str) -> StoreResult<String> {
    // 16 random bytes from a v4 UUID.
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
        .map_err(|e| ResultError::Io(anyhow::anyhow!("salt encoding failed: {e}")))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ResultError::Io(anyhow::anyhow!("password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub fn create_admin<S: EntityStore>(
    store: &S,
    username: &str,
    password: &str,
    name: &str,
    email: Option<&str>,
) -> StoreResult<String> {
    if username.trim().is_empty() || name.trim().is_empty() {
        return Err(ResultError::bad_params("username and name are required"));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ResultError::bad_params(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    let hash = hash_password(password)?;
    let id = store.insert_admin(username.trim(), &hash, name.trim(), email)?;
    tracing::info!(admin_id = %id, username, "admin created");
    Ok(id)
}

/// Checks a username/password pair and returns the matching admin.
pub fn verify_admin<S: EntityStore>(store: &S, username: &str, password: &str) -> StoreResult<Admin> {
    let Some(creds) = store.admin_credentials(username)? else {
        return Err(ResultError::InvalidCredentials);
    };
    if !verify_password(password, &creds.password_hash) {
        tracing::warn!(username, "admin password rejected");
        return Err(ResultError::InvalidCredentials);
    }
    Ok(creds.admin)
}

/// Creates the configured default admin when no admin exists yet.
pub fn seed_default_admin<S: EntityStore>(
    store: &S,
    username: &str,
    password: &str,
) -> StoreResult<bool> {
    if store.count_admins()? > 0 {
        return Ok(false);
    }
    create_admin(store, username, password, "Administrator", None)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::memory_conn;
    use crate::store::SqliteStore;

    #[test]
    fn hash_round_trip() {
        let hash = hash_password("s3cret-pass").expect("hash");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cret-pass", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("s3cret-pass", "not a phc string"));
    }

    #[test]
    fn verify_admin_rejects_unknown_and_wrong_password() {
        let conn = memory_conn();
        let store = SqliteStore::new(&conn);
        create_admin(&store, "head", "teacher1", "Head Teacher", None).expect("create");

        let admin = verify_admin(&store, "head", "teacher1").expect("verify");
        assert_eq!(admin.name, "Head Teacher");
        assert!(matches!(
            verify_admin(&store, "head", "nope"),
            Err(ResultError::InvalidCredentials)
        ));
        assert!(matches!(
            verify_admin(&store, "ghost", "teacher1"),
            Err(ResultError::InvalidCredentials)
        ));
    }

    #[test]
    fn seeding_only_happens_once() {
        let conn = memory_conn();
        let store = SqliteStore::new(&conn);
        assert!(seed_default_admin(&store, "admin1", "admin123").expect("seed"));
        assert!(!seed_default_admin(&store, "admin2", "admin123").expect("seed"));
        assert_eq!(store.list_admins().expect("list").len(), 1);
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let conn = memory_conn();
        let store = SqliteStore::new(&conn);
        create_admin(&store, "head", "teacher1", "Head", None).expect("create");
        assert!(matches!(
            create_admin(&store, "head", "teacher2", "Other", None),
            Err(ResultError::DuplicateUsername)
        ));
    }
}
