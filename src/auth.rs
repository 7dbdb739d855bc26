//! Registration and login.
//!
//! Passwords are stored as `<salt-hex>$<digest-hex>` where the digest is
//! `SHA-256(salt || password)` over a 16-byte OS-random salt. Verification
//! recomputes the digest from the stored salt; unknown users and wrong
//! passwords are indistinguishable to the caller.

use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::storage::{NewUser, StorageError, Store, User};

const SALT_LEN: usize = 16;

/// Hash `password` with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    format!("{}${}", hex::encode(salt), digest_hex(&salt, password))
}

/// Check `password` against a stored `<salt-hex>$<digest-hex>` value.
///
/// Malformed stored values never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    digest_hex(&salt, password) == digest
}

fn digest_hex(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Profile fields accepted at registration time.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub full_name: Option<String>,
    pub age: Option<u32>,
    /// Defaults to the service's configured location when the client omits it.
    pub location: String,
}

/// Hash the password and insert the user.
/// Fails with [`StorageError::DuplicateUsername`] when the name is taken.
pub fn create_user(store: &Store, reg: Registration) -> Result<User, StorageError> {
    store.create_user(NewUser {
        username: reg.username,
        hashed_password: hash_password(&reg.password),
        full_name: reg.full_name,
        age: reg.age,
        location: reg.location,
    })
}

/// Look up `username` and check the password.
/// Returns `None` for unknown users and wrong passwords alike.
pub fn authenticate(
    store: &Store,
    username: &str,
    password: &str,
) -> Result<Option<User>, StorageError> {
    let Some(user) = store.user_by_username(username)? else {
        return Ok(None);
    };
    if verify_password(password, &user.hashed_password) {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verify_round_trip() {
        let stored = hash_password("chambo&nsima");
        assert!(verify_password("chambo&nsima", &stored));
        assert!(!verify_password("wrong", &stored));
    }

    #[test]
    fn each_hash_gets_a_fresh_salt() {
        let a = hash_password("same-password");
        let b = hash_password("same-password");
        assert_ne!(a, b);
        assert!(verify_password("same-password", &a));
        assert!(verify_password("same-password", &b));
    }

    #[test]
    fn malformed_stored_value_never_verifies() {
        assert!(!verify_password("pw", ""));
        assert!(!verify_password("pw", "no-separator"));
        assert!(!verify_password("pw", "zz-not-hex$deadbeef"));
    }

    fn registration(username: &str) -> Registration {
        Registration {
            username: username.to_string(),
            password: "secret".to_string(),
            full_name: Some("Grace Banda".to_string()),
            age: Some(34),
            location: "Malawi".to_string(),
        }
    }

    #[test]
    fn register_then_authenticate() {
        let store = Store::open_in_memory().unwrap();
        let created = create_user(&store, registration("grace")).unwrap();
        assert_ne!(created.hashed_password, "secret");

        let user = authenticate(&store, "grace", "secret").unwrap();
        assert_eq!(user.map(|u| u.id), Some(created.id));
    }

    #[test]
    fn wrong_password_and_unknown_user_both_yield_none() {
        let store = Store::open_in_memory().unwrap();
        create_user(&store, registration("grace")).unwrap();

        assert!(authenticate(&store, "grace", "nope").unwrap().is_none());
        assert!(authenticate(&store, "ghost", "secret").unwrap().is_none());
    }

    #[test]
    fn duplicate_registration_rejected() {
        let store = Store::open_in_memory().unwrap();
        create_user(&store, registration("grace")).unwrap();
        let err = create_user(&store, registration("grace")).unwrap_err();
        assert!(matches!(err, StorageError::DuplicateUsername(_)));
    }
}
