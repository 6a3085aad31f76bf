use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::{distributions::Alphanumeric, Rng};

use crate::error::{Error, HtmlError};

pub fn hash_password(password: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            log::error!("> Failed to hash password: {e}");
            HtmlError::InternalServerError.default()
        })
}

/// `false` for a wrong password as well as for an unreadable stored hash.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let argon2 = Argon2::default();

    match PasswordHash::new(password_hash) {
        Ok(parsed_hash) => argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok(),
        Err(e) => {
            log::warn!("> Stored password hash is malformed: {e}");
            false
        }
    }
}

pub fn generate_access_token(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("poireau42").unwrap();
        assert_ne!(hash, "poireau42");
        assert!(verify_password("poireau42", &hash));
        assert!(!verify_password("poireau43", &hash));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("poireau42", "not-a-phc-string"));
    }

    #[test]
    fn access_tokens_are_alphanumeric() {
        let token = generate_access_token(32);
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, generate_access_token(32));
    }
}
