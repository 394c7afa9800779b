/// Password hashing using Argon2id
///
/// Hashing uses Argon2id with a fixed work factor (64 MB memory, 3
/// iterations, 4 lanes) and a per-hash random salt. The parameters are
/// embedded in the PHC output string, so verification does not depend on
/// process configuration.
///
/// # Example
///
/// ```
/// use taskvault_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("s3cret!!")?;
/// assert!(verify_password("s3cret!!", &hash)?);
/// assert!(!verify_password("wrong", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Hashes a password with Argon2id and a random salt
///
/// The work factor is fixed: m=65536 KB, t=3, p=4, 32-byte output.
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(65536)
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a stored PHC hash
///
/// # Returns
///
/// `Ok(true)` on a match, `Ok(false)` on a mismatch.
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` if the stored hash cannot be
/// parsed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    // Parameters are embedded in the hash string
    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

/// Validates the password acceptance rules
///
/// - at least 7 characters
/// - must not contain the substring "password" in any casing
///
/// # Example
///
/// ```
/// use taskvault_shared::auth::password::validate_password_rules;
///
/// assert!(validate_password_rules("s3cret!!").is_ok());
/// assert!(validate_password_rules("short").is_err());
/// assert!(validate_password_rules("MyPassWord1").is_err());
/// ```
pub fn validate_password_rules(password: &str) -> Result<(), String> {
    if password.len() < 7 {
        return Err("Password must be at least 7 characters long".to_string());
    }

    if password.to_lowercase().contains("password") {
        return Err("Password must not contain \"password\"".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_uses_argon2id() {
        let hash = hash_password("test_secret_123").expect("Hash should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("m=65536"));
        assert!(hash.contains("t=3"));
        assert!(hash.contains("p=4"));
    }

    #[test]
    fn test_hash_password_produces_different_salts() {
        let hash1 = hash_password("same_secret").expect("Hash 1 should succeed");
        let hash2 = hash_password("same_secret").expect("Hash 2 should succeed");

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_roundtrip() {
        let hash = hash_password("correct_secret").expect("Hash should succeed");

        assert!(verify_password("correct_secret", &hash).unwrap());
        assert!(!verify_password("wrong_secret", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_verify_invalid_hash_errors() {
        assert!(verify_password("secret", "not-a-phc-string").is_err());
        assert!(verify_password("secret", "$argon2id$broken").is_err());
    }

    #[test]
    fn test_rules_reject_short_passwords() {
        let err = validate_password_rules("abc").unwrap_err();
        assert!(err.contains("at least 7"));
    }

    #[test]
    fn test_rules_reject_password_substring_any_case() {
        assert!(validate_password_rules("password123").is_err());
        assert!(validate_password_rules("PaSsWoRd123").is_err());
        assert!(validate_password_rules("xXpAsSwOrDxX").is_err());
    }

    #[test]
    fn test_rules_accept_reasonable_passwords() {
        assert!(validate_password_rules("s3cret!!").is_ok());
        assert!(validate_password_rules("red fish blue fish").is_ok());
    }
}
