/// User model and account input types
///
/// A user record carries the credential hash, the live session token set and
/// an optional avatar blob. None of those three ever leave the backend: the
/// only serializable representation is [`UserView`], which omits them by
/// construction ([`User`] itself does not implement `Serialize`).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     age BIGINT NOT NULL DEFAULT 0,
///     password_hash VARCHAR(255) NOT NULL,
///     tokens TEXT[] NOT NULL DEFAULT '{}',
///     avatar BYTEA,
///     created_at TIMESTAMPTZ NOT NULL,
///     updated_at TIMESTAMPTZ NOT NULL
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::ValidateEmail;

use crate::auth::password;
use crate::error::{CoreError, CoreResult, FieldError};

/// User record
///
/// Passwords are stored as Argon2id hashes, never in plaintext. The `tokens`
/// vector is the live session set: a bearer token is only accepted while it
/// is present here, regardless of its cryptographic validity.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Display name (trimmed, non-empty)
    pub name: String,

    /// Email address (lowercased, unique across all users)
    pub email: String,

    /// Age in years (never negative)
    pub age: i64,

    /// Argon2id password hash in PHC string format
    pub password_hash: String,

    /// Live session tokens (multi-device; one entry per active session)
    pub tokens: Vec<String>,

    /// Optional avatar image bytes, stored verbatim
    pub avatar: Option<Vec<u8>>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Public representation of a user
///
/// Always omits the password hash, the session token set and the avatar
/// blob, regardless of how the underlying record was loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub age: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a new account
///
/// The plaintext `password` lives only until it is hashed; the record that
/// gets persisted never contains it.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub age: i64,
    pub password: String,
}

/// Fields a user may change about their own profile
///
/// Anything outside this set is rejected during deserialization
/// (`deny_unknown_fields`), before any mutation is attempted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub age: Option<i64>,
}

impl NewAccount {
    /// Trims name/email/password and lowercases the email
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        self.password = self.password.trim().to_string();
        self
    }

    /// Validates every field, collecting all failures
    ///
    /// Checked rules:
    /// - name must be non-empty after trimming
    /// - email must be a well-formed address
    /// - age must not be negative
    /// - password must satisfy [`password::validate_password_rules`]
    pub fn validate(&self) -> CoreResult<()> {
        let mut errors = Vec::new();

        if self.name.is_empty() {
            errors.push(FieldError::new("name", "Name is required"));
        }
        if !self.email.validate_email() {
            errors.push(FieldError::new("email", "Email is invalid"));
        }
        if self.age < 0 {
            errors.push(FieldError::new("age", "Age must be a positive number"));
        }
        if let Err(message) = password::validate_password_rules(&self.password) {
            errors.push(FieldError::new("password", message));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(errors))
        }
    }
}

impl ProfileUpdate {
    /// Trims and lowercases whichever fields are present
    pub fn normalized(mut self) -> Self {
        if let Some(name) = self.name.take() {
            self.name = Some(name.trim().to_string());
        }
        if let Some(email) = self.email.take() {
            self.email = Some(email.trim().to_lowercase());
        }
        if let Some(pw) = self.password.take() {
            self.password = Some(pw.trim().to_string());
        }
        self
    }

    /// Validates the fields present in the change set
    pub fn validate(&self) -> CoreResult<()> {
        let mut errors = Vec::new();

        if matches!(self.name.as_deref(), Some("")) {
            errors.push(FieldError::new("name", "Name is required"));
        }
        if let Some(email) = self.email.as_deref() {
            if !email.validate_email() {
                errors.push(FieldError::new("email", "Email is invalid"));
            }
        }
        if let Some(age) = self.age {
            if age < 0 {
                errors.push(FieldError::new("age", "Age must be a positive number"));
            }
        }
        if let Some(pw) = self.password.as_deref() {
            if let Err(message) = password::validate_password_rules(pw) {
                errors.push(FieldError::new("password", message));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(errors))
        }
    }

    /// True when the change set contains a new password
    pub fn changes_password(&self) -> bool {
        self.password.is_some()
    }
}

impl User {
    /// Builds a fresh user record from validated registration input
    ///
    /// `password_hash` must already be the Argon2id hash; this constructor
    /// never sees plaintext.
    pub fn new(account: &NewAccount, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: account.name.clone(),
            email: account.email.clone(),
            age: account.age,
            password_hash,
            tokens: Vec::new(),
            avatar: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Public view of this user (no hash, no tokens, no avatar)
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            age: self.age,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Whether `token` is in the live session set
    pub fn has_token(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// Bumps the update timestamp; call before saving a mutation
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
