/// Account orchestration: registration, credential checks, profile
/// updates, avatar storage and cascading account deletion.
///
/// Password hashing is an explicit step in the save path, never a
/// lifecycle hook: `register` hashes once before the insert, and
/// `update_profile` re-hashes only when the change set actually contains a
/// password. Hashing and verification run on the blocking pool so the
/// CPU-bound work factor does not stall unrelated requests.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::password;
use crate::error::{CoreError, CoreResult};
use crate::models::user::{NewAccount, ProfileUpdate, User};
use crate::store::{StoreError, TaskStore, UserStore};

/// Credential store and account lifecycle coordinator
#[derive(Clone)]
pub struct Accounts {
    users: Arc<dyn UserStore>,
    tasks: Arc<dyn TaskStore>,
}

impl Accounts {
    pub fn new(users: Arc<dyn UserStore>, tasks: Arc<dyn TaskStore>) -> Self {
        Self { users, tasks }
    }

    /// Registers a new account
    ///
    /// Validation runs before any mutation is attempted. On success the
    /// password is hashed with Argon2id and the plaintext is dropped; the
    /// persisted record never contains it. An email collision surfaces as
    /// a field-level validation error.
    pub async fn register(&self, account: NewAccount) -> CoreResult<User> {
        let account = account.normalized();
        account.validate()?;

        let plaintext = account.password.clone();
        let password_hash = hash_on_blocking_pool(plaintext).await?;

        let user = User::new(&account, password_hash);
        self.save_user_mapping_duplicates(&user).await?;

        info!(user_id = %user.id, "account registered");
        Ok(user)
    }

    /// Applies a profile change set limited to {name, email, password, age}
    ///
    /// The stored hash is recomputed only when the change set contains a
    /// password; repeated saves of an unchanged profile never re-hash.
    pub async fn update_profile(&self, mut user: User, changes: ProfileUpdate) -> CoreResult<User> {
        let changes = changes.normalized();
        changes.validate()?;

        if let Some(plaintext) = changes.password.clone() {
            user.password_hash = hash_on_blocking_pool(plaintext).await?;
        }
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(age) = changes.age {
            user.age = age;
        }

        user.touch();
        self.save_user_mapping_duplicates(&user).await?;

        Ok(user)
    }

    /// Resolves an email/password pair to a user
    ///
    /// Fails with a single undifferentiated variant: an unknown email and a
    /// wrong password are indistinguishable, so accounts cannot be
    /// enumerated through the login form.
    pub async fn find_by_credentials(&self, email: &str, pass: &str) -> CoreResult<User> {
        let email = email.trim().to_lowercase();
        let user = self
            .users
            .find_user_by_email(&email)
            .await?
            .ok_or(CoreError::Unauthenticated)?;

        let hash = user.password_hash.clone();
        let candidate = pass.to_string();
        let matched = tokio::task::spawn_blocking(move || password::verify_password(&candidate, &hash))
            .await
            .map_err(|e| StoreError::Backend(format!("hashing task failed: {e}")))?
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        if !matched {
            return Err(CoreError::Unauthenticated);
        }

        Ok(user)
    }

    /// Stores the avatar blob on the latest persisted record
    pub async fn set_avatar(&self, user_id: Uuid, bytes: Vec<u8>) -> CoreResult<()> {
        let mut user = self
            .users
            .find_user_by_id(user_id)
            .await?
            .ok_or(CoreError::NotFound)?;

        user.avatar = Some(bytes);
        user.touch();
        self.users.save_user(&user).await?;
        Ok(())
    }

    /// Clears the avatar blob
    pub async fn clear_avatar(&self, user_id: Uuid) -> CoreResult<()> {
        let mut user = self
            .users
            .find_user_by_id(user_id)
            .await?
            .ok_or(CoreError::NotFound)?;

        user.avatar = None;
        user.touch();
        self.users.save_user(&user).await?;
        Ok(())
    }

    /// Deletes an account and every task it owns
    ///
    /// Best-effort two-step sequence: dependent tasks first, then the user
    /// record. The steps are not wrapped in a transaction; a crash between
    /// them can leave a user with no tasks. Tasks owned by anyone else are
    /// untouched by construction of the delete predicate.
    pub async fn delete_account(&self, user: &User) -> CoreResult<()> {
        let removed = self.tasks.delete_tasks_by_owner(user.id).await?;
        self.users.delete_user(user.id).await?;

        debug!(user_id = %user.id, tasks_removed = removed, "account deleted");
        Ok(())
    }

    async fn save_user_mapping_duplicates(&self, user: &User) -> CoreResult<()> {
        match self.users.save_user(user).await {
            Ok(()) => Ok(()),
            Err(StoreError::Duplicate("email")) => {
                Err(CoreError::invalid("email", "Email is already in use"))
            }
            Err(other) => Err(other.into()),
        }
    }
}

async fn hash_on_blocking_pool(plaintext: String) -> CoreResult<String> {
    tokio::task::spawn_blocking(move || password::hash_password(&plaintext))
        .await
        .map_err(|e| StoreError::Backend(format!("hashing task failed: {e}")))?
        .map_err(|e| StoreError::Backend(e.to_string()).into())
}
