/// Persistence contract for TaskVault
///
/// The core never assumes a concrete storage engine. Everything it needs is
/// expressed as four primitive shapes — find-by-id, find-one-by-predicate,
/// save, delete-many-by-predicate — plus unique-constraint enforcement on
/// the user email. Two engines implement the contract:
///
/// - [`postgres::PgStore`]: the production engine (sqlx/PostgreSQL)
/// - [`memory::MemStore`]: an in-process engine backing the test suite
///
/// Ownership scoping lives in the predicates themselves: a task lookup
/// takes a [`TaskPredicate`] carrying both the task id and the caller's id,
/// so a task that exists but belongs to someone else is never loaded into
/// memory in the first place.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::task::Task;
use crate::models::user::User;
use crate::query::TaskQuery;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint was violated (the constrained field is named)
    #[error("unique constraint violated on {0}")]
    Duplicate(&'static str),

    /// Any other backend failure
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Ownership-scoped task lookup predicate
///
/// Both halves are mandatory; there is no way to look a task up by id
/// alone. A miss on either half yields the same "not found".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskPredicate {
    pub id: Uuid,
    pub owner_id: Uuid,
}

impl TaskPredicate {
    pub fn owned(id: Uuid, owner_id: Uuid) -> Self {
        Self { id, owner_id }
    }
}

/// Store contract for user records
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Looks a user up by id
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Looks a user up by (normalized) email
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Looks a user up by id *and* live session token in one predicate
    ///
    /// This is the authentication gate's lookup: a revoked token misses
    /// here even though its signature still verifies.
    async fn find_user_by_session(
        &self,
        id: Uuid,
        token: &str,
    ) -> Result<Option<User>, StoreError>;

    /// Persists a user record (insert or full update by id)
    ///
    /// Returns [`StoreError::Duplicate`] when the email collides with
    /// another user.
    async fn save_user(&self, user: &User) -> Result<(), StoreError>;

    /// Deletes a user record; returns whether anything was deleted
    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Store contract for task records
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Looks a single task up through its ownership predicate
    async fn find_task(&self, predicate: &TaskPredicate) -> Result<Option<Task>, StoreError>;

    /// Lists tasks matching an owner-scoped query
    async fn list_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>, StoreError>;

    /// Persists a task record (insert or full update by id)
    async fn save_task(&self, task: &Task) -> Result<(), StoreError>;

    /// Deletes the task matching the predicate, returning it if it existed
    async fn delete_task(&self, predicate: &TaskPredicate)
        -> Result<Option<Task>, StoreError>;

    /// Deletes every task owned by `owner_id`; returns the count removed
    async fn delete_tasks_by_owner(&self, owner_id: Uuid) -> Result<u64, StoreError>;
}
