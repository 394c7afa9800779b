/// In-memory store engine
///
/// Implements the full persistence contract over two mutexed hash maps.
/// Used by the test suites so that ownership, revocation and cascade
/// semantics can be exercised without a running database. Not intended
/// for production use.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::task::Task;
use crate::models::user::User;
use crate::query::{SortDirection, SortField, TaskQuery};

use super::{StoreError, TaskPredicate, TaskStore, UserStore};

/// In-process implementation of [`UserStore`] and [`TaskStore`]
#[derive(Default)]
pub struct MemStore {
    users: Mutex<HashMap<Uuid, User>>,
    tasks: Mutex<HashMap<Uuid, Task>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_users(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, User>> {
        self.users.lock().expect("user map poisoned")
    }

    fn lock_tasks(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Task>> {
        self.tasks.lock().expect("task map poisoned")
    }
}

#[async_trait]
impl UserStore for MemStore {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.lock_users().get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .lock_users()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_user_by_session(
        &self,
        id: Uuid,
        token: &str,
    ) -> Result<Option<User>, StoreError> {
        Ok(self
            .lock_users()
            .get(&id)
            .filter(|u| u.has_token(token))
            .cloned())
    }

    async fn save_user(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.lock_users();
        let collision = users
            .values()
            .any(|u| u.id != user.id && u.email == user.email);
        if collision {
            return Err(StoreError::Duplicate("email"));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.lock_users().remove(&id).is_some())
    }
}

#[async_trait]
impl TaskStore for MemStore {
    async fn find_task(&self, predicate: &TaskPredicate) -> Result<Option<Task>, StoreError> {
        Ok(self
            .lock_tasks()
            .get(&predicate.id)
            .filter(|t| t.owner_id == predicate.owner_id)
            .cloned())
    }

    async fn list_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>, StoreError> {
        let mut matched: Vec<Task> = self
            .lock_tasks()
            .values()
            .filter(|t| t.owner_id == query.owner_id)
            .filter(|t| query.completed.map_or(true, |c| t.is_completed == c))
            .cloned()
            .collect();

        // Default ordering is creation time, mirroring the SQL engine
        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        if let Some(spec) = query.sort {
            matched.sort_by(|a, b| {
                let ordering = match spec.field {
                    SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                    SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                    SortField::Description => a.description.cmp(&b.description),
                    SortField::Completed => a.is_completed.cmp(&b.is_completed),
                };
                match spec.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        let skip = query.skip.unwrap_or(0) as usize;
        let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        Ok(matched.into_iter().skip(skip).take(limit).collect())
    }

    async fn save_task(&self, task: &Task) -> Result<(), StoreError> {
        self.lock_tasks().insert(task.id, task.clone());
        Ok(())
    }

    async fn delete_task(
        &self,
        predicate: &TaskPredicate,
    ) -> Result<Option<Task>, StoreError> {
        let mut tasks = self.lock_tasks();
        let matches = tasks
            .get(&predicate.id)
            .is_some_and(|t| t.owner_id == predicate.owner_id);
        Ok(if matches {
            tasks.remove(&predicate.id)
        } else {
            None
        })
    }

    async fn delete_tasks_by_owner(&self, owner_id: Uuid) -> Result<u64, StoreError> {
        let mut tasks = self.lock_tasks();
        let before = tasks.len();
        tasks.retain(|_, t| t.owner_id != owner_id);
        Ok((before - tasks.len()) as u64)
    }
}
