/// PostgreSQL store engine
///
/// Production implementation of the persistence contract on top of sqlx.
/// Ownership scoping is pushed into the SQL predicates themselves
/// (`WHERE id = $1 AND owner_id = $2`), so a foreign task never reaches
/// process memory.
///
/// # Example
///
/// ```no_run
/// use taskvault_shared::store::postgres::{connect, PgStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = connect(&std::env::var("DATABASE_URL")?, 10).await?;
/// let store = PgStore::new(pool);
/// # Ok(())
/// # }
/// ```

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::task::Task;
use crate::models::user::User;
use crate::query::TaskQuery;

use super::{StoreError, TaskPredicate, TaskStore, UserStore};

const USER_COLUMNS: &str =
    "id, name, email, age, password_hash, tokens, avatar, created_at, updated_at";
const TASK_COLUMNS: &str = "id, description, is_completed, owner_id, created_at, updated_at";

/// Creates and health-checks a PostgreSQL connection pool
///
/// # Errors
///
/// Returns an error if the URL is invalid or the database is unreachable.
pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    debug!("connecting to PostgreSQL (max_connections={})", max_connections);

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Some(Duration::from_secs(600)))
        .test_before_acquire(true)
        .connect(url)
        .await?;

    // Fail fast on a pool that cannot serve queries
    sqlx::query("SELECT 1").execute(&pool).await?;
    info!("database pool ready");

    Ok(pool)
}

/// PostgreSQL implementation of [`UserStore`] and [`TaskStore`]
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if let Some(constraint) = db_err.constraint() {
                if constraint.contains("email") {
                    return StoreError::Duplicate("email");
                }
            }
        }
        StoreError::Backend(err.to_string())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_session(
        &self,
        id: Uuid,
        token: &str,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND $2 = ANY(tokens)"
        ))
        .bind(id)
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn save_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, age, password_hash, tokens, avatar,
                               created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                age = EXCLUDED.age,
                password_hash = EXCLUDED.password_hash,
                tokens = EXCLUDED.tokens,
                avatar = EXCLUDED.avatar,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.age)
        .bind(&user.password_hash)
        .bind(&user.tokens)
        .bind(user.avatar.as_deref())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn find_task(&self, predicate: &TaskPredicate) -> Result<Option<Task>, StoreError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND owner_id = $2"
        ))
        .bind(predicate.id)
        .bind(predicate.owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    async fn list_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>, StoreError> {
        // Build the statement dynamically based on which constraints are
        // present; sort columns come from an enum, never from raw input
        let mut sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE owner_id = $1");
        let mut bind_count = 1;

        if query.completed.is_some() {
            bind_count += 1;
            sql.push_str(&format!(" AND is_completed = ${bind_count}"));
        }

        match query.sort {
            Some(spec) => sql.push_str(&format!(
                " ORDER BY {} {}",
                spec.field.column(),
                spec.direction.keyword()
            )),
            None => sql.push_str(" ORDER BY created_at ASC"),
        }

        if query.limit.is_some() {
            bind_count += 1;
            sql.push_str(&format!(" LIMIT ${bind_count}"));
        }
        if query.skip.is_some() {
            bind_count += 1;
            sql.push_str(&format!(" OFFSET ${bind_count}"));
        }

        let mut q = sqlx::query_as::<_, Task>(&sql).bind(query.owner_id);
        if let Some(completed) = query.completed {
            q = q.bind(completed);
        }
        if let Some(limit) = query.limit {
            q = q.bind(limit);
        }
        if let Some(skip) = query.skip {
            q = q.bind(skip);
        }

        let tasks = q.fetch_all(&self.pool).await?;

        Ok(tasks)
    }

    async fn save_task(&self, task: &Task) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO tasks (id, description, is_completed, owner_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                description = EXCLUDED.description,
                is_completed = EXCLUDED.is_completed,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(task.id)
        .bind(&task.description)
        .bind(task.is_completed)
        .bind(task.owner_id)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_task(
        &self,
        predicate: &TaskPredicate,
    ) -> Result<Option<Task>, StoreError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "DELETE FROM tasks WHERE id = $1 AND owner_id = $2 RETURNING {TASK_COLUMNS}"
        ))
        .bind(predicate.id)
        .bind(predicate.owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    async fn delete_tasks_by_owner(&self, owner_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE owner_id = $1")
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
