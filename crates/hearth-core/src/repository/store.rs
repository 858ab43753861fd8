use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::{RecurringPattern, TaskInstance};
use crate::store::PatternStore;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::pool::PoolConnection;
use sqlx::Sqlite;
use uuid::Uuid;

/// A [`PatternStore`] over one SQLite write transaction.
///
/// The transaction is opened with `BEGIN IMMEDIATE`, so the write lock is
/// taken before the first read. Concurrent units of work queue on the busy
/// timeout instead of failing with `SQLITE_BUSY` when a read-then-write
/// transaction tries to upgrade its lock.
///
/// Nothing is visible to other connections until [`commit`](Self::commit).
/// Dropping the unit of work without committing closes its connection,
/// which rolls everything back.
pub struct SqliteUnitOfWork {
    conn: PoolConnection<Sqlite>,
    committed: bool,
}

impl SqliteUnitOfWork {
    pub async fn begin(pool: &DbPool) -> Result<Self, CoreError> {
        let mut conn = pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
        Ok(Self {
            conn,
            committed: false,
        })
    }

    pub async fn commit(mut self) -> Result<(), CoreError> {
        sqlx::query("COMMIT").execute(&mut *self.conn).await?;
        self.committed = true;
        Ok(())
    }

    /// Reads an instance through this transaction, seeing its own writes.
    pub async fn find_instance(&mut self, id: Uuid) -> Result<Option<TaskInstance>, CoreError> {
        let instance = sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(instance)
    }
}

impl Drop for SqliteUnitOfWork {
    fn drop(&mut self) {
        // An open transaction must never go back to the pool.
        if !self.committed {
            self.conn.close_on_drop();
        }
    }
}

fn encode_by_day(by_day: &Option<Vec<i32>>) -> Result<Option<String>, CoreError> {
    Ok(by_day.as_ref().map(serde_json::to_string).transpose()?)
}

#[async_trait]
impl PatternStore for SqliteUnitOfWork {
    async fn find_pattern(&mut self, id: Uuid) -> Result<Option<RecurringPattern>, CoreError> {
        let pattern = sqlx::query_as("SELECT * FROM recurring_patterns WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(pattern)
    }

    async fn insert_pattern(&mut self, pattern: &RecurringPattern) -> Result<(), CoreError> {
        sqlx::query(
            r#"INSERT INTO recurring_patterns (
                id, family_id, title, description, frequency, interval, by_day,
                start_time_hour, start_time_minute, duration_minutes, start_date, end_date,
                default_assignee_id, created_by_id, is_active, last_generated_until,
                metadata, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)"#,
        )
        .bind(pattern.id)
        .bind(pattern.family_id)
        .bind(&pattern.title)
        .bind(&pattern.description)
        .bind(pattern.frequency)
        .bind(pattern.interval)
        .bind(encode_by_day(&pattern.by_day)?)
        .bind(pattern.start_time_hour)
        .bind(pattern.start_time_minute)
        .bind(pattern.duration_minutes)
        .bind(pattern.start_date)
        .bind(pattern.end_date)
        .bind(pattern.default_assignee_id)
        .bind(pattern.created_by_id)
        .bind(pattern.is_active)
        .bind(pattern.last_generated_until)
        .bind(serde_json::to_string(&pattern.metadata)?)
        .bind(pattern.created_at)
        .bind(pattern.updated_at)
        .execute(&mut *self.conn)
        .await?;
        Ok(())
    }

    async fn save_pattern(&mut self, pattern: &RecurringPattern) -> Result<bool, CoreError> {
        let result = sqlx::query(
            r#"UPDATE recurring_patterns SET
                family_id = $1, title = $2, description = $3, frequency = $4, interval = $5,
                by_day = $6, start_time_hour = $7, start_time_minute = $8, duration_minutes = $9,
                start_date = $10, end_date = $11, default_assignee_id = $12, created_by_id = $13,
                is_active = $14, last_generated_until = $15, metadata = $16, updated_at = $17
            WHERE id = $18"#,
        )
        .bind(pattern.family_id)
        .bind(&pattern.title)
        .bind(&pattern.description)
        .bind(pattern.frequency)
        .bind(pattern.interval)
        .bind(encode_by_day(&pattern.by_day)?)
        .bind(pattern.start_time_hour)
        .bind(pattern.start_time_minute)
        .bind(pattern.duration_minutes)
        .bind(pattern.start_date)
        .bind(pattern.end_date)
        .bind(pattern.default_assignee_id)
        .bind(pattern.created_by_id)
        .bind(pattern.is_active)
        .bind(pattern.last_generated_until)
        .bind(serde_json::to_string(&pattern.metadata)?)
        .bind(pattern.updated_at)
        .bind(pattern.id)
        .execute(&mut *self.conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_pattern_active(
        &mut self,
        id: Uuid,
        active: bool,
        now: NaiveDateTime,
    ) -> Result<bool, CoreError> {
        let result = sqlx::query("UPDATE recurring_patterns SET is_active = $1, updated_at = $2 WHERE id = $3")
            .bind(active)
            .bind(now)
            .bind(id)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_generation_cursor(
        &mut self,
        id: Uuid,
        until: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Result<(), CoreError> {
        let result = sqlx::query(
            "UPDATE recurring_patterns SET last_generated_until = $1, updated_at = $2 WHERE id = $3",
        )
        .bind(until)
        .bind(now)
        .bind(id)
        .execute(&mut *self.conn)
        .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Recurring pattern with id {} not found", id)));
        }
        Ok(())
    }

    async fn delete_pattern(&mut self, id: Uuid) -> Result<bool, CoreError> {
        // The foreign key cascades too, but only when the connection has
        // foreign keys switched on.
        sqlx::query("DELETE FROM tasks WHERE recurring_pattern_id = $1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        let result = sqlx::query("DELETE FROM recurring_patterns WHERE id = $1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn instance_exists(
        &mut self,
        pattern_id: Uuid,
        occurrence_date: NaiveDate,
    ) -> Result<bool, CoreError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM tasks WHERE recurring_pattern_id = $1 AND occurrence_date = $2)",
        )
        .bind(pattern_id)
        .bind(occurrence_date)
        .fetch_one(&mut *self.conn)
        .await?;
        Ok(exists)
    }

    async fn insert_instance(&mut self, instance: &TaskInstance) -> Result<(), CoreError> {
        let result = sqlx::query(
            r#"INSERT INTO tasks (
                id, family_id, recurring_pattern_id, occurrence_date, title, description,
                assignee_id, created_by_id, status, due_at, completed_at, metadata,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)"#,
        )
        .bind(instance.id)
        .bind(instance.family_id)
        .bind(instance.pattern_id)
        .bind(instance.occurrence_date)
        .bind(&instance.title)
        .bind(&instance.description)
        .bind(instance.assignee_id)
        .bind(instance.created_by_id)
        .bind(instance.status)
        .bind(instance.due_at)
        .bind(instance.completed_at)
        .bind(serde_json::to_string(&instance.metadata)?)
        .bind(instance.created_at)
        .bind(instance.updated_at)
        .execute(&mut *self.conn)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                match (instance.pattern_id, instance.occurrence_date) {
                    (Some(pattern_id), Some(occurrence_date)) => Err(CoreError::DuplicateOccurrence {
                        pattern_id,
                        occurrence_date,
                    }),
                    _ => Err(CoreError::Database(sqlx::Error::Database(db))),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_open_instances_due_from(
        &mut self,
        pattern_id: Uuid,
        now: NaiveDateTime,
    ) -> Result<u64, CoreError> {
        let result = sqlx::query(
            r#"DELETE FROM tasks
            WHERE recurring_pattern_id = $1
              AND status IN ('todo', 'in_progress')
              AND due_at IS NOT NULL
              AND due_at >= $2"#,
        )
        .bind(pattern_id)
        .bind(now)
        .execute(&mut *self.conn)
        .await?;
        Ok(result.rows_affected())
    }
}
