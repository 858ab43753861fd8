use crate::error::CoreError;
use crate::models::{TaskInstance, TaskStatus};
use crate::repository::{short_id_pattern, SqliteRepository};
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite};
use tracing::debug;
use uuid::Uuid;

#[async_trait]
impl super::InstanceRepository for SqliteRepository {
    async fn find_instance_by_id(&self, id: Uuid) -> Result<Option<TaskInstance>, CoreError> {
        let instance = sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(instance)
    }

    async fn find_instances_by_short_id(&self, short_id: &str) -> Result<Vec<TaskInstance>, CoreError> {
        let pattern = short_id_pattern(short_id)?;
        let instances = sqlx::query_as(
            "SELECT * FROM tasks WHERE lower(hex(id)) LIKE $1 ORDER BY due_at, created_at",
        )
        .bind(pattern)
        .fetch_all(self.pool())
        .await?;
        Ok(instances)
    }

    async fn find_instances_for_pattern(
        &self,
        pattern_id: Uuid,
        include_completed: bool,
    ) -> Result<Vec<TaskInstance>, CoreError> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM tasks WHERE recurring_pattern_id = ");
        qb.push_bind(pattern_id);
        if !include_completed {
            qb.push(" AND status != ");
            qb.push_bind(TaskStatus::Done);
        }
        qb.push(" ORDER BY occurrence_date");

        let instances = qb.build_query_as().fetch_all(self.pool()).await?;
        Ok(instances)
    }

    async fn set_instance_status(&self, id: Uuid, status: TaskStatus) -> Result<TaskInstance, CoreError> {
        let now = self.lifecycle().now();
        // completed_at records the first completion only
        let instance: Option<TaskInstance> = sqlx::query_as(
            r#"UPDATE tasks SET
                status = $1,
                completed_at = CASE WHEN $2 AND completed_at IS NULL THEN $3 ELSE completed_at END,
                updated_at = $4
            WHERE id = $5
            RETURNING *"#,
        )
        .bind(status)
        .bind(status == TaskStatus::Done)
        .bind(now)
        .bind(now)
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        let instance =
            instance.ok_or_else(|| CoreError::NotFound(format!("Task with id {} not found", id)))?;
        debug!(task_id = %id, %status, "task status changed");
        Ok(instance)
    }

    async fn complete_instance(&self, id: Uuid) -> Result<TaskInstance, CoreError> {
        self.set_instance_status(id, TaskStatus::Done).await
    }

    async fn find_overdue_instances(&self, family_id: Option<Uuid>) -> Result<Vec<TaskInstance>, CoreError> {
        let now = self.lifecycle().now();
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT * FROM tasks WHERE status IN ('todo', 'in_progress') AND due_at IS NOT NULL AND due_at < ",
        );
        qb.push_bind(now);
        if let Some(family_id) = family_id {
            qb.push(" AND family_id = ");
            qb.push_bind(family_id);
        }
        qb.push(" ORDER BY due_at");

        let instances = qb.build_query_as().fetch_all(self.pool()).await?;
        Ok(instances)
    }
}
