use crate::error::CoreError;
use crate::lifecycle::PatternGeneration;
use crate::models::{
    NewPatternData, PatternFilter, RecurringPattern, TaskInstance, UpdatePatternData,
};
use crate::repository::{short_id_pattern, SqliteRepository, SqliteUnitOfWork};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

#[async_trait]
impl super::PatternRepository for SqliteRepository {
    async fn create_pattern(&self, data: NewPatternData) -> Result<PatternGeneration, CoreError> {
        let mut uow = SqliteUnitOfWork::begin(self.pool()).await?;
        let outcome = self.lifecycle().create(&mut uow, data).await?;
        uow.commit().await?;
        Ok(outcome)
    }

    async fn find_pattern_by_id(&self, id: Uuid) -> Result<Option<RecurringPattern>, CoreError> {
        let pattern = sqlx::query_as("SELECT * FROM recurring_patterns WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(pattern)
    }

    async fn find_patterns_by_short_id(&self, short_id: &str) -> Result<Vec<RecurringPattern>, CoreError> {
        let pattern = short_id_pattern(short_id)?;
        let patterns = sqlx::query_as(
            "SELECT * FROM recurring_patterns WHERE lower(hex(id)) LIKE $1 ORDER BY created_at",
        )
        .bind(pattern)
        .fetch_all(self.pool())
        .await?;
        Ok(patterns)
    }

    async fn find_patterns(&self, filter: &PatternFilter) -> Result<Vec<RecurringPattern>, CoreError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM recurring_patterns WHERE 1 = 1");

        if let Some(family_id) = filter.family_id {
            qb.push(" AND family_id = ");
            qb.push_bind(family_id);
        }
        if let Some(is_active) = filter.is_active {
            qb.push(" AND is_active = ");
            qb.push_bind(is_active);
        }
        qb.push(" ORDER BY created_at");

        let patterns = qb.build_query_as().fetch_all(self.pool()).await?;
        Ok(patterns)
    }

    async fn update_pattern(&self, id: Uuid, data: UpdatePatternData) -> Result<RecurringPattern, CoreError> {
        let mut uow = SqliteUnitOfWork::begin(self.pool()).await?;
        let pattern = self.lifecycle().update(&mut uow, id, data).await?;
        uow.commit().await?;
        Ok(pattern)
    }

    async fn delete_pattern(&self, id: Uuid, delete_future_tasks: bool) -> Result<bool, CoreError> {
        let mut uow = SqliteUnitOfWork::begin(self.pool()).await?;
        let deleted = self.lifecycle().delete(&mut uow, id, delete_future_tasks).await?;
        uow.commit().await?;
        Ok(deleted)
    }

    async fn activate_pattern(&self, id: Uuid) -> Result<PatternGeneration, CoreError> {
        let mut uow = SqliteUnitOfWork::begin(self.pool()).await?;
        let outcome = self.lifecycle().activate(&mut uow, id).await?;
        uow.commit().await?;
        Ok(outcome)
    }

    async fn deactivate_pattern(&self, id: Uuid) -> Result<RecurringPattern, CoreError> {
        let mut uow = SqliteUnitOfWork::begin(self.pool()).await?;
        let pattern = self.lifecycle().deactivate(&mut uow, id).await?;
        uow.commit().await?;
        Ok(pattern)
    }

    async fn generate_instances(&self, id: Uuid, days_ahead: i64) -> Result<Vec<TaskInstance>, CoreError> {
        let mut uow = SqliteUnitOfWork::begin(self.pool()).await?;
        let created = self.lifecycle().generate_ahead(&mut uow, id, days_ahead).await?;
        uow.commit().await?;
        Ok(created)
    }

    async fn generate_instances_until(&self, id: Uuid, horizon: NaiveDateTime) -> Result<Vec<TaskInstance>, CoreError> {
        let mut uow = SqliteUnitOfWork::begin(self.pool()).await?;
        let now = self.lifecycle().now();
        let created = self
            .lifecycle()
            .generator()
            .generate(&mut uow, id, horizon, now)
            .await?;
        uow.commit().await?;
        Ok(created)
    }
}
