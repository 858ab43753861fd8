use crate::db::DbPool;
use crate::error::CoreError;
use crate::lifecycle::{PatternGeneration, PatternLifecycle};
use crate::models::{
    NewPatternData, PatternFilter, RecurringPattern, TaskInstance, TaskStatus, UpdatePatternData,
};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use uuid::Uuid;

pub mod instances;
pub mod patterns;
pub mod store;

pub use store::SqliteUnitOfWork;

/// Domain-specific trait for recurring pattern operations
#[async_trait]
pub trait PatternRepository {
    /// Persists the pattern and generates `lookahead_days` ahead of now.
    async fn create_pattern(&self, data: NewPatternData) -> Result<PatternGeneration, CoreError>;
    async fn find_pattern_by_id(&self, id: Uuid) -> Result<Option<RecurringPattern>, CoreError>;
    async fn find_patterns_by_short_id(&self, short_id: &str) -> Result<Vec<RecurringPattern>, CoreError>;
    async fn find_patterns(&self, filter: &PatternFilter) -> Result<Vec<RecurringPattern>, CoreError>;
    async fn update_pattern(&self, id: Uuid, data: UpdatePatternData) -> Result<RecurringPattern, CoreError>;
    async fn delete_pattern(&self, id: Uuid, delete_future_tasks: bool) -> Result<bool, CoreError>;
    async fn activate_pattern(&self, id: Uuid) -> Result<PatternGeneration, CoreError>;
    async fn deactivate_pattern(&self, id: Uuid) -> Result<RecurringPattern, CoreError>;
    /// Generates up to `now + days_ahead`.
    async fn generate_instances(&self, id: Uuid, days_ahead: i64) -> Result<Vec<TaskInstance>, CoreError>;
    /// Generates up to an explicit horizon.
    async fn generate_instances_until(&self, id: Uuid, horizon: NaiveDateTime) -> Result<Vec<TaskInstance>, CoreError>;
}

/// Domain-specific trait for task instance operations
#[async_trait]
pub trait InstanceRepository {
    async fn find_instance_by_id(&self, id: Uuid) -> Result<Option<TaskInstance>, CoreError>;
    async fn find_instances_by_short_id(&self, short_id: &str) -> Result<Vec<TaskInstance>, CoreError>;
    /// Ordered by occurrence date. `done` instances are left out unless
    /// `include_completed` is set.
    async fn find_instances_for_pattern(&self, pattern_id: Uuid, include_completed: bool) -> Result<Vec<TaskInstance>, CoreError>;
    async fn set_instance_status(&self, id: Uuid, status: TaskStatus) -> Result<TaskInstance, CoreError>;
    async fn complete_instance(&self, id: Uuid) -> Result<TaskInstance, CoreError>;
    async fn find_overdue_instances(&self, family_id: Option<Uuid>) -> Result<Vec<TaskInstance>, CoreError>;
}

/// Main repository trait that composes all domain traits
#[async_trait]
pub trait Repository: PatternRepository + InstanceRepository {}

/// SQLite implementation of the repository pattern
pub struct SqliteRepository {
    pool: DbPool,
    lifecycle: PatternLifecycle,
}

impl SqliteRepository {
    pub fn new(pool: DbPool, lifecycle: PatternLifecycle) -> Self {
        Self { pool, lifecycle }
    }

    /// Get a reference to the database pool for internal use across modules
    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub(crate) fn lifecycle(&self) -> &PatternLifecycle {
        &self.lifecycle
    }

    /// Opens a unit of work against this repository's database.
    pub async fn begin(&self) -> Result<SqliteUnitOfWork, CoreError> {
        SqliteUnitOfWork::begin(&self.pool).await
    }
}

impl Repository for SqliteRepository {}

/// Normalizes a user-typed short id into the lowercase hex form ids are
/// matched against. Short ids are the trailing characters of the hex id.
pub(crate) fn short_id_pattern(short_id: &str) -> Result<String, CoreError> {
    let hex: String = short_id
        .chars()
        .filter(|c| *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if hex.len() < 4 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CoreError::InvalidInput(format!(
            "'{}' is not a valid short ID (need at least 4 hex characters)",
            short_id
        )));
    }
    let mut pattern = String::with_capacity(hex.len() + 1);
    pattern.push('%');
    pattern.push_str(&hex);
    Ok(pattern)
}

/// The short form shown to users: the last eight hex characters.
pub fn short_id(id: &Uuid) -> String {
    let simple = id.simple().to_string();
    simple[simple.len() - 8..].to_string()
}
