use chrono::{Duration, NaiveDateTime};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::error::CoreError;
use crate::generation::InstanceGenerator;
use crate::models::{NewPatternData, RecurringPattern, TaskInstance, UpdatePatternData};
use crate::store::PatternStore;

/// Outcome of an operation that (re)starts generation for a pattern.
#[derive(Debug, Clone)]
pub struct PatternGeneration {
    /// The pattern as stored after generation, cursor included
    pub pattern: RecurringPattern,
    /// Instances created by this call only
    pub created: Vec<TaskInstance>,
}

/// Pattern state transitions and the generation they trigger.
///
/// Patterns move `active <-> inactive` until deleted. Create and activate
/// generate `lookahead_days` ahead of now; deactivate and update never
/// generate. Every method runs inside the caller's unit of work.
#[derive(Clone)]
pub struct PatternLifecycle {
    generator: InstanceGenerator,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for PatternLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternLifecycle")
            .field("generator", &self.generator)
            .finish_non_exhaustive()
    }
}

impl Default for PatternLifecycle {
    fn default() -> Self {
        Self::new(InstanceGenerator::default(), Arc::new(SystemClock))
    }
}

impl PatternLifecycle {
    pub fn new(generator: InstanceGenerator, clock: Arc<dyn Clock>) -> Self {
        Self { generator, clock }
    }

    pub fn generator(&self) -> &InstanceGenerator {
        &self.generator
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    fn default_horizon(&self, now: NaiveDateTime) -> NaiveDateTime {
        now + Duration::days(self.generator.config().lookahead_days)
    }

    pub async fn create<S: PatternStore + ?Sized>(
        &self,
        store: &mut S,
        data: NewPatternData,
    ) -> Result<PatternGeneration, CoreError> {
        validate_schedule(data.interval, data.start_time_hour, data.start_time_minute)?;
        let now = self.now();

        let pattern = RecurringPattern {
            id: Uuid::now_v7(),
            family_id: data.family_id,
            title: data.title,
            description: data.description,
            frequency: data.frequency,
            interval: data.interval,
            by_day: data.by_day,
            start_time_hour: data.start_time_hour,
            start_time_minute: data.start_time_minute,
            duration_minutes: data.duration_minutes,
            start_date: data.start_date,
            end_date: data.end_date,
            default_assignee_id: data.default_assignee_id,
            created_by_id: data.created_by_id,
            is_active: data.is_active,
            last_generated_until: None,
            metadata: data.metadata,
            created_at: now,
            updated_at: now,
        };
        store.insert_pattern(&pattern).await?;
        info!(pattern_id = %pattern.id, frequency = %pattern.frequency, "pattern created");

        let created = self
            .generator
            .generate(store, pattern.id, self.default_horizon(now), now)
            .await?;
        let pattern = reload(store, pattern.id).await?;
        Ok(PatternGeneration { pattern, created })
    }

    /// Applies a partial update. Never generates and never moves the cursor.
    pub async fn update<S: PatternStore + ?Sized>(
        &self,
        store: &mut S,
        id: Uuid,
        data: UpdatePatternData,
    ) -> Result<RecurringPattern, CoreError> {
        let mut pattern = reload(store, id).await?;

        if let Some(title) = data.title {
            pattern.title = title;
        }
        if let Some(description) = data.description {
            pattern.description = description;
        }
        if let Some(frequency) = data.frequency {
            pattern.frequency = frequency;
        }
        if let Some(interval) = data.interval {
            pattern.interval = interval;
        }
        if let Some(by_day) = data.by_day {
            pattern.by_day = by_day;
        }
        if let Some(hour) = data.start_time_hour {
            pattern.start_time_hour = hour;
        }
        if let Some(minute) = data.start_time_minute {
            pattern.start_time_minute = minute;
        }
        if let Some(duration) = data.duration_minutes {
            pattern.duration_minutes = duration;
        }
        if let Some(start_date) = data.start_date {
            pattern.start_date = start_date;
        }
        if let Some(end_date) = data.end_date {
            pattern.end_date = end_date;
        }
        if let Some(assignee) = data.default_assignee_id {
            pattern.default_assignee_id = assignee;
        }
        if let Some(is_active) = data.is_active {
            pattern.is_active = is_active;
        }
        if let Some(metadata) = data.metadata {
            pattern.metadata = metadata;
        }

        validate_schedule(pattern.interval, pattern.start_time_hour, pattern.start_time_minute)?;
        pattern.updated_at = self.now();

        if !store.save_pattern(&pattern).await? {
            return Err(not_found(id));
        }
        Ok(pattern)
    }

    pub async fn activate<S: PatternStore + ?Sized>(
        &self,
        store: &mut S,
        id: Uuid,
    ) -> Result<PatternGeneration, CoreError> {
        let now = self.now();
        if !store.set_pattern_active(id, true, now).await? {
            return Err(not_found(id));
        }
        info!(pattern_id = %id, "pattern activated");

        let created = self
            .generator
            .generate(store, id, self.default_horizon(now), now)
            .await?;
        let pattern = reload(store, id).await?;
        Ok(PatternGeneration { pattern, created })
    }

    /// Stops future generation. Existing instances are left as they are.
    pub async fn deactivate<S: PatternStore + ?Sized>(
        &self,
        store: &mut S,
        id: Uuid,
    ) -> Result<RecurringPattern, CoreError> {
        if !store.set_pattern_active(id, false, self.now()).await? {
            return Err(not_found(id));
        }
        info!(pattern_id = %id, "pattern deactivated");
        reload(store, id).await
    }

    /// Generates up to `now + days_ahead`. Bounds on `days_ahead` are the
    /// caller's business.
    pub async fn generate_ahead<S: PatternStore + ?Sized>(
        &self,
        store: &mut S,
        id: Uuid,
        days_ahead: i64,
    ) -> Result<Vec<TaskInstance>, CoreError> {
        let now = self.now();
        self.generator
            .generate(store, id, now + Duration::days(days_ahead), now)
            .await
    }

    /// Deletes a pattern. With `delete_future_tasks`, open instances due at
    /// or after now are removed first; the pattern's own deletion then takes
    /// every remaining instance with it. Returns `false` if the pattern did
    /// not exist.
    pub async fn delete<S: PatternStore + ?Sized>(
        &self,
        store: &mut S,
        id: Uuid,
        delete_future_tasks: bool,
    ) -> Result<bool, CoreError> {
        if store.find_pattern(id).await?.is_none() {
            return Ok(false);
        }

        if delete_future_tasks {
            let removed = store.delete_open_instances_due_from(id, self.now()).await?;
            info!(pattern_id = %id, removed, "future instances deleted");
        }

        let deleted = store.delete_pattern(id).await?;
        info!(pattern_id = %id, "pattern deleted");
        Ok(deleted)
    }
}

async fn reload<S: PatternStore + ?Sized>(store: &mut S, id: Uuid) -> Result<RecurringPattern, CoreError> {
    store.find_pattern(id).await?.ok_or_else(|| not_found(id))
}

fn not_found(id: Uuid) -> CoreError {
    CoreError::NotFound(format!("Recurring pattern with id {} not found", id))
}

/// Rejects rules the engine cannot evaluate. By-day values are deliberately
/// not checked; out-of-range entries just never match.
pub fn validate_schedule(
    interval: i32,
    start_time_hour: Option<i32>,
    start_time_minute: Option<i32>,
) -> Result<(), CoreError> {
    if interval < 1 {
        return Err(CoreError::InvalidInput(format!(
            "Interval must be at least 1, got {}",
            interval
        )));
    }
    if let Some(hour) = start_time_hour {
        if !(0..=23).contains(&hour) {
            return Err(CoreError::InvalidInput(format!("Hour must be between 0 and 23, got {}", hour)));
        }
    }
    if let Some(minute) = start_time_minute {
        if !(0..=59).contains(&minute) {
            return Err(CoreError::InvalidInput(format!(
                "Minute must be between 0 and 59, got {}",
                minute
            )));
        }
    }
    Ok(())
}
