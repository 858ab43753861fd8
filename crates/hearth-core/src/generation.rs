use chrono::NaiveDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{GenerationConfig, TaskInstance};
use crate::recurrence::{build_instance, occurrences_between};
use crate::store::PatternStore;

/// Materializes task instances for a pattern up to a horizon.
///
/// Generation resumes from the pattern's cursor (`last_generated_until`, or
/// `start_date` on the first run), walks calendar dates one at a time up to
/// the horizon capped by `end_date`, and creates an instance for every
/// matching date that does not already have one. The cursor then moves to
/// the capped horizon.
///
/// When a call stops early because `max_instances` new instances were
/// created, the cursor still moves to the full horizon. Matching dates
/// between the cut-off and the horizon are never revisited by later calls.
#[derive(Debug, Clone, Default)]
pub struct InstanceGenerator {
    config: GenerationConfig,
}

impl InstanceGenerator {
    pub fn new(config: GenerationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Runs generation with the configured `max_instances`.
    pub async fn generate<S: PatternStore + ?Sized>(
        &self,
        store: &mut S,
        pattern_id: Uuid,
        horizon: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Result<Vec<TaskInstance>, CoreError> {
        self.generate_with_limit(store, pattern_id, horizon, self.config.max_instances, now)
            .await
    }

    /// Returns only the instances created by this call.
    ///
    /// A missing or inactive pattern is a no-op, not an error. Store
    /// failures propagate unchanged, except a duplicate-occurrence conflict
    /// on insert, which means another writer got there first and is skipped.
    ///
    /// When the scan would start at or after the capped horizon, the call
    /// returns an empty list and leaves `last_generated_until` as it is.
    /// Writing the shorter horizon there would move the cursor backwards,
    /// for instance a 30-day activation after a 90-day manual run.
    pub async fn generate_with_limit<S: PatternStore + ?Sized>(
        &self,
        store: &mut S,
        pattern_id: Uuid,
        horizon: NaiveDateTime,
        max_instances: usize,
        now: NaiveDateTime,
    ) -> Result<Vec<TaskInstance>, CoreError> {
        let Some(pattern) = store.find_pattern(pattern_id).await? else {
            debug!(%pattern_id, "generation skipped, pattern not found");
            return Ok(Vec::new());
        };
        if !pattern.is_active {
            debug!(%pattern_id, "generation skipped, pattern inactive");
            return Ok(Vec::new());
        }

        let scan_start = pattern.scan_start();
        let horizon = pattern.effective_horizon(horizon);
        // Cursor already covers the horizon; never move it back.
        if scan_start >= horizon {
            return Ok(Vec::new());
        }

        let mut created = Vec::new();
        for date in occurrences_between(&pattern, scan_start.date(), horizon.date()) {
            if created.len() >= max_instances {
                break;
            }
            if store.instance_exists(pattern_id, date).await? {
                continue;
            }

            let instance = build_instance(&pattern, date, now);
            match store.insert_instance(&instance).await {
                Ok(()) => {
                    debug!(%pattern_id, occurrence_date = %date, instance_id = %instance.id, "instance created");
                    created.push(instance);
                }
                Err(e) if e.is_duplicate_occurrence() => {
                    debug!(%pattern_id, occurrence_date = %date, "occurrence already materialized elsewhere");
                }
                Err(e) => return Err(e),
            }
        }

        store.set_generation_cursor(pattern_id, horizon, now).await?;

        info!(
            %pattern_id,
            created = created.len(),
            cursor = %horizon,
            "generation finished"
        );
        Ok(created)
    }
}
