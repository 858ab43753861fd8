//! Storage seam for the recurrence engine.
//!
//! A [`PatternStore`] is one unit of work: everything the generator and the
//! lifecycle operations do through it is applied together or not at all.
//! The SQLite implementation wraps a single transaction
//! ([`crate::repository::SqliteUnitOfWork`]).
//!
//! Storage contract:
//! * at most one instance per `(pattern_id, occurrence_date)`; a violating
//!   insert fails with [`CoreError::DuplicateOccurrence`]. This constraint,
//!   not [`PatternStore::instance_exists`], is what keeps concurrent
//!   generators from double-booking a day.
//! * deleting a pattern leaves no instance of it behind.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{RecurringPattern, TaskInstance};

#[async_trait]
pub trait PatternStore: Send {
    async fn find_pattern(&mut self, id: Uuid) -> Result<Option<RecurringPattern>, CoreError>;

    async fn insert_pattern(&mut self, pattern: &RecurringPattern) -> Result<(), CoreError>;

    /// Overwrites every column of an existing pattern.
    /// Returns `false` if no such pattern exists.
    async fn save_pattern(&mut self, pattern: &RecurringPattern) -> Result<bool, CoreError>;

    /// Returns `false` if no such pattern exists.
    async fn set_pattern_active(
        &mut self,
        id: Uuid,
        active: bool,
        now: NaiveDateTime,
    ) -> Result<bool, CoreError>;

    async fn set_generation_cursor(
        &mut self,
        id: Uuid,
        until: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Result<(), CoreError>;

    /// Deletes the pattern and every remaining instance of it.
    /// Returns `false` if no such pattern exists.
    async fn delete_pattern(&mut self, id: Uuid) -> Result<bool, CoreError>;

    async fn instance_exists(
        &mut self,
        pattern_id: Uuid,
        occurrence_date: NaiveDate,
    ) -> Result<bool, CoreError>;

    async fn insert_instance(&mut self, instance: &TaskInstance) -> Result<(), CoreError>;

    /// Deletes todo/in-progress instances of the pattern due at or after
    /// `now`. Instances without a due time are not matched.
    async fn delete_open_instances_due_from(
        &mut self,
        pattern_id: Uuid,
        now: NaiveDateTime,
    ) -> Result<u64, CoreError>;
}

#[cfg(test)]
pub(crate) mod memory {
    use super::*;
    use std::collections::HashMap;

    /// In-process store enforcing the same uniqueness contract as SQLite.
    #[derive(Debug, Default)]
    pub struct MemoryStore {
        pub patterns: HashMap<Uuid, RecurringPattern>,
        pub instances: Vec<TaskInstance>,
        /// When set, `instance_exists` always answers "no", the way a
        /// generator sees the world while another writer races it.
        pub stale_reads: bool,
        /// Rows removed so far by `delete_open_instances_due_from`.
        pub open_instances_removed: u64,
    }

    impl MemoryStore {
        pub fn with_pattern(pattern: RecurringPattern) -> Self {
            let mut store = Self::default();
            store.patterns.insert(pattern.id, pattern);
            store
        }

        pub fn occurrence_dates(&self, pattern_id: Uuid) -> Vec<NaiveDate> {
            let mut dates: Vec<_> = self
                .instances
                .iter()
                .filter(|i| i.pattern_id == Some(pattern_id))
                .filter_map(|i| i.occurrence_date)
                .collect();
            dates.sort();
            dates
        }
    }

    #[async_trait]
    impl PatternStore for MemoryStore {
        async fn find_pattern(&mut self, id: Uuid) -> Result<Option<RecurringPattern>, CoreError> {
            Ok(self.patterns.get(&id).cloned())
        }

        async fn insert_pattern(&mut self, pattern: &RecurringPattern) -> Result<(), CoreError> {
            self.patterns.insert(pattern.id, pattern.clone());
            Ok(())
        }

        async fn save_pattern(&mut self, pattern: &RecurringPattern) -> Result<bool, CoreError> {
            match self.patterns.get_mut(&pattern.id) {
                Some(existing) => {
                    *existing = pattern.clone();
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn set_pattern_active(
            &mut self,
            id: Uuid,
            active: bool,
            now: NaiveDateTime,
        ) -> Result<bool, CoreError> {
            Ok(match self.patterns.get_mut(&id) {
                Some(pattern) => {
                    pattern.is_active = active;
                    pattern.updated_at = now;
                    true
                }
                None => false,
            })
        }

        async fn set_generation_cursor(
            &mut self,
            id: Uuid,
            until: NaiveDateTime,
            now: NaiveDateTime,
        ) -> Result<(), CoreError> {
            let pattern = self
                .patterns
                .get_mut(&id)
                .ok_or_else(|| CoreError::NotFound(format!("Pattern with id {} not found", id)))?;
            pattern.last_generated_until = Some(until);
            pattern.updated_at = now;
            Ok(())
        }

        async fn delete_pattern(&mut self, id: Uuid) -> Result<bool, CoreError> {
            self.instances.retain(|i| i.pattern_id != Some(id));
            Ok(self.patterns.remove(&id).is_some())
        }

        async fn instance_exists(
            &mut self,
            pattern_id: Uuid,
            occurrence_date: NaiveDate,
        ) -> Result<bool, CoreError> {
            if self.stale_reads {
                return Ok(false);
            }
            Ok(self.instances.iter().any(|i| {
                i.pattern_id == Some(pattern_id) && i.occurrence_date == Some(occurrence_date)
            }))
        }

        async fn insert_instance(&mut self, instance: &TaskInstance) -> Result<(), CoreError> {
            if let (Some(pattern_id), Some(occurrence_date)) =
                (instance.pattern_id, instance.occurrence_date)
            {
                let taken = self.instances.iter().any(|i| {
                    i.pattern_id == Some(pattern_id) && i.occurrence_date == Some(occurrence_date)
                });
                if taken {
                    return Err(CoreError::DuplicateOccurrence {
                        pattern_id,
                        occurrence_date,
                    });
                }
            }
            self.instances.push(instance.clone());
            Ok(())
        }

        async fn delete_open_instances_due_from(
            &mut self,
            pattern_id: Uuid,
            now: NaiveDateTime,
        ) -> Result<u64, CoreError> {
            let before = self.instances.len();
            self.instances.retain(|i| {
                !(i.pattern_id == Some(pattern_id)
                    && i.status.is_open()
                    && i.due_at.is_some_and(|due| due >= now))
            });
            let removed = (before - self.instances.len()) as u64;
            self.open_instances_removed += removed;
            Ok(removed)
        }
    }
}
