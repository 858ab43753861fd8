use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Free-form key/value data carried by patterns and instances.
///
/// Keys the engine does not know about are preserved verbatim.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Metadata key stamped onto every generated instance.
pub const GENERATED_FROM_PATTERN_KEY: &str = "generated_from_pattern";
/// Metadata key carrying the pattern's informational duration.
pub const DURATION_MINUTES_KEY: &str = "duration_minutes";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Frequency::Daily => write!(f, "daily"),
            Frequency::Weekly => write!(f, "weekly"),
            Frequency::Monthly => write!(f, "monthly"),
            Frequency::Yearly => write!(f, "yearly"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid frequency: {0}")]
pub struct ParseFrequencyError(String);

impl FromStr for Frequency {
    type Err = ParseFrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            _ => Err(ParseFrequencyError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
    Canceled,
}

impl TaskStatus {
    /// Open statuses are the ones a future-task cleanup may remove.
    pub fn is_open(self) -> bool {
        matches!(self, TaskStatus::Todo | TaskStatus::InProgress)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Todo => write!(f, "todo"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::Done => write!(f, "done"),
            TaskStatus::Canceled => write!(f, "canceled"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid task status: {0}")]
pub struct ParseTaskStatusError(String);

impl FromStr for TaskStatus {
    type Err = ParseTaskStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" | "in-progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            "canceled" | "cancelled" => Ok(TaskStatus::Canceled),
            _ => Err(ParseTaskStatusError(s.to_string())),
        }
    }
}

// ============================================================================
// Recurring Patterns
// ============================================================================

/// A recurring chore definition owned by a family.
///
/// One pattern drives many [`TaskInstance`]s. The date component of
/// `start_date` is the recurrence anchor; its time of day plays no part in
/// the rule. The optional clock time (`start_time_hour`/`start_time_minute`)
/// is what generated instances get as their due time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecurringPattern {
    pub id: Uuid,
    pub family_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub frequency: Frequency,
    /// Repeat every N periods, always >= 1
    pub interval: i32,
    /// Weekday indices (0=Monday) for weekly, days of month (1-31) for monthly
    pub by_day: Option<Vec<i32>>,
    pub start_time_hour: Option<i32>,
    pub start_time_minute: Option<i32>,
    /// Informational only, copied into instance metadata
    pub duration_minutes: Option<i32>,
    pub start_date: NaiveDateTime,
    /// Exclusive cap on generation
    pub end_date: Option<NaiveDateTime>,
    pub default_assignee_id: Option<Uuid>,
    pub created_by_id: Option<Uuid>,
    pub is_active: bool,
    /// Generation cursor; `None` until the first generation run
    pub last_generated_until: Option<NaiveDateTime>,
    pub metadata: Metadata,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl RecurringPattern {
    /// The recurrence anchor all interval arithmetic is relative to.
    pub fn anchor_date(&self) -> NaiveDate {
        self.start_date.date()
    }

    /// Time of day applied to generated instances, if the pattern has one.
    pub fn clock_time(&self) -> Option<NaiveTime> {
        let hour = self.start_time_hour?;
        let minute = self.start_time_minute.unwrap_or(0);
        NaiveTime::from_hms_opt(u32::try_from(hour).ok()?, u32::try_from(minute).ok()?, 0)
    }

    /// Where the next generation run starts scanning.
    pub fn scan_start(&self) -> NaiveDateTime {
        self.last_generated_until.unwrap_or(self.start_date)
    }

    /// The caller's horizon capped by `end_date`.
    pub fn effective_horizon(&self, horizon: NaiveDateTime) -> NaiveDateTime {
        match self.end_date {
            Some(end) if end < horizon => end,
            _ => horizon,
        }
    }
}

impl<'r> FromRow<'r, SqliteRow> for RecurringPattern {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let by_day: Option<String> = row.try_get("by_day")?;
        let metadata: String = row.try_get("metadata")?;

        Ok(Self {
            id: row.try_get("id")?,
            family_id: row.try_get("family_id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            frequency: row.try_get("frequency")?,
            interval: row.try_get("interval")?,
            by_day: by_day
                .map(|raw| decode_json_column("by_day", &raw))
                .transpose()?,
            start_time_hour: row.try_get("start_time_hour")?,
            start_time_minute: row.try_get("start_time_minute")?,
            duration_minutes: row.try_get("duration_minutes")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            default_assignee_id: row.try_get("default_assignee_id")?,
            created_by_id: row.try_get("created_by_id")?,
            is_active: row.try_get("is_active")?,
            last_generated_until: row.try_get("last_generated_until")?,
            metadata: decode_json_column("metadata", &metadata)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

// ============================================================================
// Task Instances
// ============================================================================

/// A concrete task. Generated instances carry their pattern id and the
/// occurrence date they stand for; everything else is a snapshot of the
/// pattern taken when the instance was created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskInstance {
    pub id: Uuid,
    pub family_id: Uuid,
    /// `None` for tasks that were not generated from a pattern
    pub pattern_id: Option<Uuid>,
    pub occurrence_date: Option<NaiveDate>,
    pub title: String,
    pub description: Option<String>,
    pub assignee_id: Option<Uuid>,
    pub created_by_id: Option<Uuid>,
    pub status: TaskStatus,
    pub due_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub metadata: Metadata,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl<'r> FromRow<'r, SqliteRow> for TaskInstance {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let metadata: String = row.try_get("metadata")?;

        Ok(Self {
            id: row.try_get("id")?,
            family_id: row.try_get("family_id")?,
            pattern_id: row.try_get("recurring_pattern_id")?,
            occurrence_date: row.try_get("occurrence_date")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            assignee_id: row.try_get("assignee_id")?,
            created_by_id: row.try_get("created_by_id")?,
            status: row.try_get("status")?,
            due_at: row.try_get("due_at")?,
            completed_at: row.try_get("completed_at")?,
            metadata: decode_json_column("metadata", &metadata)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

fn decode_json_column<T: serde::de::DeserializeOwned>(
    column: &str,
    raw: &str,
) -> Result<T, sqlx::Error> {
    serde_json::from_str(raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

// ============================================================================
// Data Transfer Objects (DTOs)
// ============================================================================

/// Data required to create a new recurring pattern
#[derive(Debug, Clone)]
pub struct NewPatternData {
    pub family_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub frequency: Frequency,
    pub interval: i32,
    pub by_day: Option<Vec<i32>>,
    pub start_time_hour: Option<i32>,
    pub start_time_minute: Option<i32>,
    pub duration_minutes: Option<i32>,
    pub start_date: NaiveDateTime,
    pub end_date: Option<NaiveDateTime>,
    pub default_assignee_id: Option<Uuid>,
    pub created_by_id: Option<Uuid>,
    /// Patterns may be created paused
    pub is_active: bool,
    pub metadata: Metadata,
}

impl NewPatternData {
    /// A daily, active pattern with no clock time; adjust fields from there.
    pub fn new(family_id: Uuid, title: impl Into<String>, start_date: NaiveDateTime) -> Self {
        Self {
            family_id,
            title: title.into(),
            description: None,
            frequency: Frequency::Daily,
            interval: 1,
            by_day: None,
            start_time_hour: None,
            start_time_minute: None,
            duration_minutes: None,
            start_date,
            end_date: None,
            default_assignee_id: None,
            created_by_id: None,
            is_active: true,
            metadata: Metadata::new(),
        }
    }
}

/// Partial update of a pattern. Outer `None` leaves a field untouched;
/// `Some(None)` clears a nullable one.
#[derive(Debug, Clone, Default)]
pub struct UpdatePatternData {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub frequency: Option<Frequency>,
    pub interval: Option<i32>,
    pub by_day: Option<Option<Vec<i32>>>,
    pub start_time_hour: Option<Option<i32>>,
    pub start_time_minute: Option<Option<i32>>,
    pub duration_minutes: Option<Option<i32>>,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<Option<NaiveDateTime>>,
    pub default_assignee_id: Option<Option<Uuid>>,
    pub is_active: Option<bool>,
    pub metadata: Option<Metadata>,
}

/// Filters for listing patterns
#[derive(Debug, Clone, Default)]
pub struct PatternFilter {
    pub family_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

/// Tunables for instance generation
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Horizon used by create and activate, in days from now
    pub lookahead_days: i64,
    /// Cap on instances created by a single generation call
    pub max_instances: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            lookahead_days: 30,
            max_instances: 100,
        }
    }
}
