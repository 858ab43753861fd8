//! # Hearth Core Library
//!
//! The recurrence engine behind Hearth's household chores: recurring
//! patterns, the task instances generated from them, and the bookkeeping
//! that keeps generation idempotent.
//!
//! ## Features
//!
//! - **Recurrence rules**: daily, weekly, monthly and yearly patterns with an
//!   interval and optional weekday / day-of-month selections
//! - **Incremental generation**: a per-pattern cursor so repeated runs never
//!   create the same occurrence twice
//! - **Lifecycle**: create, update, activate, deactivate and delete with the
//!   generation each transition triggers
//! - **Atomic units of work**: every operation runs inside one SQLite
//!   transaction
//!
//! ## Core Modules
//!
//! - [`db`]: Database connection and migration management
//! - [`models`]: Core data structures and transfer objects
//! - [`recurrence`]: The occurrence predicate and instance construction
//! - [`generation`]: Cursor-driven instance generation
//! - [`lifecycle`]: Pattern state transitions
//! - [`store`]: The unit-of-work seam generation runs against
//! - [`repository`]: SQLite-backed data access
//! - [`clock`]: Injectable source of "now"
//! - [`error`]: Error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use hearth_core::{
//!     db,
//!     lifecycle::PatternLifecycle,
//!     models::{Frequency, NewPatternData},
//!     repository::{PatternRepository, SqliteRepository},
//! };
//! use chrono::NaiveDate;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = db::establish_connection("hearth.db").await?;
//!     let repo = SqliteRepository::new(pool, PatternLifecycle::default());
//!
//!     let start = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap().and_hms_opt(0, 0, 0).unwrap();
//!     let mut data = NewPatternData::new(Uuid::now_v7(), "Take out the bins", start);
//!     data.frequency = Frequency::Weekly;
//!     data.by_day = Some(vec![6]);
//!     data.start_time_hour = Some(16);
//!
//!     let outcome = repo.create_pattern(data).await?;
//!     println!("{} instances generated", outcome.created.len());
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod db;
pub mod error;
pub mod generation;
pub mod lifecycle;
pub mod models;
pub mod recurrence;
pub mod repository;
pub mod store;
