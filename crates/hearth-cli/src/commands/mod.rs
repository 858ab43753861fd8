pub mod pattern;
pub mod task;
