use clap::{Args, Parser, Subcommand};
use hearth_core::models::Frequency;
use uuid::Uuid;

/// Household chores on a schedule: recurring patterns and the tasks they generate
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Manage recurring patterns
    Pattern(PatternCommand),
    /// Work with generated tasks
    Task(TaskCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct PatternCommand {
    #[command(subcommand)]
    pub command: PatternSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum PatternSubcommand {
    /// Add a new recurring pattern and generate its first tasks
    Add(AddPatternCommand),
    /// List patterns
    List(ListPatternsCommand),
    /// Show one pattern in detail
    Show(PatternIdCommand),
    /// Edit a pattern (never generates tasks)
    Edit(EditPatternCommand),
    /// Delete a pattern and its tasks
    Delete(DeletePatternCommand),
    /// Resume generation for a pattern
    Activate(PatternIdCommand),
    /// Pause generation for a pattern
    Deactivate(PatternIdCommand),
    /// Generate tasks up to N days ahead
    Generate(GenerateCommand),
    /// List the tasks generated from a pattern
    Tasks(PatternTasksCommand),
    /// Show upcoming occurrence dates without creating anything
    Preview(PreviewCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct AddPatternCommand {
    /// The title of the chore
    pub title: String,
    /// Owning family (falls back to `default_family` from the config)
    #[arg(long)]
    pub family: Option<Uuid>,
    #[arg(short, long)]
    pub description: Option<String>,
    /// How often the chore repeats (daily, weekly, monthly, yearly)
    #[arg(long, default_value = "daily")]
    pub every: Frequency,
    /// Repeat every N periods
    #[arg(long, default_value_t = 1)]
    pub interval: i32,
    /// Weekdays for weekly patterns (mon,wed or 0,2) or days of month for monthly ones (1,15)
    #[arg(long)]
    pub on: Option<String>,
    /// Time of day for generated tasks (e.g. '16:00', '7:30 PM')
    #[arg(long)]
    pub at: Option<String>,
    /// Expected duration in minutes
    #[arg(long)]
    pub duration: Option<i32>,
    /// First day of the pattern (defaults to today)
    #[arg(long)]
    pub start: Option<String>,
    /// Stop generating after this date
    #[arg(long)]
    pub until: Option<String>,
    #[arg(long)]
    pub assignee: Option<Uuid>,
    #[arg(long)]
    pub creator: Option<Uuid>,
    /// Extra metadata as key=value (value may be JSON)
    #[arg(long = "meta", value_name = "KEY=VALUE")]
    pub meta: Vec<String>,
    /// Create the pattern paused
    #[arg(long)]
    pub inactive: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ListPatternsCommand {
    #[arg(long)]
    pub family: Option<Uuid>,
    /// Only active patterns
    #[arg(long, conflicts_with = "inactive")]
    pub active: bool,
    /// Only paused patterns
    #[arg(long)]
    pub inactive: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct PatternIdCommand {
    /// Pattern ID (full or short)
    pub id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct EditPatternCommand {
    /// Pattern ID (full or short)
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, conflicts_with = "description")]
    pub description_clear: bool,

    #[arg(long)]
    pub every: Option<Frequency>,

    #[arg(long)]
    pub interval: Option<i32>,

    #[arg(long)]
    pub on: Option<String>,
    #[arg(long, conflicts_with = "on")]
    pub on_clear: bool,

    #[arg(long)]
    pub at: Option<String>,
    #[arg(long, conflicts_with = "at")]
    pub at_clear: bool,

    #[arg(long)]
    pub duration: Option<i32>,
    #[arg(long, conflicts_with = "duration")]
    pub duration_clear: bool,

    #[arg(long)]
    pub start: Option<String>,

    #[arg(long)]
    pub until: Option<String>,
    #[arg(long, conflicts_with = "until")]
    pub until_clear: bool,

    #[arg(long)]
    pub assignee: Option<Uuid>,
    #[arg(long, conflicts_with = "assignee")]
    pub assignee_clear: bool,

    /// Set metadata as key=value (value may be JSON)
    #[arg(long = "meta", value_name = "KEY=VALUE")]
    pub meta: Vec<String>,

    /// Remove a metadata key
    #[arg(long = "unset-meta", value_name = "KEY")]
    pub unset_meta: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct DeletePatternCommand {
    /// Pattern ID (full or short)
    pub id: String,
    /// Also delete open tasks due from now on
    #[arg(long)]
    pub future_tasks: bool,
    /// Delete without confirmation
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct GenerateCommand {
    /// Pattern ID (full or short)
    pub id: String,
    /// How many days ahead of now to generate
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(i64).range(1..=365))]
    pub days: i64,
}

#[derive(Parser, Debug, Clone)]
pub struct PatternTasksCommand {
    /// Pattern ID (full or short)
    pub id: String,
    /// Include completed tasks
    #[arg(short, long)]
    pub all: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct PreviewCommand {
    /// Pattern ID (full or short)
    pub id: String,
    /// How many days ahead of today to look
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(i64).range(1..=3650))]
    pub days: i64,
}

#[derive(Parser, Debug, Clone)]
pub struct TaskCommand {
    #[command(subcommand)]
    pub command: TaskSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TaskSubcommand {
    /// Mark a task as in progress
    Start(TaskIdCommand),
    /// Mark a task as done
    Done(TaskIdCommand),
    /// Cancel a task
    Cancel(TaskIdCommand),
    /// Move a task back to todo
    Reopen(TaskIdCommand),
    /// List open tasks that are past due
    Overdue(OverdueCommand),
}

#[derive(Args, Debug, Clone)]
pub struct TaskIdCommand {
    /// Task ID (full or short)
    pub id: String,
}

#[derive(Args, Debug, Clone)]
pub struct OverdueCommand {
    #[arg(long)]
    pub family: Option<Uuid>,
}
