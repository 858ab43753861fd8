use anyhow::Result;
use hearth_core::clock::{Clock, SystemClock};
use hearth_core::models::TaskStatus;
use hearth_core::repository::Repository;
use owo_colors::OwoColorize;

use crate::cli::{OverdueCommand, TaskCommand, TaskIdCommand, TaskSubcommand};
use crate::util::resolve_instance_id;
use crate::views::table::display_instances;

pub async fn task_command<R: Repository>(repository: &R, command: TaskCommand) -> Result<()> {
    match command.command {
        TaskSubcommand::Start(cmd) => set_status(repository, cmd, TaskStatus::InProgress).await,
        TaskSubcommand::Done(cmd) => complete(repository, cmd).await,
        TaskSubcommand::Cancel(cmd) => set_status(repository, cmd, TaskStatus::Canceled).await,
        TaskSubcommand::Reopen(cmd) => set_status(repository, cmd, TaskStatus::Todo).await,
        TaskSubcommand::Overdue(cmd) => overdue(repository, cmd).await,
    }
}

async fn complete<R: Repository>(repository: &R, command: TaskIdCommand) -> Result<()> {
    let task_id = resolve_instance_id(repository, &command.id).await?;
    let task = repository.complete_instance(task_id).await?;
    println!("{} Completed task: '{}'", "✓".green().bold(), task.title);
    Ok(())
}

async fn set_status<R: Repository>(
    repository: &R,
    command: TaskIdCommand,
    status: TaskStatus,
) -> Result<()> {
    let task_id = resolve_instance_id(repository, &command.id).await?;
    let task = repository.set_instance_status(task_id, status).await?;
    println!("{} Task '{}' is now {}", "✓".green().bold(), task.title, status.cyan());
    Ok(())
}

async fn overdue<R: Repository>(repository: &R, command: OverdueCommand) -> Result<()> {
    let tasks = repository.find_overdue_instances(command.family).await?;
    display_instances(&tasks, SystemClock.now());
    Ok(())
}
