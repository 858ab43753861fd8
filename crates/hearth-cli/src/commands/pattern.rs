use anyhow::{anyhow, Result};
use chrono::{Duration, NaiveTime};
use dialoguer::Confirm;
use hearth_core::clock::{Clock, SystemClock};
use hearth_core::error::CoreError;
use hearth_core::models::{
    Metadata, NewPatternData, PatternFilter, RecurringPattern, TaskInstance, UpdatePatternData,
};
use hearth_core::recurrence::occurrences_between;
use hearth_core::repository::{short_id, Repository};
use owo_colors::{OwoColorize, Style};

use crate::cli::{
    AddPatternCommand, DeletePatternCommand, EditPatternCommand, GenerateCommand,
    ListPatternsCommand, PatternCommand, PatternIdCommand, PatternSubcommand,
    PatternTasksCommand, PreviewCommand,
};
use crate::config::Config;
use crate::parser::{apply_metadata_pairs, parse_by_day, parse_clock_time, parse_date_time};
use crate::util::resolve_pattern_id;
use crate::views::table::{describe_schedule, display_instances, display_patterns};

pub async fn pattern_command<R: Repository>(
    repository: &R,
    command: PatternCommand,
    config: &Config,
) -> Result<()> {
    match command.command {
        PatternSubcommand::Add(cmd) => add_command(repository, cmd, config).await,
        PatternSubcommand::List(cmd) => list_command(repository, cmd).await,
        PatternSubcommand::Show(cmd) => show_command(repository, cmd).await,
        PatternSubcommand::Edit(cmd) => edit_command(repository, cmd).await,
        PatternSubcommand::Delete(cmd) => delete_command(repository, cmd).await,
        PatternSubcommand::Activate(cmd) => activate_command(repository, cmd).await,
        PatternSubcommand::Deactivate(cmd) => deactivate_command(repository, cmd).await,
        PatternSubcommand::Generate(cmd) => generate_command(repository, cmd).await,
        PatternSubcommand::Tasks(cmd) => tasks_command(repository, cmd).await,
        PatternSubcommand::Preview(cmd) => preview_command(repository, cmd).await,
    }
}

async fn add_command<R: Repository>(
    repository: &R,
    command: AddPatternCommand,
    config: &Config,
) -> Result<()> {
    let family_id = command.family.or(config.default_family).ok_or_else(|| {
        anyhow!(CoreError::InvalidInput(
            "No family given. Pass --family or set default_family in hearth.toml".to_string()
        ))
    })?;

    let start_date = match &command.start {
        Some(start) => parse_date_time(start)?,
        None => SystemClock.now().date().and_time(NaiveTime::MIN),
    };

    let mut data = NewPatternData::new(family_id, command.title, start_date);
    data.description = command.description;
    data.frequency = command.every;
    data.interval = command.interval;
    data.by_day = command
        .on
        .as_deref()
        .map(|on| parse_by_day(on, command.every))
        .transpose()?;
    if let Some(at) = &command.at {
        let (hour, minute) = parse_clock_time(at)?;
        data.start_time_hour = Some(hour);
        data.start_time_minute = Some(minute);
    }
    data.duration_minutes = command.duration;
    data.end_date = command.until.as_deref().map(parse_date_time).transpose()?;
    data.default_assignee_id = command.assignee;
    data.created_by_id = command.creator;
    data.is_active = !command.inactive;
    apply_metadata_pairs(&mut data.metadata, &command.meta)?;

    let outcome = repository.create_pattern(data).await?;
    let pattern = &outcome.pattern;

    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();

    println!(
        "{} Created pattern: {}",
        "✓".style(success_style),
        pattern.title.bright_white().bold()
    );
    println!("  {} Pattern ID: {}", "→".style(info_style), pattern.id);
    println!(
        "  {} Schedule: {}",
        "→".style(info_style),
        describe_schedule(pattern).cyan()
    );
    if pattern.is_active {
        print_generated(&outcome.created, pattern);
    } else {
        println!(
            "  {} Pattern is paused; activate it to start generating tasks",
            "→".style(info_style)
        );
    }

    Ok(())
}

fn print_generated(created: &[TaskInstance], pattern: &RecurringPattern) {
    let info_style = Style::new().blue();
    let until = pattern
        .last_generated_until
        .map(|until| until.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "  {} Generated {} task(s) through {}",
        "→".style(info_style),
        created.len(),
        until
    );
}

async fn list_command<R: Repository>(repository: &R, command: ListPatternsCommand) -> Result<()> {
    let is_active = match (command.active, command.inactive) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };
    let filter = PatternFilter {
        family_id: command.family,
        is_active,
    };

    let patterns = repository.find_patterns(&filter).await?;
    display_patterns(&patterns);
    Ok(())
}

async fn load_pattern<R: Repository>(repository: &R, id: &str) -> Result<RecurringPattern> {
    let pattern_id = resolve_pattern_id(repository, id).await?;
    repository
        .find_pattern_by_id(pattern_id)
        .await?
        .ok_or_else(|| anyhow!(CoreError::NotFound(format!("Pattern with ID '{}' not found", id))))
}

async fn show_command<R: Repository>(repository: &R, command: PatternIdCommand) -> Result<()> {
    let pattern = load_pattern(repository, &command.id).await?;

    println!("{}", "Pattern Information".blue().bold());
    println!("ID: {}", pattern.id.yellow());
    println!("Title: {}", pattern.title.cyan());
    if let Some(description) = &pattern.description {
        println!("Description: {}", description);
    }
    println!("Family: {}", pattern.family_id);
    println!("Schedule: {}", describe_schedule(&pattern).green());
    println!("Starts: {}", pattern.start_date.format("%Y-%m-%d"));
    if let Some(end_date) = pattern.end_date {
        println!("Ends: {}", end_date.format("%Y-%m-%d %H:%M"));
    }
    if let Some(duration) = pattern.duration_minutes {
        println!("Duration: {} min", duration);
    }
    if let Some(assignee) = pattern.default_assignee_id {
        println!("Default assignee: {}", assignee);
    }
    println!(
        "Active: {}",
        if pattern.is_active {
            "Yes".green().to_string()
        } else {
            "No".red().to_string()
        }
    );
    match pattern.last_generated_until {
        Some(until) => println!("Generated until: {}", until.format("%Y-%m-%d %H:%M")),
        None => println!("Generated until: never"),
    }
    if !pattern.metadata.is_empty() {
        println!("Metadata: {}", serde_json::Value::Object(pattern.metadata.clone()));
    }

    Ok(())
}

async fn edit_command<R: Repository>(repository: &R, command: EditPatternCommand) -> Result<()> {
    let current = load_pattern(repository, &command.id).await?;
    let frequency = command.every.unwrap_or(current.frequency);

    let mut update = UpdatePatternData {
        title: command.title,
        frequency: command.every,
        interval: command.interval,
        duration_minutes: command.duration.map(Some),
        start_date: command.start.as_deref().map(parse_date_time).transpose()?,
        default_assignee_id: command.assignee.map(Some),
        ..Default::default()
    };

    if command.description_clear {
        update.description = Some(None);
    } else if let Some(description) = command.description {
        update.description = Some(Some(description));
    }

    if command.on_clear {
        update.by_day = Some(None);
    } else if let Some(on) = &command.on {
        update.by_day = Some(Some(parse_by_day(on, frequency)?));
    }

    if command.at_clear {
        update.start_time_hour = Some(None);
        update.start_time_minute = Some(None);
    } else if let Some(at) = &command.at {
        let (hour, minute) = parse_clock_time(at)?;
        update.start_time_hour = Some(Some(hour));
        update.start_time_minute = Some(Some(minute));
    }

    if command.duration_clear {
        update.duration_minutes = Some(None);
    }

    if command.until_clear {
        update.end_date = Some(None);
    } else if let Some(until) = &command.until {
        update.end_date = Some(Some(parse_date_time(until)?));
    }

    if command.assignee_clear {
        update.default_assignee_id = Some(None);
    }

    if !command.meta.is_empty() || !command.unset_meta.is_empty() {
        let mut metadata: Metadata = current.metadata.clone();
        apply_metadata_pairs(&mut metadata, &command.meta)?;
        for key in &command.unset_meta {
            metadata.remove(key);
        }
        update.metadata = Some(metadata);
    }

    let updated = repository.update_pattern(current.id, update).await?;

    println!("{} Updated pattern: {}", "✓".green().bold(), updated.title.bright_white().bold());
    println!("  Schedule: {}", describe_schedule(&updated).cyan());
    println!(
        "  {}",
        "Already generated tasks keep their original details.".bright_black()
    );
    Ok(())
}

async fn delete_command<R: Repository>(repository: &R, command: DeletePatternCommand) -> Result<()> {
    let pattern = load_pattern(repository, &command.id).await?;

    if !command.force {
        let prompt = if command.future_tasks {
            format!(
                "Delete pattern '{}' and its upcoming open tasks? All of its tasks will be removed.",
                pattern.title
            )
        } else {
            format!("Delete pattern '{}'? All of its tasks will be removed.", pattern.title)
        };
        let confirmation = Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or(false);

        if !confirmation {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    if repository.delete_pattern(pattern.id, command.future_tasks).await? {
        println!("{} Deleted pattern: {}", "✓".green().bold(), pattern.title);
    } else {
        println!("{} Pattern was already gone", "Info:".yellow().bold());
    }
    Ok(())
}

async fn activate_command<R: Repository>(repository: &R, command: PatternIdCommand) -> Result<()> {
    let pattern_id = resolve_pattern_id(repository, &command.id).await?;
    let outcome = repository.activate_pattern(pattern_id).await?;

    println!("{} Pattern has been activated", "Success:".green().bold());
    print_generated(&outcome.created, &outcome.pattern);
    Ok(())
}

async fn deactivate_command<R: Repository>(repository: &R, command: PatternIdCommand) -> Result<()> {
    let pattern_id = resolve_pattern_id(repository, &command.id).await?;
    repository.deactivate_pattern(pattern_id).await?;

    println!("{} Pattern has been paused", "Success:".green().bold());
    println!("  Existing tasks are kept; no new ones will be generated until it is activated.");
    Ok(())
}

async fn generate_command<R: Repository>(repository: &R, command: GenerateCommand) -> Result<()> {
    let pattern = load_pattern(repository, &command.id).await?;
    if !pattern.is_active {
        println!(
            "{} Pattern '{}' is paused; nothing was generated",
            "Info:".yellow().bold(),
            pattern.title
        );
        return Ok(());
    }

    let created = repository.generate_instances(pattern.id, command.days).await?;
    println!(
        "{} Generated {} task(s) for '{}'",
        "✓".green().bold(),
        created.len(),
        pattern.title
    );
    if !created.is_empty() {
        display_instances(&created, SystemClock.now());
    }
    Ok(())
}

async fn tasks_command<R: Repository>(repository: &R, command: PatternTasksCommand) -> Result<()> {
    let pattern_id = resolve_pattern_id(repository, &command.id).await?;
    let instances = repository.find_instances_for_pattern(pattern_id, command.all).await?;
    display_instances(&instances, SystemClock.now());
    Ok(())
}

async fn preview_command<R: Repository>(repository: &R, command: PreviewCommand) -> Result<()> {
    let pattern = load_pattern(repository, &command.id).await?;
    let today = SystemClock.now().date();
    let from = today.max(pattern.anchor_date());
    let mut through = today + Duration::days(command.days);
    if let Some(end_date) = pattern.end_date {
        through = through.min(end_date.date());
    }

    let dates: Vec<_> = occurrences_between(&pattern, from, through).collect();

    println!(
        "{} {} ({})",
        "Upcoming occurrences of".blue().bold(),
        pattern.title.cyan(),
        short_id(&pattern.id).yellow()
    );
    println!("Schedule: {}", describe_schedule(&pattern));
    if dates.is_empty() {
        println!("No occurrences in the next {} days", command.days);
        return Ok(());
    }
    for (i, date) in dates.iter().enumerate() {
        match pattern.clock_time() {
            Some(time) => println!("  {}. {} {}", i + 1, date.format("%a %Y-%m-%d"), time.format("%H:%M")),
            None => println!("  {}. {}", i + 1, date.format("%a %Y-%m-%d")),
        }
    }
    if !pattern.is_active {
        println!("{}", "Pattern is paused; these will not be generated until it is activated.".bright_black());
    }
    Ok(())
}
