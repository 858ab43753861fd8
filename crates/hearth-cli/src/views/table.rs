use chrono::NaiveDateTime;
use chrono_humanize::HumanTime;
use comfy_table::{Attribute, Cell, Color, Row, Table};
use hearth_core::models::{Frequency, RecurringPattern, TaskInstance, TaskStatus};
use hearth_core::repository::short_id;

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// One-line description of a pattern's rule, e.g. "every 2 weeks on Mon, Fri at 16:00".
pub fn describe_schedule(pattern: &RecurringPattern) -> String {
    let unit = match pattern.frequency {
        Frequency::Daily => "day",
        Frequency::Weekly => "week",
        Frequency::Monthly => "month",
        Frequency::Yearly => "year",
    };
    let mut text = if pattern.interval == 1 {
        format!("every {}", unit)
    } else {
        format!("every {} {}s", pattern.interval, unit)
    };

    match (pattern.frequency, pattern.by_day.as_deref()) {
        (Frequency::Weekly, Some(days)) if !days.is_empty() => {
            let names: Vec<String> = days
                .iter()
                .map(|d| match usize::try_from(*d).ok().and_then(|i| WEEKDAYS.get(i)) {
                    Some(name) => name.to_string(),
                    None => format!("#{}", d),
                })
                .collect();
            text.push_str(&format!(" on {}", names.join(", ")));
        }
        (Frequency::Monthly, Some(days)) if !days.is_empty() => {
            let numbers: Vec<String> = days.iter().map(|d| d.to_string()).collect();
            text.push_str(&format!(" on day {}", numbers.join(", ")));
        }
        _ => {}
    }

    if let Some(time) = pattern.clock_time() {
        text.push_str(&format!(" at {}", time.format("%H:%M")));
    }
    text
}

pub fn display_patterns(patterns: &[RecurringPattern]) {
    if patterns.is_empty() {
        println!("No patterns found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Schedule", "Starts", "Generated Until", "Active"]);

    for pattern in patterns {
        let mut row = Row::new();
        row.add_cell(Cell::new(short_id(&pattern.id)));

        let mut title_cell = Cell::new(&pattern.title);
        if !pattern.is_active {
            title_cell = title_cell.fg(Color::DarkGrey);
        }
        row.add_cell(title_cell);
        row.add_cell(Cell::new(describe_schedule(pattern)));
        row.add_cell(Cell::new(pattern.start_date.format("%Y-%m-%d")));
        row.add_cell(Cell::new(
            pattern
                .last_generated_until
                .map(|until| until.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "Never".to_string()),
        ));
        row.add_cell(if pattern.is_active {
            Cell::new("Yes").fg(Color::Green)
        } else {
            Cell::new("No").fg(Color::Red)
        });
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_instances(instances: &[TaskInstance], now: NaiveDateTime) {
    if instances.is_empty() {
        println!("No tasks found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Date", "Due", "Status"]);

    for instance in instances {
        let mut row = Row::new();
        row.add_cell(Cell::new(short_id(&instance.id)));

        let mut title_cell = Cell::new(&instance.title);
        if matches!(instance.status, TaskStatus::Done | TaskStatus::Canceled) {
            title_cell = title_cell
                .add_attribute(Attribute::CrossedOut)
                .fg(Color::DarkGrey);
        }
        row.add_cell(title_cell);

        row.add_cell(Cell::new(
            instance
                .occurrence_date
                .map(|d| d.format("%a %Y-%m-%d").to_string())
                .unwrap_or_else(|| "None".to_string()),
        ));

        let due_cell = match instance.due_at {
            Some(due_at) => {
                let text = format!("{} ({})", due_at.format("%H:%M"), HumanTime::from(due_at - now));
                if instance.status.is_open() && due_at < now {
                    Cell::new(text).fg(Color::Red) // Overdue
                } else if instance.status.is_open() && due_at.date() == now.date() {
                    Cell::new(text).fg(Color::Yellow) // Due today
                } else {
                    Cell::new(text)
                }
            }
            None => Cell::new("Any time"),
        };
        row.add_cell(due_cell);

        let status_cell = Cell::new(instance.status.to_string());
        row.add_cell(match instance.status {
            TaskStatus::Done => status_cell.fg(Color::Green),
            TaskStatus::Canceled => status_cell.fg(Color::DarkGrey),
            TaskStatus::InProgress => status_cell.fg(Color::Cyan),
            TaskStatus::Todo => status_cell,
        });
        table.add_row(row);
    }

    println!("{table}");
}
