//! CLI output formatting

use crate::core::{Action, Job, LogRecord, Machine, Outcome, RunStatus};
use chrono::{DateTime, Utc};
use console::Emoji;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Format a run status for display
pub fn format_status(status: RunStatus) -> String {
    match status {
        RunStatus::Pending => style("PENDING").dim().to_string(),
        RunStatus::Running => style("RUNNING").yellow().to_string(),
        RunStatus::Finished => style("FINISHED").green().to_string(),
        RunStatus::Error => style("ERROR").red().to_string(),
    }
}

/// Format the end of a followed log
pub fn format_outcome(log_id: &str, outcome: Outcome) -> String {
    match outcome {
        Outcome::Finished => format!(
            "{} Run {} {}",
            CHECK,
            style(short_id(log_id)).dim(),
            style("finished").green()
        ),
        Outcome::Error => format!(
            "{} Run {} {}",
            CROSS,
            style(short_id(log_id)).dim(),
            style("failed").red()
        ),
    }
}

/// One line per run record
pub fn format_log_record(record: &LogRecord) -> String {
    let icon = match record.status {
        RunStatus::Finished => CHECK,
        RunStatus::Error => CROSS,
        RunStatus::Running => SPINNER,
        RunStatus::Pending => INFO,
    };

    let duration = match (record.start_time, record.end_time) {
        (Some(start), Some(end)) => end
            .signed_duration_since(start)
            .to_std()
            .map(format_duration)
            .unwrap_or_default(),
        _ => String::new(),
    };

    format!(
        "{} {} - {} - {} - {} -> {} {}",
        icon,
        style(&record.id).dim(),
        style(&record.job_id).bold(),
        format_status(record.status),
        format_time(record.start_time, "not started"),
        format_time(record.end_time, "running"),
        style(duration).cyan()
    )
    .trim_end()
    .to_string()
}

pub fn format_job(job: &Job) -> String {
    let machines: Vec<&str> = job.pipeline.iter().map(|s| s.machine.as_str()).collect();
    format!(
        "  {} ({} steps on {})",
        style(&job.id).bold(),
        style(job.pipeline.len()).cyan(),
        machines.join(", ")
    )
}

pub fn format_action(action: &Action) -> String {
    format!(
        "  {} on {}: {}",
        style(&action.id).bold(),
        style(&action.machine).cyan(),
        style(&action.command).dim()
    )
}

pub fn format_machine(machine: &Machine) -> String {
    format!(
        "  {} {}@{}:{}",
        style(&machine.id).bold(),
        machine.user,
        machine.address,
        style(machine.port).dim()
    )
}

fn format_time(time: Option<DateTime<Utc>>, missing: &str) -> String {
    match time {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => style(missing).dim().to_string(),
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
