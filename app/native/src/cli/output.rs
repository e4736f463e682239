//! Terminal rendering for job records, run outcomes, and key/value listings.

use std::fmt::Display;

use chrono::{DateTime, Local, Utc};
use colored::{ColoredString, Colorize};
use serde::Serialize;

use crate::scheduler::{JobInfo, JobState};

/// Column at which values start in [`field`] listings.
const LABEL_WIDTH: usize = 12;

/// Longest outcome summary shown before clipping.
const OUTCOME_WIDTH: usize = 80;

/// Prints `label: value` with values aligned in one column.
pub fn field(label: &str, value: impl Display) { println!("{}", field_line(label, value)); }

fn field_line(label: &str, value: impl Display) -> String {
    format!("{:<width$}{value}", format!("{label}:"), width = LABEL_WIDTH)
}

/// Prints `value` as pretty JSON on stdout.
///
/// # Errors
///
/// Returns an error if `value` cannot be serialized.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Job state colored by how the job ended.
#[must_use]
pub fn state(state: JobState) -> ColoredString {
    let label = state.as_str();
    match state {
        JobState::Succeeded => label.green(),
        JobState::Failed => label.red(),
        JobState::Running => label.yellow(),
        JobState::Enqueued => label.cyan(),
        JobState::Cancelled => label.dimmed(),
    }
}

/// Run summary recorded for a job, clipped to one line.
///
/// Failed runs are red, fallback deliveries yellow, everything else green.
#[must_use]
pub fn outcome(job_state: JobState, summary: &str) -> ColoredString {
    let line = clip(summary.lines().next().unwrap_or_default(), OUTCOME_WIDTH);
    if job_state == JobState::Failed {
        line.red()
    } else if summary.starts_with("fallback") {
        line.yellow()
    } else {
        line.green()
    }
}

/// Shortens `text` to at most `max_chars` characters, marking the cut with `…`.
fn clip(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars.saturating_sub(1)) {
        Some((cut, _)) if text.chars().count() > max_chars => format!("{}…", &text[..cut]),
        _ => text.to_string(),
    }
}

#[must_use]
pub fn yes_no(value: bool) -> ColoredString { if value { "yes".green() } else { "no".red() } }

/// Interval in the largest whole units, e.g. `1d`, `6h`, `1h 30m`.
#[must_use]
pub fn interval(secs: u64) -> String {
    let parts = [
        (secs / 86_400, "d"),
        (secs % 86_400 / 3600, "h"),
        (secs % 3600 / 60, "m"),
        (secs % 60, "s"),
    ];
    let text: Vec<String> =
        parts.iter().filter(|(n, _)| *n > 0).map(|(n, unit)| format!("{n}{unit}")).collect();
    if text.is_empty() { "0s".to_string() } else { text.join(" ") }
}

/// Timestamp in local time, or `never`.
#[must_use]
pub fn timestamp(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(
        || "never".to_string(),
        |at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
    )
}

/// Prints the fields of a job record.
pub fn print_job(job: &JobInfo) {
    field("Job", &job.id);
    field("State", state(job.state));
    if let Some(schedule) = &job.schedule {
        field("Every", interval(schedule.interval_secs));
        field("Network", yes_no(schedule.constraints.requires_network));
    }
    if let Some(pid) = job.owner {
        field("Worker", format!("pid {pid}"));
    }
    field("Last run", timestamp(job.last_run));
    if let Some(summary) = job.last_outcome.as_deref() {
        field("Outcome", outcome(job.state, summary));
    }
    field("Runs", job.run_count);
}

/// Masks a credential, keeping a short prefix and the last four characters.
#[must_use]
pub fn mask_credential(credential: &str) -> String {
    let chars: Vec<char> = credential.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let prefix: String = chars[..3].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{prefix}…{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_aligns_values() {
        assert_eq!(field_line("State", "running"), "State:      running");
        assert_eq!(field_line("Last run", "never"), "Last run:   never");
    }

    #[test]
    fn test_field_does_not_cut_long_labels() {
        let label = "A label longer than the column";
        assert_eq!(field_line(label, 1), format!("{label}:1"));
    }

    #[test]
    fn test_clip_keeps_short_summaries() {
        assert_eq!(clip("delivered", 80), "delivered");
        assert_eq!(clip("12345", 5), "12345");
    }

    #[test]
    fn test_clip_counts_characters_not_bytes() {
        assert_eq!(clip("fallback: ключ отсутствует", 12), "fallback: к…");
        assert_eq!(clip("abc", 1), "…");
    }

    #[test]
    fn test_outcome_uses_first_line_only() {
        let rendered = outcome(JobState::Failed, "failed: http 500\nbody follows");
        assert!(rendered.contains("http 500"));
        assert!(!rendered.contains("body follows"));
    }

    #[test]
    fn test_outcome_clips_long_errors() {
        let summary = format!("failed: {}", "x".repeat(200));
        let rendered = outcome(JobState::Failed, &summary);
        assert!(rendered.contains('…'));
        assert!(!rendered.contains(&"x".repeat(100)));
    }

    #[test]
    fn test_interval_units() {
        assert_eq!(interval(86_400), "1d");
        assert_eq!(interval(6 * 3600), "6h");
        assert_eq!(interval(5400), "1h 30m");
        assert_eq!(interval(90_061), "1d 1h 1m 1s");
        assert_eq!(interval(0), "0s");
    }

    #[test]
    fn test_timestamp_without_run_is_never() {
        assert_eq!(timestamp(None), "never");
    }

    #[test]
    fn test_state_keeps_label() {
        assert!(state(JobState::Failed).contains("failed"));
        assert!(state(JobState::Enqueued).contains("enqueued"));
    }

    #[test]
    fn test_mask_credential_keeps_edges() {
        assert_eq!(mask_credential("sk-abcdefghijklmnop"), "sk-…mnop");
    }

    #[test]
    fn test_mask_short_credential_fully() {
        assert_eq!(mask_credential("short"), "*****");
    }
}
