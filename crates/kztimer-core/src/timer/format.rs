//! Chat formatting for run times.

use super::listener::RunResult;

/// Format a duration in seconds, rounded to the millisecond.
///
/// Under an hour this is `MM:SS.mmm` (`M:SS` when not `precise`), otherwise
/// `H:MM:SS.mmm` (`H:MM:SS`).
pub fn format_time(seconds: f64, precise: bool) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;
    let hours = total_secs / 3600;

    match (hours, precise) {
        (0, true) => format!("{:02}:{:02}.{:03}", mins, secs, ms),
        (0, false) => format!("{}:{:02}", mins, secs),
        (_, true) => format!("{}:{:02}:{:02}.{:03}", hours, mins, secs, ms),
        (_, false) => format!("{}:{:02}:{:02}", hours, mins, secs),
    }
}

/// Server-wide announcement for a finished run.
pub fn end_message(
    prefix: &str,
    player_name: &str,
    run: &RunResult,
    mode_short: &str,
    style_short: &str,
) -> String {
    let course = if run.course.is_empty() {
        " ".to_string()
    } else {
        format!(" course {{default}}{}{{grey}} ", run.course)
    };
    let pro = if run.is_pro() { " {blue}PRO{grey} " } else { " " };
    let tags = if run.is_pro() {
        format!("{{purple}}{} {{grey}}|{{purple}} {}{{grey}}", mode_short, style_short)
    } else {
        format!(
            "{{purple}}{} {{grey}}|{{purple}} {} {{grey}}|{{purple}} {} {{grey}}TPs",
            mode_short, style_short, run.teleports_used
        )
    };

    format!(
        "{} {{lime}}{} {{grey}}finished{}with a{}run of {{default}}{}{{grey}}! [{}]",
        prefix,
        player_name,
        course,
        pro,
        format_time(run.time, true),
        tags
    )
}
