use colored::*;

use crate::cleaner::report::StepOutcome;

/// Format a count with a noun, pluralized with a trailing "s"
pub fn format_count(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

/// Format a path for display, replacing home directory with ~
pub fn format_path(path: &std::path::Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

/// Format a duration given in milliseconds
pub fn format_millis(ms: i64) -> String {
    if ms < 1000 {
        format!("{}ms", ms.max(0))
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        let mins = ms / 60_000;
        let secs = (ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    }
}

/// Short colored tag for a step outcome
pub fn format_outcome(outcome: &StepOutcome) -> ColoredString {
    match outcome {
        StepOutcome::Completed { .. } => "done".green(),
        StepOutcome::Unsupported => "unsupported".dimmed(),
        StepOutcome::Failed { .. } => "failed".red().bold(),
    }
}

/// Truncate a string to max length with ellipsis
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        ".".repeat(max_len)
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0, "cookie"), "0 cookies");
        assert_eq!(format_count(1, "cookie"), "1 cookie");
        assert_eq!(format_count(3, "key"), "3 keys");
    }

    #[test]
    fn test_format_millis() {
        assert_eq!(format_millis(0), "0ms");
        assert_eq!(format_millis(500), "500ms");
        assert_eq!(format_millis(3700), "3.7s");
        assert_eq!(format_millis(125_000), "2m 5s");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("abcd", 3), "...");
    }
}
