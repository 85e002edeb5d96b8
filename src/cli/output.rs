use colored::*;
use serde::Serialize;
use std::path::Path;

use crate::cleaner::{ClearReport, StepOutcome};
use crate::common::format::{self, format_count, format_outcome, format_path};

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing output: {}", e),
    }
}

/// Print the page being worked on
pub fn print_page_info(page: &Path, hostname: &str, target: &str) {
    println!();
    println!("  {} Page: {}", "📄", format_path(page).bold());
    println!("  {} Host: {}", "  ", hostname.dimmed());
    println!("  {} Target version: {}", "  ", target.cyan());
    println!();
}

/// Print the outcome of a marker check
pub fn print_check(stored: Option<&str>, target: &str, needs_cleaning: bool) {
    let stored_label = stored.unwrap_or("(none)");
    format::print_kv("Stored marker", stored_label);
    format::print_kv("Target", target);
    println!();
    if needs_cleaning {
        println!(
            "  {} {}",
            "●".yellow(),
            "Cleaning needed".yellow().bold()
        );
        println!(
            "  {} Run {} to clear",
            "💡",
            "cachegate clean --page <file>".cyan()
        );
    } else {
        println!(
            "  {} {}",
            "●".green(),
            "Up to date".green().bold()
        );
    }
    println!();
}

/// Print why nothing happened
pub fn print_skipped(target: &str) {
    println!(
        "  {} Already cleared for {}, nothing to do",
        "✨",
        target.cyan()
    );
    println!();
}

/// Print a clearing pass report
pub fn print_clean_report(report: &ClearReport, dry_run: bool) {
    let heading = if dry_run {
        "Clearing pass (dry run)"
    } else {
        "Clearing pass"
    };
    println!(
        "  {} {} for {} in {}",
        "🧹",
        heading.bold(),
        report.version.cyan(),
        format::format_millis(report.duration_millis()).dimmed()
    );
    println!("{}", "─".repeat(60).dimmed());

    for entry in &report.steps {
        let detail = match &entry.outcome {
            StepOutcome::Completed { affected } => step_detail(entry.step, *affected),
            StepOutcome::Unsupported => "not available in this browser".to_string(),
            StepOutcome::Failed { reason } => format::truncate(reason, 60),
        };
        println!(
            "    {:<22} {:<12} {}",
            entry.step.to_string(),
            format_outcome(&entry.outcome),
            detail.dimmed()
        );
    }
    println!("{}", "─".repeat(60).dimmed());

    let failures = report.failures();
    if !failures.is_empty() {
        println!(
            "  {} {}",
            "⚠".yellow(),
            format!("{} steps failed; the rest still ran", failures.len()).yellow()
        );
    }
    if report.marker_written {
        println!(
            "  {} Marker recorded: {}",
            "✓".green(),
            report.version.cyan()
        );
    }
    println!();
}

fn step_detail(step: crate::cleaner::Step, affected: usize) -> String {
    use crate::cleaner::Step;
    match step {
        Step::DurableStore | Step::SessionStore => format_count(affected, "key") + " removed",
        Step::Cookies => format_count(affected, "cookie") + " expired",
        Step::AppCache => {
            if affected == 0 {
                "nothing cached".to_string()
            } else {
                "marked obsolete".to_string()
            }
        }
        Step::Workers => format_count(affected, "worker") + " unregistered",
        Step::CacheStorage => format_count(affected, "cache") + " deleted",
        Step::CacheBust => format_count(affected, "asset") + " refetched",
    }
}

/// Print a minimal summary: performed flag, version, failed step count
pub fn print_clean_quiet(performed: bool, version: &str, report: Option<&ClearReport>) {
    let failed = report.map(|r| r.failures().len()).unwrap_or(0);
    println!("{}  {}  {}", performed, version, failed);
}

/// Print a confirmation for `set-version`
pub fn print_version_set(version: &str) {
    println!(
        "  {} Marker set to {}; the next load will not clear",
        "✓".green(),
        version.cyan()
    );
}
