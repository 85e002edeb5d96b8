use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use cachegate::cleaner::{CleanOutcome, VersionGatedCleaner};
use cachegate::cli::args::{Cli, Commands, ConfigAction, OutputFormat};
use cachegate::cli::output;
use cachegate::common::config::Config;
use cachegate::env::Document;
use cachegate::memory::{MemoryPage, PageState};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("cachegate=debug")
            .init();
    }

    match cli.command {
        Commands::Check { ref page } => cmd_check(&cli, page),

        Commands::Clean {
            ref page,
            ref ui,
            dry_run,
        } => cmd_clean(&cli, page, ui.as_deref(), dry_run).await,

        Commands::SetVersion {
            ref version,
            ref page,
        } => cmd_set_version(&cli, version, page),

        Commands::Config { ref action } => cmd_config(action),

        Commands::Completions { ref shell } => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            let shell = match shell {
                cachegate::cli::args::CompletionShell::Bash => clap_complete::Shell::Bash,
                cachegate::cli::args::CompletionShell::Zsh => clap_complete::Shell::Zsh,
                cachegate::cli::args::CompletionShell::Fish => clap_complete::Shell::Fish,
            };
            clap_complete::generate(shell, &mut cmd, "cachegate", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Load config and a page, and build a cleaner over it
fn open_page(cli: &Cli, path: &Path) -> Result<(MemoryPage, VersionGatedCleaner)> {
    let config = Config::load()?;
    let clearer_config = config
        .clearer_config(cli.target.as_deref())
        .with_diagnostics(config.diagnostics || cli.verbose);
    let state = PageState::load(path)?;
    let page = MemoryPage::from_state(state);
    let cleaner = VersionGatedCleaner::new(clearer_config, page.env());
    Ok((page, cleaner))
}

// ─── Check ────────────────────────────────────────────────────────────────────

fn cmd_check(cli: &Cli, path: &Path) -> Result<()> {
    let (page, cleaner) = open_page(cli, path)?;
    let stored = cleaner.stored_version();
    let target = cleaner.target_version();
    let needs_cleaning = cleaner.needs_cleaning();

    match cli.format {
        OutputFormat::Human => {
            if !cli.quiet {
                output::print_page_info(path, &page.document.location().hostname, &target);
            }
            output::print_check(stored.as_deref(), &target, needs_cleaning);
        }
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "stored": stored,
            "target": target,
            "needs_cleaning": needs_cleaning,
        })),
        OutputFormat::Quiet => println!("{}", needs_cleaning),
    }
    Ok(())
}

// ─── Clean ────────────────────────────────────────────────────────────────────

async fn cmd_clean(cli: &Cli, path: &Path, ui: Option<&str>, dry_run: bool) -> Result<()> {
    let (page, cleaner) = open_page(cli, path)?;
    let target = cleaner.target_version();
    let human = matches!(cli.format, OutputFormat::Human);

    if human && !cli.quiet {
        output::print_page_info(path, &page.document.location().hostname, &target);
    }

    let spinner = if human && !cli.quiet {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .context("Invalid spinner template")?,
        );
        pb.set_message("Clearing persisted state...");
        pb.enable_steady_tick(Duration::from_millis(80));
        Some(pb)
    } else {
        None
    };

    let result = match ui {
        Some(mount_id) => cleaner.clean_with_ui_report(mount_id).await,
        None => cleaner.clean().await,
    };

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let outcome = result.context("Clearing pass failed")?;

    if !dry_run && outcome.performed() {
        page.to_state().save(path)?;
    }

    match cli.format {
        OutputFormat::Human => match &outcome {
            CleanOutcome::Skipped => output::print_skipped(&target),
            CleanOutcome::Cleaned(report) => output::print_clean_report(report, dry_run),
        },
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "performed": outcome.performed(),
            "target": target,
            "dry_run": dry_run,
            "report": outcome.report(),
        })),
        OutputFormat::Quiet => {
            output::print_clean_quiet(outcome.performed(), &target, outcome.report())
        }
    }
    Ok(())
}

// ─── Set version ──────────────────────────────────────────────────────────────

fn cmd_set_version(cli: &Cli, version: &str, path: &Path) -> Result<()> {
    let (page, cleaner) = open_page(cli, path)?;
    cleaner
        .update_version(version)
        .context("Failed to record version")?;
    page.to_state().save(path)?;

    match cli.format {
        OutputFormat::Human => output::print_version_set(version),
        OutputFormat::Json => output::print_json(&serde_json::json!({ "version": version })),
        OutputFormat::Quiet => {}
    }
    Ok(())
}

// ─── Config ───────────────────────────────────────────────────────────────────

fn cmd_config(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let config = Config::default();
            config.save()?;
            println!("  {} cachegate initialized at ~/.cachegate", "✓".green());
            println!("  Created: config.toml");
            Ok(())
        }
        ConfigAction::Show => {
            let config = Config::load()?;
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            println!("  {} Configuration reset to defaults", "✓".green());
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(key, value)?;
            config.save()?;
            println!("  {} Set {} = {}", "✓".green(), key, value);
            Ok(())
        }
    }
}
