use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// cachegate: version-gated clearing of a page's persisted browser state
#[derive(Parser, Debug)]
#[command(
    name = "cachegate",
    version,
    about = "Version-gated clearing of a page's persisted browser state",
    long_about = "cachegate clears storage, cookies, service workers and cached responses\n\
                   once per content version, then records the version so it is not repeated.\n\
                   Pages are simulated from JSON state files.",
    after_help = "EXAMPLES:\n  \
        cachegate check --page page.json               Does this page need clearing?\n  \
        cachegate clean --page page.json --target V2.1  Clear for version V2.1\n  \
        cachegate clean --page page.json --ui status    Clear with progress UI in #status\n  \
        cachegate set-version V2.1 --page page.json     Record V2.1 without clearing\n  \
        cachegate config set target_version V2.1        Change the default target"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Target version (overrides the configured one)
    #[arg(long, short, global = true, env = "CACHEGATE_TARGET", value_name = "VERSION")]
    pub target: Option<String>,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode, minimal output
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report whether a page's marker is stale
    Check {
        /// Page state file (JSON)
        #[arg(long, value_name = "FILE")]
        page: PathBuf,
    },

    /// Run a clearing pass against a page
    Clean {
        /// Page state file (JSON), rewritten in place
        #[arg(long, value_name = "FILE")]
        page: PathBuf,

        /// Render progress into the element with this id
        #[arg(long, value_name = "ID")]
        ui: Option<String>,

        /// Run the pass without writing the page file back
        #[arg(long)]
        dry_run: bool,
    },

    /// Record a version without clearing anything
    SetVersion {
        /// Version to record
        version: String,

        /// Page state file (JSON), rewritten in place
        #[arg(long, value_name = "FILE")]
        page: PathBuf,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset to default configuration
    Reset,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },

    /// Write the default config to ~/.cachegate
    Init,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Quiet,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
