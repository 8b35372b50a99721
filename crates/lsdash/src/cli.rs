//! Clap derive structures for the `lsdash` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// lsdash -- your LearningStudio courses at a glance
#[derive(Debug, Parser)]
#[command(
    name = "lsdash",
    version,
    about = "LearningStudio course dashboard for the command line",
    long_about = "Sign in to LearningStudio and see what is due, what happened,\n\
        your running grades and unread announcements across the active term.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config dir)
    #[arg(long, env = "LSDASH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "LSDASH_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (overrides config)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and remember the credentials
    Login(LoginArgs),

    /// Forget the stored credentials and cached data
    Logout,

    /// Reload everything and report what is new since the last sync
    Sync,

    /// Check for new items without a full sync (at most hourly)
    Probe,

    /// List courses or change their visibility
    Courses(CoursesArgs),

    /// Items due in the search window
    Due,

    /// Recent activity feed
    #[command(alias = "feed")]
    Activity,

    /// Running grades per course
    Grades,

    /// Unread announcements
    #[command(alias = "announcements")]
    News,

    /// Mark an announcement as read
    Read {
        /// Course id
        course_id: String,
        /// Announcement id
        announcement_id: String,
    },

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Login ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// LearningStudio username (prompted if omitted)
    #[arg(long, short = 'u', env = "LSDASH_USERNAME")]
    pub username: Option<String>,

    /// Password (prompted if omitted)
    #[arg(long, env = "LSDASH_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

// ── Courses ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CoursesArgs {
    #[command(subcommand)]
    pub command: Option<CoursesCommand>,
}

#[derive(Debug, Subcommand)]
pub enum CoursesCommand {
    /// List visible and hidden courses
    #[command(alias = "ls")]
    List,

    /// Hide a course from every view
    Hide {
        /// Course id
        id: String,
    },

    /// Show a previously hidden course
    Show {
        /// Course id
        id: String,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,

    /// Show the effective configuration
    Show,

    /// Set how many days back and ahead the dashboard looks
    SetDays {
        /// Days into the past (0 restores the default)
        #[arg(long)]
        past: Option<i64>,

        /// Days into the future (0 restores the default)
        #[arg(long)]
        future: Option<i64>,
    },

    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
