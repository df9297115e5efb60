use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "imperator")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Project declarative service definitions into device command properties", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Project a declaration against a rule table
    Project(ProjectArgs),

    /// Validate a rule table for internal consistency
    Check(CheckArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Project
// ============================================================================

#[derive(Parser)]
pub struct ProjectArgs {
    /// Declaration file (JSON)
    pub declaration: PathBuf,

    /// Command family to project the declaration against
    #[arg(short, long)]
    pub command: String,

    /// Rule table file (JSON); falls back to the configured default
    #[arg(short, long)]
    pub table: Option<PathBuf>,

    /// Target software version
    #[arg(long)]
    pub target_version: Option<String>,

    /// Provisioned feature modules (comma-separated)
    #[arg(short, long)]
    pub modules: Option<String>,

    /// Emit the raw projections as JSON
    #[arg(long)]
    pub json: bool,

    /// Number of parallel jobs for multi-entity declarations
    #[arg(short, long, default_value = "4")]
    pub jobs: usize,
}

// ============================================================================
// Check
// ============================================================================

#[derive(Parser)]
pub struct CheckArgs {
    /// Rule table file (JSON); falls back to the configured default
    pub table: Option<PathBuf>,
}
