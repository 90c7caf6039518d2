//! CLI module - Command-line interface definitions and handlers
//!
//! Uses clap v4 with derive macros for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod commands;
pub mod output;

/// Bulk-edit Backlog milestone assignments from a CSV export
#[derive(Parser, Debug)]
#[command(name = "milestone-sync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Emit a JSON result on stdout instead of console output
    #[arg(long, global = true)]
    pub robot: bool,

    /// Disable colors in console output
    #[arg(long, global = true)]
    pub plain: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress diagnostic logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file path (default: ./milestone-sync.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a milestone to every issue listed in the CSV
    Add(commands::add::AddArgs),

    /// Remove a milestone from every issue listed in the CSV
    Delete(commands::delete::DeleteArgs),

    /// Set each issue's milestones to the CSV milestone column
    Update(commands::update::UpdateArgs),

    /// List the project's milestones
    List(commands::list::ListArgs),

    /// Convert Shift_JIS CSV files to UTF-8
    Convert(commands::convert::ConvertArgs),
}
