//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - `run()` function to execute the command

use crate::app::AppContext;
use crate::cli::Commands;
use crate::error::Result;

pub mod add;
pub mod batch;
pub mod convert;
pub mod delete;
pub mod list;
pub mod update;

/// Dispatch a command to its handler
pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Add(args) => add::run(ctx, args),
        Commands::Delete(args) => delete::run(ctx, args),
        Commands::Update(args) => update::run(ctx, args),
        Commands::List(args) => list::run(ctx, args),
        Commands::Convert(args) => convert::run(ctx.robot_mode, args),
    }
}
