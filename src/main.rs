//! milestone-sync - Backlog milestone bulk editor
//!
//! Adds, removes or reconciles milestones on the issues listed in a CSV export.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use milestone_sync::Result;
use milestone_sync::app::AppContext;
use milestone_sync::cli::output::{emit_json, robot_error};
use milestone_sync::cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.robot {
                // Robot mode: structured JSON error on stdout
                if emit_json(&robot_error(&e)).is_err() {
                    eprintln!("Error: {e}");
                }
            } else {
                eprintln!("Error: {e}");
                eprintln!("Hint: {}", e.code().suggestion());
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    if let Commands::Convert(args) = &cli.command {
        return milestone_sync::cli::commands::convert::run(cli.robot, args);
    }
    // .env is optional; values already in the environment win.
    let _ = dotenvy::dotenv();
    let ctx = AppContext::from_cli(cli)?;
    milestone_sync::cli::commands::run(&ctx, &cli.command)
}

fn init_tracing(cli: &Cli) {
    if cli.quiet {
        return;
    }

    let filter = match cli.verbose {
        0 => "warn,milestone_sync=warn",
        1 => "info,milestone_sync=info",
        2 => "debug,milestone_sync=debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    if cli.robot {
        // JSON logging for robot mode
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        // Human-readable logging
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
