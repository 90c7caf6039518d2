//! milestone-sync convert - Re-encode Shift_JIS CSV exports as UTF-8

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;

use crate::cli::output::{emit_json, robot_ok};
use crate::error::Result;
use crate::input::convert_directory;

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Directory with Shift_JIS CSV files
    #[arg(long, default_value = "csv/input_shift_jis")]
    pub input: PathBuf,

    /// Directory for the UTF-8 copies (created if missing)
    #[arg(long, default_value = "csv/input_utf_8")]
    pub output: PathBuf,
}

/// Runs without loading config; conversion needs no tracker settings.
pub fn run(robot: bool, args: &ConvertArgs) -> Result<()> {
    let converted = convert_directory(&args.input, &args.output)?;

    if robot {
        return emit_json(&robot_ok(serde_json::json!({
            "count": converted.len(),
            "files": converted,
        })));
    }

    for file in &converted {
        let line = format!(
            "Converted: {} -> {}",
            file.input.display(),
            file.output.display()
        );
        if file.had_errors {
            println!("{} {}", line.yellow(), "(some bytes replaced)".dimmed());
        } else {
            println!("{}", line.green());
        }
    }
    if converted.is_empty() {
        println!("{}", "No CSV files found".dimmed());
    } else {
        println!();
        println!("All CSV files converted ({})", converted.len());
    }
    Ok(())
}
