//! Shared flags and runner for the add, delete and update commands.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::audit::{RunLog, render_names};
use crate::cli::output::{emit_json, robot_ok};
use crate::config::Config;
use crate::core::{Operation, RetryConfig, RunConfig, RunSummary, ThreadSleeper, run_batch};
use crate::error::{Result, SyncError};
use crate::input::read_rows;

#[derive(Args, Debug, Clone, Default)]
pub struct BatchArgs {
    /// CSV file listing issue keys (default: CSV_FILE)
    #[arg(long, value_name = "FILE")]
    pub csv: Option<PathBuf>,

    /// Column holding the issue key (default: ISSUE_KEY_COLUMN or "キー")
    #[arg(long, value_name = "COLUMN")]
    pub issue_key_column: Option<String>,

    /// Compute and log changes without updating any issue
    #[arg(long)]
    pub dry_run: bool,

    /// Apply changes even if dry-run is enabled in the config or environment
    #[arg(long)]
    pub no_dry_run: bool,

    /// Leave issues alone that already carry this milestone (repeatable)
    #[arg(long = "skip-if-present", value_name = "MILESTONE")]
    pub skip_if_present: Vec<String>,

    /// Wait between rows in milliseconds (default: 800)
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// Directory for run logs (default: LOG_DIR or "logs")
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

impl BatchArgs {
    /// `--no-dry-run` wins over everything, `--dry-run` over config.
    pub fn dry_run(&self, config: &Config) -> bool {
        !self.no_dry_run && (self.dry_run || config.run.dry_run)
    }

    /// Flags override config; skip names from both sources are combined.
    pub fn run_config(&self, operation: Operation, config: &Config) -> RunConfig {
        let skip_if_present: BTreeSet<String> = config
            .run
            .skip_if_milestone_exists
            .iter()
            .chain(&self.skip_if_present)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();

        RunConfig {
            operation,
            skip_if_present,
            dry_run: self.dry_run(config),
            delay: Duration::from_millis(self.delay_ms.unwrap_or(config.run.delay_ms)),
            retry: RetryConfig {
                max_attempts: config.run.retry_attempts,
                base_delay: Duration::from_millis(config.run.retry_base_delay_ms),
            },
            issue_key_column: self
                .issue_key_column
                .clone()
                .unwrap_or_else(|| config.csv.issue_key_column.clone()),
        }
    }
}

#[derive(Debug, Serialize)]
struct BatchReport<'a> {
    command: &'a str,
    dry_run: bool,
    #[serde(flatten)]
    summary: &'a RunSummary,
    log_file: &'a Path,
}

/// Run one batch command end to end.
pub fn execute(ctx: &AppContext, args: &BatchArgs, operation: Operation) -> Result<()> {
    let config = &ctx.config;
    let run_config = args.run_config(operation, config);
    run_config.validate()?;

    let csv_path = args
        .csv
        .clone()
        .or_else(|| config.csv.file.clone())
        .map(|path| ctx.resolve(&path))
        .ok_or_else(|| SyncError::MissingConfig("CSV_FILE".to_string()))?;
    let client = ctx.backlog_client()?;

    let log_dir = ctx.resolve(args.log_dir.as_deref().unwrap_or(config.run.log_dir.as_path()));
    let mut log = RunLog::create(&log_dir, &run_config.log_prefix(), ctx.console_mode())?;
    let settings = client.settings();
    let log_line = format!("Log file: {}", log.path().display());
    log.log(&log_line);
    log.log(&format!(
        "Space: {}, Project: {}",
        settings.space_url, settings.project_key
    ));
    log.log(&format!("CSV: {}", csv_path.display()));
    log.log(&format!("Mode: {}", run_config.mode_label()));
    match &run_config.operation {
        Operation::Add { milestone } | Operation::Delete { milestone } => {
            log.log(&format!("Target Milestone: {milestone}"));
        }
        Operation::Reconcile { milestone_column } => {
            log.log(&format!("Milestone Column: {milestone_column}"));
        }
    }
    let skip: Vec<String> = run_config.skip_if_present.iter().cloned().collect();
    log.log(&format!("Skip If Present: {}", render_names(&skip)));

    let summary = read_rows(&csv_path)
        .and_then(|rows| run_batch(&run_config, &client, &rows, &mut log, &ThreadSleeper))
        .inspect_err(|err| log.error(&err.to_string()))?;

    if ctx.robot_mode {
        emit_json(&robot_ok(BatchReport {
            command: run_config.operation.log_prefix(),
            dry_run: run_config.dry_run,
            summary: &summary,
            log_file: log.path(),
        }))?;
    }
    Ok(())
}
