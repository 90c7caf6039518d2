//! milestone-sync list - List the project's milestones

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::audit::RunLog;
use crate::backlog::Milestone;
use crate::cli::output::{emit_json, robot_ok};
use crate::core::MilestoneDirectory;
use crate::error::Result;

const LOG_PREFIX: &str = "milestones-list";

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Hide archived milestones
    #[arg(long)]
    pub active: bool,

    /// Directory for run logs (default: LOG_DIR or "logs")
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Serialize)]
struct ListReport<'a> {
    count: usize,
    milestones: Vec<&'a Milestone>,
    log_file: PathBuf,
}

pub fn run(ctx: &AppContext, args: &ListArgs) -> Result<()> {
    let client = ctx.backlog_client()?;
    let log_dir = ctx.resolve(args.log_dir.as_deref().unwrap_or(ctx.config.run.log_dir.as_path()));
    let mut log = RunLog::create(&log_dir, LOG_PREFIX, ctx.console_mode())?;
    let log_line = format!("Log file: {}", log.path().display());
    log.log(&log_line);
    let settings = client.settings();
    log.log(&format!(
        "Space: {}, Project: {}",
        settings.space_url, settings.project_key
    ));

    let directory = MilestoneDirectory::fetch(&client)
        .inspect_err(|err| log.error(&err.to_string()))?;
    let milestones = visible(&directory, args.active);

    log.log(&format!("Milestones: {}", milestones.len()));
    for milestone in &milestones {
        log.log(&format_line(milestone));
    }

    if ctx.robot_mode {
        emit_json(&robot_ok(ListReport {
            count: milestones.len(),
            milestones,
            log_file: log.path().to_path_buf(),
        }))?;
    }
    Ok(())
}

fn visible(directory: &MilestoneDirectory, active_only: bool) -> Vec<&Milestone> {
    directory
        .milestones()
        .iter()
        .filter(|m| !(active_only && m.archived))
        .collect()
}

/// `id<TAB>name`, with an `(archived)` column for archived milestones.
fn format_line(milestone: &Milestone) -> String {
    if milestone.archived {
        format!("{}\t{}\t(archived)", milestone.id, milestone.name)
    } else {
        format!("{}\t{}", milestone.id, milestone.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> MilestoneDirectory {
        let mut old = Milestone::new(1, "v0.9");
        old.archived = true;
        MilestoneDirectory::from_milestones(vec![old, Milestone::new(2, "v1.0")])
    }

    #[test]
    fn lines_are_tab_separated() {
        let dir = directory();
        let lines: Vec<String> = visible(&dir, false).into_iter().map(format_line).collect();
        assert_eq!(lines, vec!["1\tv0.9\t(archived)", "2\tv1.0"]);
    }

    #[test]
    fn active_hides_archived() {
        let dir = directory();
        let names: Vec<&str> = visible(&dir, true).iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["v1.0"]);
    }
}
