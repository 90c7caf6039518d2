//! Console + append-only file logger for one run.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use colored::Colorize;
use tracing::warn;

use crate::core::RunSummary;
use crate::error::{Result, SyncError};

use super::{AuditSink, DiffRecord, DiffStatus};

const INDENT: &str = "  ";

/// How lines are echoed to the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleMode {
    /// Colored output.
    #[default]
    Human,
    /// Uncolored output.
    Plain,
    /// File only (robot mode keeps stdout for JSON).
    Silent,
}

/// `{prefix}-YYYYMMDD-HHMMSS.log`
pub fn log_file_name(prefix: &str, at: DateTime<Local>) -> String {
    format!("{prefix}-{}.log", at.format("%Y%m%d-%H%M%S"))
}

/// Run logger writing every line to the console and to a log file.
#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    file: File,
    console: ConsoleMode,
    depth: usize,
    issue_group_open: bool,
    write_failed: bool,
}

impl RunLog {
    /// Create `log_dir` if needed and open a fresh log file in it.
    pub fn create(log_dir: &Path, prefix: &str, console: ConsoleMode) -> Result<Self> {
        fs::create_dir_all(log_dir).map_err(|err| {
            SyncError::Config(format!(
                "cannot create log directory {}: {err}",
                log_dir.display()
            ))
        })?;
        let path = log_dir.join(log_file_name(prefix, Local::now()));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file,
            console,
            depth: 0,
            issue_group_open: false,
            write_failed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write an informational line.
    pub fn log(&mut self, line: &str) {
        self.echo(line, None);
        self.write_line(line);
    }

    /// Write a line prefixed with `ERROR:` in the file, red on the console.
    pub fn error(&mut self, line: &str) {
        if self.console != ConsoleMode::Silent {
            let indent = INDENT.repeat(self.depth);
            if self.console == ConsoleMode::Human {
                eprintln!("{indent}{}", line.red());
            } else {
                eprintln!("{indent}{line}");
            }
        }
        self.write_line(&format!("ERROR: {line}"));
    }

    /// Open an indented group under `label`.
    pub fn group(&mut self, label: &str) {
        if self.console != ConsoleMode::Silent {
            println!();
        }
        self.echo(label, Some(Tone::Header));
        self.write_raw("\n");
        self.write_line(label);
        self.depth += 1;
    }

    pub fn group_end(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn echo(&self, line: &str, tone: Option<Tone>) {
        let indent = INDENT.repeat(self.depth);
        match (self.console, tone) {
            (ConsoleMode::Silent, _) => {}
            (ConsoleMode::Human, Some(tone)) => println!("{indent}{}", tone.paint(line)),
            _ => println!("{indent}{line}"),
        }
    }

    fn write_line(&mut self, line: &str) {
        let text = format!("{}{line}\n", INDENT.repeat(self.depth));
        self.write_raw(&text);
    }

    fn write_raw(&mut self, text: &str) {
        if let Err(err) = self.file.write_all(text.as_bytes()) {
            if !self.write_failed {
                warn!(path = %self.path.display(), error = %err, "Failed to write run log");
            }
            self.write_failed = true;
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Tone {
    Header,
    Changed,
    Unchanged,
    Skipped,
    Ok,
}

impl Tone {
    fn paint(self, text: &str) -> String {
        match self {
            Self::Header => text.bold().to_string(),
            Self::Changed => text.green().to_string(),
            Self::Unchanged => text.dimmed().to_string(),
            Self::Skipped => text.yellow().to_string(),
            Self::Ok => text.green().bold().to_string(),
        }
    }
}

impl AuditSink for RunLog {
    fn empty_key_row(&mut self, row_number: usize, column: &str) {
        self.log(&format!("row#{row_number}: skipped ({column} is empty)"));
    }

    fn begin_issue(&mut self, position: usize, total: usize, issue_key: &str) {
        self.log(&format!("[{position}/{total}] processing: {issue_key}"));
    }

    fn emit_diff(&mut self, record: &DiffRecord) {
        self.group(&record.header());
        self.issue_group_open = true;
        let line = record.diff_line();
        let tone = match record.status {
            DiffStatus::Apply => Tone::Changed,
            DiffStatus::NoChange => Tone::Unchanged,
            DiffStatus::Skip | DiffStatus::HasSkipMilestone => Tone::Skipped,
        };
        self.echo(&line, Some(tone));
        self.write_line(&line);
    }

    fn note(&mut self, _issue_key: Option<&str>, message: &str) {
        self.echo(message, Some(Tone::Skipped));
        self.write_line(message);
    }

    fn mutation_applied(&mut self, _issue_key: &str) {
        self.echo("updated", Some(Tone::Ok));
        self.write_line("updated");
    }

    fn failure(&mut self, _issue_key: &str, error: &SyncError) {
        let line = match error {
            SyncError::Mutation { .. } => format!("update failed: {error}"),
            _ => error.to_string(),
        };
        self.error(&line);
    }

    fn end_issue(&mut self, _issue_key: &str) {
        if self.issue_group_open {
            self.group_end();
            self.issue_group_open = false;
        }
    }

    fn finish(&mut self, summary: &RunSummary) {
        self.log("");
        self.log(&format!(
            "All issues processed (rows={}, processed={}, skipped={})",
            summary.row_count, summary.processed_count, summary.skipped_count
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn file_name_uses_local_timestamp() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            log_file_name("add-milestone-dry-run", at),
            "add-milestone-dry-run-20240309-070501.log"
        );
    }

    #[test]
    fn writes_groups_errors_and_summary() {
        let dir = TempDir::new().unwrap();
        let log_dir = dir.path().join("nested/logs");
        let mut log = RunLog::create(&log_dir, "update", ConsoleMode::Silent).unwrap();

        log.log("Mode: APPLY");
        log.emit_diff(&DiffRecord {
            issue_key: "PRJ-1".into(),
            summary: "Crash".into(),
            before: vec!["v1".into()],
            after: vec!["v1".into(), "v2".into()],
            status: DiffStatus::Apply,
            dry_run: false,
        });
        log.failure(
            "PRJ-1",
            &SyncError::Mutation {
                issue_key: "PRJ-1".into(),
                status: Some(500),
                message: "boom".into(),
            },
        );
        log.end_issue("PRJ-1");
        log.empty_key_row(2, "キー");
        log.finish(&RunSummary {
            row_count: 2,
            processed_count: 1,
            skipped_count: 1,
            ..RunSummary::default()
        });

        assert!(log.path().starts_with(&log_dir));
        let text = fs::read_to_string(log.path()).unwrap();
        assert!(text.contains("Mode: APPLY\n"));
        assert!(text.contains("\n[APPLY] PRJ-1 Crash\n"));
        assert!(text.contains("  changed: v1 -> v1, v2\n"));
        assert!(text.contains("  ERROR: update failed: "));
        assert!(text.contains("\nrow#2: skipped (キー is empty)\n"));
        assert!(text.contains("All issues processed (rows=2, processed=1, skipped=1)"));
    }
}
