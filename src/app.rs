//! Application context shared by every command.

use std::path::PathBuf;
use std::time::Duration;

use crate::audit::ConsoleMode;
use crate::backlog::BacklogClient;
use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;

pub struct AppContext {
    pub config: Config,
    pub work_dir: PathBuf,
    pub robot_mode: bool,
    pub plain: bool,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let work_dir = std::env::current_dir()?;
        let config = Config::load(cli.config.as_deref(), &work_dir)?;
        Ok(Self {
            config,
            work_dir,
            robot_mode: cli.robot,
            plain: cli.plain,
        })
    }

    /// Console echo mode for run logs.
    pub const fn console_mode(&self) -> ConsoleMode {
        if self.robot_mode {
            ConsoleMode::Silent
        } else if self.plain {
            ConsoleMode::Plain
        } else {
            ConsoleMode::Human
        }
    }

    /// Build the REST client, failing when connection settings are missing.
    pub fn backlog_client(&self) -> Result<BacklogClient> {
        let settings = self.config.backlog.settings()?;
        BacklogClient::new(
            settings,
            Duration::from_secs(self.config.run.timeout_secs.max(1)),
        )
    }

    /// Resolve a path against the working directory.
    pub fn resolve(&self, path: &std::path::Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.work_dir.join(path)
        }
    }
}
