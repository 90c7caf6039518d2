use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::backlog::{BacklogSettings, DEFAULT_TIMEOUT_SECS};
use crate::error::{Result, SyncError};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "MILESTONE_SYNC_CONFIG";

/// Config file looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = "milestone-sync.toml";

/// Source of environment values, so tests never touch the process env.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backlog: BacklogConfig,
    #[serde(default)]
    pub csv: CsvConfig,
    #[serde(default)]
    pub run: RunSettings,
}

impl Config {
    /// Defaults, then config files, then the process environment.
    pub fn load(explicit_path: Option<&Path>, work_dir: &Path) -> Result<Self> {
        Self::load_with(explicit_path, work_dir, &|key: &str| std::env::var(key).ok())
    }

    pub fn load_with(explicit_path: Option<&Path>, work_dir: &Path, env: EnvLookup<'_>) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| env_string(env, CONFIG_ENV).map(PathBuf::from));

        if let Some(path) = explicit {
            let patch = Self::load_patch(&path)?.ok_or_else(|| {
                SyncError::Config(format!("config file not found: {}", path.display()))
            })?;
            config.merge_patch(patch);
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_patch(&work_dir.join(PROJECT_CONFIG_FILE))? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides(env)?;

        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        match dirs::config_dir() {
            Some(dir) => Self::load_patch(&dir.join("milestone-sync/config.toml")),
            None => Ok(None),
        }
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| SyncError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| SyncError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.backlog {
            self.backlog.merge(patch);
        }
        if let Some(patch) = patch.csv {
            self.csv.merge(patch);
        }
        if let Some(patch) = patch.run {
            self.run.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self, env: EnvLookup<'_>) -> Result<()> {
        if let Some(value) = env_string(env, "BACKLOG_SPACE_URL") {
            self.backlog.space_url = Some(value);
        }
        if let Some(value) = env_string(env, "BACKLOG_API_KEY") {
            self.backlog.api_key = Some(value);
        }
        if let Some(value) = env_string(env, "BACKLOG_PROJECT_KEY") {
            self.backlog.project_key = Some(value);
        }

        if let Some(value) = env_string(env, "CSV_FILE") {
            self.csv.file = Some(PathBuf::from(value));
        }
        if let Some(value) = env_string(env, "ISSUE_KEY_COLUMN") {
            self.csv.issue_key_column = value;
        }
        if let Some(value) = env_string(env, "MILESTONE_COLUMN") {
            self.csv.milestone_column = value;
        }

        if let Some(value) = env_string(env, "LOG_DIR") {
            self.run.log_dir = PathBuf::from(value);
        }
        if let Some(value) = env_bool(env, "DRY_RUN").or_else(|| env_bool(env, "BACKLOG_DRY_RUN")) {
            self.run.dry_run = value;
        }
        if let Some(value) =
            env_string(env, "MILESTONE").or_else(|| env_string(env, "TARGET_MILESTONE"))
        {
            self.run.milestone = Some(value);
        }
        if let Some(values) = env_list(env, "SKIP_IF_MILESTONE_EXISTS") {
            self.run.skip_if_milestone_exists = values;
        }
        if let Some(value) = env_u64(env, "BACKLOG_DELAY_MS")? {
            self.run.delay_ms = value;
        }
        if let Some(value) = env_u32(env, "BACKLOG_RETRY_ATTEMPTS")? {
            self.run.retry_attempts = value;
        }
        if let Some(value) = env_u64(env, "BACKLOG_RETRY_BASE_DELAY_MS")? {
            self.run.retry_base_delay_ms = value;
        }

        Ok(())
    }
}

/// Tracker connection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BacklogConfig {
    #[serde(default)]
    pub space_url: Option<String>,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub project_key: Option<String>,
}

impl BacklogConfig {
    fn merge(&mut self, patch: BacklogPatch) {
        if let Some(value) = patch.space_url {
            self.space_url = Some(value);
        }
        if let Some(value) = patch.api_key {
            self.api_key = Some(value);
        }
        if let Some(value) = patch.project_key {
            self.project_key = Some(value);
        }
    }

    /// Connection settings, failing on the first missing value.
    pub fn settings(&self) -> Result<BacklogSettings> {
        let space_url = required(self.space_url.as_deref(), "BACKLOG_SPACE_URL")?;
        let api_key = required(self.api_key.as_deref(), "BACKLOG_API_KEY")?;
        let project_key = required(self.project_key.as_deref(), "BACKLOG_PROJECT_KEY")?;
        Ok(BacklogSettings {
            space_url,
            project_key,
            api_key,
        })
    }
}

fn required(value: Option<&str>, key: &str) -> Result<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| SyncError::MissingConfig(key.to_string()))
}

/// CSV input settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvConfig {
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub issue_key_column: String,
    #[serde(default)]
    pub milestone_column: String,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            file: None,
            issue_key_column: "キー".to_string(),
            milestone_column: "マイルストーン".to_string(),
        }
    }
}

impl CsvConfig {
    fn merge(&mut self, patch: CsvPatch) {
        if let Some(value) = patch.file {
            self.file = Some(value);
        }
        if let Some(value) = patch.issue_key_column {
            self.issue_key_column = value;
        }
        if let Some(value) = patch.milestone_column {
            self.milestone_column = value;
        }
    }
}

/// Batch behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSettings {
    #[serde(default)]
    pub log_dir: PathBuf,
    #[serde(default)]
    pub dry_run: bool,
    /// Target milestone for add/delete.
    #[serde(default)]
    pub milestone: Option<String>,
    #[serde(default)]
    pub skip_if_milestone_exists: Vec<String>,
    #[serde(default)]
    pub delay_ms: u64,
    #[serde(default)]
    pub retry_attempts: u32,
    #[serde(default)]
    pub retry_base_delay_ms: u64,
    #[serde(default)]
    pub timeout_secs: u64,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            dry_run: false,
            milestone: None,
            skip_if_milestone_exists: Vec::new(),
            delay_ms: 800,
            retry_attempts: 3,
            retry_base_delay_ms: 1000,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl RunSettings {
    fn merge(&mut self, patch: RunPatch) {
        if let Some(value) = patch.log_dir {
            self.log_dir = value;
        }
        if let Some(value) = patch.dry_run {
            self.dry_run = value;
        }
        if let Some(value) = patch.milestone {
            self.milestone = Some(value);
        }
        if let Some(values) = patch.skip_if_milestone_exists {
            self.skip_if_milestone_exists = values;
        }
        if let Some(value) = patch.delay_ms {
            self.delay_ms = value;
        }
        if let Some(value) = patch.retry_attempts {
            self.retry_attempts = value;
        }
        if let Some(value) = patch.retry_base_delay_ms {
            self.retry_base_delay_ms = value;
        }
        if let Some(value) = patch.timeout_secs {
            self.timeout_secs = value;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub backlog: Option<BacklogPatch>,
    pub csv: Option<CsvPatch>,
    pub run: Option<RunPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct BacklogPatch {
    pub space_url: Option<String>,
    pub api_key: Option<String>,
    pub project_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CsvPatch {
    pub file: Option<PathBuf>,
    pub issue_key_column: Option<String>,
    pub milestone_column: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RunPatch {
    pub log_dir: Option<PathBuf>,
    pub dry_run: Option<bool>,
    pub milestone: Option<String>,
    pub skip_if_milestone_exists: Option<Vec<String>>,
    pub delay_ms: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub retry_base_delay_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
}

/// Accepts `1, true, t, yes, y, on` (any case) as true; anything else is false.
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "t" | "yes" | "y" | "on"
    )
}

/// Unset and blank values both count as absent.
fn env_string(env: EnvLookup<'_>, key: &str) -> Option<String> {
    env(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_bool(env: EnvLookup<'_>, key: &str) -> Option<bool> {
    env_string(env, key).map(|value| parse_bool(&value))
}

fn env_u32(env: EnvLookup<'_>, key: &str) -> Result<Option<u32>> {
    match env_string(env, key) {
        Some(value) => value.parse::<u32>().map(Some).map_err(|err| {
            SyncError::Config(format!("invalid {key} value {value}: {err}"))
        }),
        None => Ok(None),
    }
}

fn env_u64(env: EnvLookup<'_>, key: &str) -> Result<Option<u64>> {
    match env_string(env, key) {
        Some(value) => value.parse::<u64>().map(Some).map_err(|err| {
            SyncError::Config(format!("invalid {key} value {value}: {err}"))
        }),
        None => Ok(None),
    }
}

fn env_list(env: EnvLookup<'_>, key: &str) -> Option<Vec<String>> {
    env_string(env, key).map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(ToString::to_string)
            .collect()
    })
}
