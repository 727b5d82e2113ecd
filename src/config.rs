use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use crate::cli::GlobalArgs;

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const DEFAULT_ENV_FILE: &str = ".env.local";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 120;
pub const LEDGER_FILE_NAME: &str = "Advisory Agent.xlsx";
pub const FIELD_SHEET_DIR: &str = "Claude Code";
pub const FIELD_SHEET_FILE_NAME: &str = "Claude Code.xlsx";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env_file: PathBuf,
    pub ledger_path: PathBuf,
    pub nigo_ledger_path: PathBuf,
    pub field_sheet_path: PathBuf,
    pub model: String,
    pub api_base: String,
    pub model_timeout: Duration,
    pub mail_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let desktop = desktop_directory();
        Self {
            env_file: default_env_file(),
            ledger_path: desktop.join(LEDGER_FILE_NAME),
            nigo_ledger_path: desktop.join(LEDGER_FILE_NAME),
            field_sheet_path: desktop.join(FIELD_SHEET_DIR).join(FIELD_SHEET_FILE_NAME),
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            model_timeout: Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS),
            mail_enabled: true,
        }
    }
}

impl AppConfig {
    pub fn from_args(args: &GlobalArgs) -> Self {
        let defaults = Self::default();
        Self {
            env_file: args.env_file.clone().unwrap_or(defaults.env_file),
            ledger_path: args.ledger_path.clone().unwrap_or(defaults.ledger_path),
            nigo_ledger_path: args
                .nigo_ledger_path
                .clone()
                .unwrap_or(defaults.nigo_ledger_path),
            field_sheet_path: args
                .field_sheet_path
                .clone()
                .unwrap_or(defaults.field_sheet_path),
            model: args.model.clone().unwrap_or(defaults.model),
            api_base: args.api_base.clone().unwrap_or(defaults.api_base),
            model_timeout: args
                .model_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.model_timeout),
            mail_enabled: !args.no_mail,
        }
    }

    /// Process environment first, then the env file.
    pub fn api_key(&self) -> Option<String> {
        if let Some(key) = std::env::var(API_KEY_VAR)
            .ok()
            .filter(|value| !value.trim().is_empty())
        {
            return Some(key);
        }
        read_env_file_value(&self.env_file, API_KEY_VAR)
    }
}

pub fn read_env_file_value(path: &Path, key: &str) -> Option<String> {
    let entries = match dotenvy::from_path_iter(path) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "env file not loaded");
            return None;
        }
    };

    for entry in entries {
        match entry {
            Ok((name, value)) if name == key => {
                return Some(value).filter(|value| !value.trim().is_empty());
            }
            Ok(_) => {}
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping malformed env file line");
            }
        }
    }

    None
}

/// `.env.local` one level above the directory holding the executable, so the
/// lookup does not depend on the working directory.
pub fn default_env_file() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent()?.parent().map(Path::to_path_buf))
        .unwrap_or_else(desktop_directory)
        .join(DEFAULT_ENV_FILE)
}

fn desktop_directory() -> PathBuf {
    dirs::desktop_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}
