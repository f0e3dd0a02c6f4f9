use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SETTINGS_PATH_ENV: &str = "DCIMPORT_CONFIG";
pub const DEFAULT_STATE_DIR: &str = ".dcimport";
pub const SETTINGS_FILE_NAME: &str = "config.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid yaml in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("settings validation failed: {0}")]
    Settings(String),
}

/// Deployment-level knobs shared by every request the service handles.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServiceSettings {
    #[serde(default = "default_input_root")]
    pub input_root: PathBuf,
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
    #[serde(default)]
    pub log_path: Option<PathBuf>,
    #[serde(default)]
    pub tool: ToolSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ToolSettings {
    #[serde(default = "default_tool_program")]
    pub program: String,
    /// Leading arguments placed before the mode token, e.g. `-jar <path>`.
    #[serde(default = "default_tool_args")]
    pub args: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default = "default_public_host")]
    pub public_host: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            input_root: default_input_root(),
            output_root: default_output_root(),
            log_path: None,
            tool: ToolSettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            program: default_tool_program(),
            args: default_tool_args(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            public_host: default_public_host(),
            api_base: default_api_base(),
            token_env: default_token_env(),
        }
    }
}

impl ToolSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ServiceSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tool.program.trim().is_empty() {
            return Err(ConfigError::Settings(
                "tool.program must be non-empty".to_string(),
            ));
        }
        if self.tool.timeout_secs == 0 {
            return Err(ConfigError::Settings(
                "tool.timeout_secs must be greater than zero".to_string(),
            ));
        }
        let bucket = self.storage.bucket.trim();
        if bucket.is_empty() || bucket.contains('/') {
            return Err(ConfigError::Settings(format!(
                "storage.bucket `{}` must be a non-empty name without `/`",
                self.storage.bucket
            )));
        }
        if self.storage.public_host.trim().is_empty() {
            return Err(ConfigError::Settings(
                "storage.public_host must be non-empty".to_string(),
            ));
        }
        if self.input_root == self.output_root {
            return Err(ConfigError::Settings(format!(
                "input_root and output_root must differ (both are {})",
                self.input_root.display()
            )));
        }
        Ok(())
    }
}

pub fn load_settings(path: &Path) -> Result<ServiceSettings, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    if raw.trim().is_empty() {
        return Ok(ServiceSettings::default());
    }
    serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

pub fn default_settings_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(DEFAULT_STATE_DIR)
            .join(SETTINGS_FILE_NAME),
    )
}

/// Explicit path first, then `$DCIMPORT_CONFIG`, then the home-directory
/// file when present, otherwise built-in defaults.
pub fn resolve_settings(explicit: Option<&Path>) -> Result<ServiceSettings, ConfigError> {
    let settings = if let Some(path) = explicit {
        load_settings(path)?
    } else if let Some(path) = std::env::var_os(SETTINGS_PATH_ENV).filter(|v| !v.is_empty()) {
        load_settings(Path::new(&path))?
    } else {
        match default_settings_path() {
            Some(path) if path.is_file() => load_settings(&path)?,
            _ => ServiceSettings::default(),
        }
    };
    settings.validate()?;
    Ok(settings)
}

fn default_input_root() -> PathBuf {
    PathBuf::from("/tmp/dc-import/input")
}

fn default_output_root() -> PathBuf {
    PathBuf::from("/tmp/dc-import/output")
}

fn default_tool_program() -> String {
    "java".to_string()
}

fn default_tool_args() -> Vec<String> {
    vec![
        "-jar".to_string(),
        "/opt/dc-import/datacommons-import-tool.jar".to_string(),
    ]
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_bucket() -> String {
    "dc-imports-test".to_string()
}

fn default_public_host() -> String {
    "storage.googleapis.com".to_string()
}

fn default_api_base() -> String {
    "https://storage.googleapis.com".to_string()
}

fn default_token_env() -> String {
    "DCIMPORT_GCS_TOKEN".to_string()
}
