use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

pub const ENV_WORKSPACE: &str = "SCRUDD_WORKSPACE";
pub const ENV_LOG: &str = "SCRUDD_LOG";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid log level `{0}` (expected error, warn, info, debug or trace)")]
    InvalidLogLevel(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Workspace opened at startup, as if `workspace.select` had been sent.
    pub workspace: Option<PathBuf>,
    pub log_level: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace: None,
            log_level: LevelFilter::INFO,
        }
    }
}

impl Config {
    /// Reads `SCRUDD_*` variables (a `.env` file is honoured). Invalid values
    /// are returned alongside the config so the caller can log them once the
    /// subscriber is installed.
    pub fn from_env() -> (Self, Vec<ConfigError>) {
        dotenvy::dotenv().ok();
        Self::from_vars(
            std::env::var(ENV_WORKSPACE).ok(),
            std::env::var(ENV_LOG).ok(),
        )
    }

    fn from_vars(workspace: Option<String>, log: Option<String>) -> (Self, Vec<ConfigError>) {
        let mut cfg = Self::default();
        let mut problems = Vec::new();

        cfg.workspace = workspace
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        if let Some(raw) = log.filter(|s| !s.trim().is_empty()) {
            match parse_log_level(&raw) {
                Ok(level) => cfg.log_level = level,
                Err(e) => problems.push(e),
            }
        }

        (cfg, problems)
    }
}

pub fn parse_log_level(raw: &str) -> Result<LevelFilter, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "off" => Ok(LevelFilter::OFF),
        "error" => Ok(LevelFilter::ERROR),
        "warn" | "warning" => Ok(LevelFilter::WARN),
        "info" => Ok(LevelFilter::INFO),
        "debug" => Ok(LevelFilter::DEBUG),
        "trace" => Ok(LevelFilter::TRACE),
        _ => Err(ConfigError::InvalidLogLevel(raw.to_string())),
    }
}
