use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use url::Url;

/// Backend used when neither the config file nor the environment names one.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Environment variable overriding [`ClientConfig::api_url`].
pub const ENV_API_URL: &str = "TASKFLOW_API_URL";
/// Environment variable overriding [`ClientConfig::log_level`].
pub const ENV_LOG_LEVEL: &str = "TASKFLOW_LOG_LEVEL";
/// Environment variable overriding [`ClientConfig::session_path`].
pub const ENV_SESSION_PATH: &str = "TASKFLOW_SESSION_PATH";
/// Environment variable overriding [`ClientConfig::request_timeout_secs`].
pub const ENV_REQUEST_TIMEOUT: &str = "TASKFLOW_REQUEST_TIMEOUT";

/// Errors raised while resolving the client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The YAML file did not parse.
    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yml::Error),
    /// The JSON file did not parse.
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// Neither `.yaml`/`.yml` nor `.json`.
    #[error("unsupported configuration format for {0}. Use 'yaml' or 'json'.")]
    UnsupportedFormat(PathBuf),
    /// An environment variable held a value that could not be parsed.
    #[error("invalid {var} value: {reason}")]
    InvalidEnv {
        /// Name of the variable.
        var: &'static str,
        /// What was wrong with it.
        reason: String,
    },
    /// The resolved configuration failed validation.
    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Settings for talking to the TaskFlow backend.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the backend, e.g. `http://localhost:8000`.
    pub api_url: Url,

    /// Logging level used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Where the persisted session tokens live.
    pub session_path: PathBuf,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ClientConfig {
    /// Generates a default configuration.
    ///
    /// # Panics
    /// Never in practice; [`DEFAULT_API_URL`] is a valid URL.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            log_level: "info".to_string(),
            session_path: default_session_path(),
            request_timeout_secs: 30,
        }
    }

    /// Loads the configuration from a file, environment variables, or defaults.
    ///
    /// File values win over environment variables; `api_url_override` wins over both.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if the file cannot be read or parsed, an
    /// environment variable is malformed, or the result fails validation.
    pub fn load_config(
        config_path: Option<&Path>,
        api_url_override: Option<Url>,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::with_defaults();
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => defaults.clone(),
        };

        if config.api_url == defaults.api_url {
            if let Ok(raw) = env::var(ENV_API_URL) {
                config.api_url = Url::parse(raw.trim()).map_err(|err| ConfigError::InvalidEnv {
                    var: ENV_API_URL,
                    reason: err.to_string(),
                })?;
            }
        }
        if config.log_level == defaults.log_level {
            if let Ok(level) = env::var(ENV_LOG_LEVEL) {
                config.log_level = level;
            }
        }
        if config.session_path == defaults.session_path {
            if let Ok(path) = env::var(ENV_SESSION_PATH) {
                config.session_path = PathBuf::from(path);
            }
        }
        if config.request_timeout_secs == defaults.request_timeout_secs {
            if let Ok(raw) = env::var(ENV_REQUEST_TIMEOUT) {
                config.request_timeout_secs =
                    raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                        var: ENV_REQUEST_TIMEOUT,
                        reason: "must be a whole number of seconds".to_string(),
                    })?;
            }
        }

        if let Some(api_url) = api_url_override {
            config.api_url = api_url;
        }

        config.validate().map_err(ConfigError::Invalid)?;
        tracing::debug!(api_url = %config.api_url, "client configuration resolved");
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Ok(serde_yml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    /// Returns every problem found, not just the first.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !matches!(self.api_url.scheme(), "http" | "https") {
            errors.push(format!(
                "API URL must use http or https, got '{}'",
                self.api_url.scheme()
            ));
        }
        if self.api_url.cannot_be_a_base() {
            errors.push(format!("API URL '{}' cannot be a base URL", self.api_url));
        }
        if self.log_level.trim().is_empty() {
            errors.push("Log level must not be empty.".to_string());
        }
        if self.request_timeout_secs == 0 {
            errors.push("Request timeout must be greater than 0.".to_string());
        }
        if self.session_path.as_os_str().is_empty() {
            errors.push("Session path must not be empty.".to_string());
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// `<config dir>/taskflow/session.json`, or `./session.json` when no home is known.
#[must_use]
pub fn default_session_path() -> PathBuf {
    BaseDirs::new()
        .map(|dirs| dirs.config_dir().join("taskflow").join("session.json"))
        .unwrap_or_else(|| PathBuf::from("./session.json"))
}
