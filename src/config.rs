use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default chat-completion API root.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
/// Default model used to write devotionals.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
/// Default outbound request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
/// Default HTTP port.
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
    /// An explicitly requested env file could not be read.
    #[error("Failed to load env file {path}: {source}")]
    EnvFile {
        /// Path that was requested.
        path: String,
        /// Underlying loader error.
        source: dotenvy::Error,
    },
}

/// Runtime configuration for the devotional service.
///
/// Built once at startup and handed to the components that need it. Afterwards only the
/// tracing filter (`RUST_LOG`) is read from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    /// Credential for the chat-completion API. `None` leaves generation disabled.
    pub openai_api_key: Option<String>,
    /// Root URL of the chat-completion API.
    pub openai_base_url: String,
    /// Model identifier sent with every completion request.
    pub openai_model: String,
    /// Upper bound on a single outbound completion request.
    pub request_timeout: Duration,
    /// Development or production behavior.
    pub run_mode: RunMode,
    /// Interface the HTTP server binds to.
    pub server_host: IpAddr,
    /// Port the HTTP server binds to.
    pub server_port: u16,
    /// Optional file that receives a copy of the logs.
    pub log_file: Option<PathBuf>,
}

/// Selects development or production behavior.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunMode {
    /// Verbose logging and a configuration dump at startup.
    Development,
    /// Quiet defaults.
    #[default]
    Production,
}

impl RunMode {
    /// Log filter used when `RUST_LOG` is not set.
    pub const fn default_log_filter(self) -> &'static str {
        match self {
            Self::Development => "debug",
            Self::Production => "info",
        }
    }

    /// Whether verbose diagnostics are enabled.
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}

impl std::str::FromStr for RunMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            run_mode: RunMode::default(),
            server_host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            server_port: DEFAULT_SERVER_PORT,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load an env file (the default `.env` when `env_file` is `None`) and then read the
    /// environment.
    ///
    /// A missing default `.env` is ignored; a missing explicit file is an error.
    pub fn load(env_file: Option<&Path>) -> Result<Self, ConfigError> {
        match env_file {
            Some(path) => {
                dotenvy::from_path(path).map_err(|source| ConfigError::EnvFile {
                    path: path.display().to_string(),
                    source,
                })?;
            }
            None => {
                dotenvy::dotenv().ok();
            }
        }
        Self::from_env()
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            openai_api_key: optional("OPENAI_API_KEY").map(|value| value.trim().to_string()),
            openai_base_url: optional("OPENAI_BASE_URL")
                .map(|value| value.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.openai_base_url),
            openai_model: optional("OPENAI_MODEL")
                .map(|value| value.trim().to_string())
                .unwrap_or(defaults.openai_model),
            request_timeout: optional("OPENAI_TIMEOUT_SECS")
                .map(|value| {
                    value
                        .trim()
                        .parse::<u64>()
                        .ok()
                        .filter(|secs| *secs > 0)
                        .map(Duration::from_secs)
                        .ok_or_else(|| ConfigError::InvalidValue("OPENAI_TIMEOUT_SECS".into()))
                })
                .transpose()?
                .unwrap_or(defaults.request_timeout),
            run_mode: optional("APP_ENV")
                .map(|value| {
                    value
                        .parse::<RunMode>()
                        .map_err(|()| ConfigError::InvalidValue("APP_ENV".into()))
                })
                .transpose()?
                .unwrap_or(defaults.run_mode),
            server_host: optional("SERVER_HOST")
                .map(|value| {
                    value
                        .trim()
                        .parse::<IpAddr>()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_HOST".into()))
                })
                .transpose()?
                .unwrap_or(defaults.server_host),
            server_port: optional("SERVER_PORT")
                .map(|value| {
                    value
                        .trim()
                        .parse::<u16>()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?
                .unwrap_or(defaults.server_port),
            log_file: optional("DAILY_LIGHT_LOG_FILE").map(|value| PathBuf::from(value.trim())),
        })
    }

    /// Emit the resolved configuration at debug level without exposing the credential.
    pub fn log_summary(&self) {
        tracing::debug!(
            base_url = %self.openai_base_url,
            model = %self.openai_model,
            timeout_secs = self.request_timeout.as_secs(),
            has_api_key = self.openai_api_key.is_some(),
            run_mode = ?self.run_mode,
            host = %self.server_host,
            port = self.server_port,
            log_file = ?self.log_file,
            "Loaded configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = Config::from_lookup(lookup(&[])).expect("config");
        assert!(config.openai_api_key.is_none());
        assert_eq!(config.openai_base_url, DEFAULT_OPENAI_BASE_URL);
        assert_eq!(config.openai_model, "gpt-4o-mini");
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.run_mode, RunMode::Production);
        assert_eq!(config.server_host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.server_port, 8080);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn blank_api_key_is_treated_as_missing() {
        let config = Config::from_lookup(lookup(&[("OPENAI_API_KEY", "   ")])).expect("config");
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:9000/v1/"),
            ("OPENAI_MODEL", "gpt-4o"),
            ("OPENAI_TIMEOUT_SECS", "15"),
            ("APP_ENV", "development"),
            ("SERVER_HOST", "127.0.0.1"),
            ("SERVER_PORT", "9090"),
            ("DAILY_LIGHT_LOG_FILE", "logs/daily-light.log"),
        ]))
        .expect("config");

        assert_eq!(config.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.openai_base_url, "http://localhost:9000/v1");
        assert_eq!(config.openai_model, "gpt-4o");
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert!(config.run_mode.is_development());
        assert_eq!(config.server_host, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.server_port, 9090);
        assert_eq!(
            config.log_file.as_deref(),
            Some(Path::new("logs/daily-light.log"))
        );
    }

    #[test]
    fn rejects_unparseable_values() {
        for (key, value) in [
            ("SERVER_PORT", "eighty"),
            ("SERVER_HOST", "not-an-ip"),
            ("OPENAI_TIMEOUT_SECS", "0"),
            ("APP_ENV", "staging"),
        ] {
            let error = Config::from_lookup(lookup(&[(key, value)])).expect_err(key);
            assert!(
                matches!(&error, ConfigError::InvalidValue(name) if name == key),
                "unexpected error for {key}: {error}"
            );
        }
    }

    #[test]
    fn run_mode_selects_log_filter() {
        assert_eq!(RunMode::Development.default_log_filter(), "debug");
        assert_eq!(RunMode::Production.default_log_filter(), "info");
        assert_eq!("PROD".parse::<RunMode>(), Ok(RunMode::Production));
    }
}
