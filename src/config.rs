//! Configuration types.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Tag written into every stored record so responses from different
/// survey revisions can be told apart.
pub const DEFAULT_APP_VERSION: &str = "maakhana-survey-v2";

/// Identity provider tag written into every stored record.
pub const DEFAULT_AUTH_PROVIDER: &str = "google";

/// Per-session survey behaviour.
#[derive(Debug, Clone)]
pub struct SurveyConfig {
    /// Pause between leaving one step and entering the next.
    pub transition_delay: Duration,
    /// Upper bound on a sign-in round trip to the identity provider.
    pub sign_in_timeout: Duration,
    /// Upper bound on saving the final response.
    pub submit_timeout: Duration,
    /// Sessions untouched for this long are closed and forgotten.
    pub session_idle_timeout: Duration,
    pub app_version: String,
    pub auth_provider: String,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            transition_delay: Duration::from_millis(300),
            sign_in_timeout: Duration::from_secs(60),
            submit_timeout: Duration::from_secs(15),
            session_idle_timeout: Duration::from_secs(30 * 60),
            app_version: DEFAULT_APP_VERSION.to_string(),
            auth_provider: DEFAULT_AUTH_PROVIDER.to_string(),
        }
    }
}

impl SurveyConfig {
    /// Build config from environment variables. Unset variables take the
    /// defaults; a set but malformed value is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let transition_delay = env_parse::<u64>("MAAKHANA_TRANSITION_DELAY_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.transition_delay);

        let sign_in_timeout = env_parse::<u64>("MAAKHANA_SIGN_IN_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.sign_in_timeout);

        let submit_timeout = env_parse::<u64>("MAAKHANA_SUBMIT_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.submit_timeout);

        let session_idle_timeout = env_parse::<u64>("MAAKHANA_SESSION_IDLE_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.session_idle_timeout);

        let app_version =
            std::env::var("MAAKHANA_APP_VERSION").unwrap_or(defaults.app_version);

        Ok(Self {
            transition_delay,
            sign_in_timeout,
            submit_timeout,
            session_idle_timeout,
            app_version,
            auth_provider: defaults.auth_provider,
        })
    }
}

/// HTTP server and storage settings for the binary.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub db_path: PathBuf,
    /// Directory for a rolling log file, in addition to stderr.
    pub log_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            db_path: PathBuf::from("./data/maakhana.db"),
            log_dir: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            port: env_parse("MAAKHANA_PORT")?.unwrap_or(defaults.port),
            db_path: std::env::var("MAAKHANA_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            log_dir: std::env::var("MAAKHANA_LOG_DIR").ok().map(PathBuf::from),
        })
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, std::env::var(key).ok())
}

/// Parse an optional raw setting, naming `key` in the error.
fn parse_value<T>(key: &str, raw: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{raw:?}: {e}"),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survey_defaults() {
        let config = SurveyConfig::default();
        assert_eq!(config.transition_delay, Duration::from_millis(300));
        assert_eq!(config.submit_timeout, Duration::from_secs(15));
        assert_eq!(config.session_idle_timeout, Duration::from_secs(1800));
        assert_eq!(config.app_version, "maakhana-survey-v2");
        assert_eq!(config.auth_provider, "google");
    }

    #[test]
    fn server_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.db_path, PathBuf::from("./data/maakhana.db"));
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn unset_value_is_none() {
        assert_eq!(
            env_parse::<u64>("MAAKHANA_TEST_UNSET_VARIABLE").unwrap(),
            None
        );
        assert_eq!(parse_value::<u64>("MAAKHANA_PORT", None).unwrap(), None);
    }

    #[test]
    fn value_is_trimmed_and_parsed() {
        let port: Option<u16> = parse_value("MAAKHANA_PORT", Some(" 9090 ".to_string())).unwrap();
        assert_eq!(port, Some(9090));
    }

    #[test]
    fn malformed_value_names_the_key() {
        let err = parse_value::<u16>("MAAKHANA_PORT", Some("eighty".to_string())).unwrap_err();
        match err {
            ConfigError::InvalidValue { key, message } => {
                assert_eq!(key, "MAAKHANA_PORT");
                assert!(message.contains("eighty"));
            }
        }
    }
}
