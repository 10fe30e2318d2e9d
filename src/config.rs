use crate::env::{
    NETLOG_APP_ENV, NETLOG_FORMAT_ENV, NETLOG_MAX_CACHE_LINES_ENV, NETLOG_SEND_INTERVAL_MS_ENV,
    NETLOG_URL_ENV,
};
use crate::format::DEFAULT_FORMAT;
use std::time::Duration;

pub const DEFAULT_SEND_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_MAX_CACHE_LINES: usize = 300;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const MIN_SEND_INTERVAL: Duration = Duration::from_millis(10);

/// Settings for a [`NetLogWriter`].
///
/// Built with the chainable `with_*` methods and then handed to the writer,
/// which keeps its own copy. Changing a config after the writer exists has no
/// effect on it.
///
/// [`NetLogWriter`]: crate::writer::NetLogWriter
#[derive(Clone, Debug)]
pub struct WriterConfig {
    /// Sent as the `app` form field; the collector groups logs by it.
    pub app_name: String,
    /// Collector endpoint receiving the POST.
    pub url: String,
    /// Line template, see [`PatternFormatter`](crate::format::PatternFormatter).
    pub format: String,
    pub send_interval: Duration,
    /// Cache size that wakes the scheduler before the next tick.
    pub max_cache_lines: usize,
    /// Upper bound for a single POST. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
    /// Print dropped batches to stderr.
    pub report_failures: bool,
}

impl WriterConfig {
    pub fn new(app_name: impl Into<String>, url: impl Into<String>) -> Self {
        WriterConfig {
            app_name: app_name.into(),
            url: url.into(),
            format: DEFAULT_FORMAT.to_string(),
            send_interval: DEFAULT_SEND_INTERVAL,
            max_cache_lines: DEFAULT_MAX_CACHE_LINES,
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            report_failures: false,
        }
    }

    /// Build a config from `NETLOG_*` environment variables.
    ///
    /// `NETLOG_APP` and `NETLOG_URL` are required; everything else falls back
    /// to the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let app = std::env::var(NETLOG_APP_ENV).map_err(|_| ConfigError::MissingEnv(NETLOG_APP_ENV))?;
        let url = std::env::var(NETLOG_URL_ENV).map_err(|_| ConfigError::MissingEnv(NETLOG_URL_ENV))?;
        let mut config = WriterConfig::new(app, url);

        if let Ok(format) = std::env::var(NETLOG_FORMAT_ENV) {
            config = config.with_format(format);
        }
        if let Some(ms) = parse_env::<u64>(NETLOG_SEND_INTERVAL_MS_ENV)? {
            config = config.with_send_interval(Duration::from_millis(ms));
        }
        if let Some(lines) = parse_env::<usize>(NETLOG_MAX_CACHE_LINES_ENV)? {
            config = config.with_max_cache_lines(lines);
        }
        Ok(config)
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Interval between scheduled sends. Clamped to at least 10ms.
    pub fn with_send_interval(mut self, interval: Duration) -> Self {
        self.send_interval = interval.max(MIN_SEND_INTERVAL);
        self
    }

    /// Clamped to at least one line.
    pub fn with_max_cache_lines(mut self, lines: usize) -> Self {
        self.max_cache_lines = lines.max(1);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_report_failures(mut self, report: bool) -> Self {
        self.report_failures = report;
        self
    }

    /// Check the fields a writer cannot start without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_app_name()?;
        reqwest::Url::parse(&self.url).map_err(|e| ConfigError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    /// Check only the app name; custom sinks have no use for the url.
    pub fn validate_app_name(&self) -> Result<(), ConfigError> {
        if self.app_name.is_empty() {
            return Err(ConfigError::EmptyAppName);
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { key, value: raw }),
        Err(_) => Ok(None),
    }
}

/// Error type returned when a [`WriterConfig`] cannot be used.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("application name must not be empty")]
    EmptyAppName,

    #[error("invalid destination url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to build http client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),

    #[error("environment variable {key} has invalid value {value:?}")]
    InvalidEnv { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = WriterConfig::new("svc", "http://127.0.0.1:9000/logs");
        assert_eq!(config.format, "[%D %T] [%L] (%S) %M");
        assert_eq!(config.send_interval, Duration::from_secs(3));
        assert_eq!(config.max_cache_lines, 300);
        assert!(!config.report_failures);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn chained_setters_and_clamping() {
        let config = WriterConfig::new("svc", "http://localhost/logs")
            .with_app_name("billing")
            .with_format("%L %M")
            .with_send_interval(Duration::ZERO)
            .with_max_cache_lines(0);

        assert_eq!(config.app_name, "billing");
        assert_eq!(config.format, "%L %M");
        assert_eq!(config.send_interval, Duration::from_millis(10));
        assert_eq!(config.max_cache_lines, 1);
    }

    #[test]
    fn validate_rejects_bad_input() {
        assert!(matches!(
            WriterConfig::new("", "http://localhost/logs").validate(),
            Err(ConfigError::EmptyAppName)
        ));
        assert!(matches!(
            WriterConfig::new("svc", "not a url").validate(),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn app_name_check_ignores_url() {
        assert!(WriterConfig::new("svc", "not a url").validate_app_name().is_ok());
        assert!(matches!(
            WriterConfig::new("", "not a url").validate_app_name(),
            Err(ConfigError::EmptyAppName)
        ));
    }

    // All env assertions live in one test so parallel tests never race on
    // the process environment.
    #[test]
    fn from_env() {
        std::env::remove_var(NETLOG_APP_ENV);
        std::env::remove_var(NETLOG_URL_ENV);
        assert!(matches!(
            WriterConfig::from_env(),
            Err(ConfigError::MissingEnv(NETLOG_APP_ENV))
        ));

        std::env::set_var(NETLOG_APP_ENV, "svc");
        std::env::set_var(NETLOG_URL_ENV, "http://localhost:8080/log");
        std::env::set_var(NETLOG_SEND_INTERVAL_MS_ENV, "250");
        std::env::set_var(NETLOG_MAX_CACHE_LINES_ENV, "50");
        let config = WriterConfig::from_env().unwrap();
        assert_eq!(config.app_name, "svc");
        assert_eq!(config.send_interval, Duration::from_millis(250));
        assert_eq!(config.max_cache_lines, 50);

        std::env::set_var(NETLOG_MAX_CACHE_LINES_ENV, "lots");
        assert!(matches!(
            WriterConfig::from_env(),
            Err(ConfigError::InvalidEnv { key: NETLOG_MAX_CACHE_LINES_ENV, .. })
        ));

        for key in [
            NETLOG_APP_ENV,
            NETLOG_URL_ENV,
            NETLOG_SEND_INTERVAL_MS_ENV,
            NETLOG_MAX_CACHE_LINES_ENV,
        ] {
            std::env::remove_var(key);
        }
    }
}
