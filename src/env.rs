//! Environment variable names used by this crate for convenient
//! configuration of the writer from microservices.
//!
//! These are purely helpers; [`WriterConfig::new`] never touches the
//! environment, only [`WriterConfig::from_env`] does.
//!
//! [`WriterConfig::new`]: crate::config::WriterConfig::new
//! [`WriterConfig::from_env`]: crate::config::WriterConfig::from_env

/// Application name sent in the `app` form field.
pub const NETLOG_APP_ENV: &str = "NETLOG_APP";

/// Collector endpoint, e.g. `http://127.0.0.1:8080/log`.
pub const NETLOG_URL_ENV: &str = "NETLOG_URL";

/// Optional line template.
pub const NETLOG_FORMAT_ENV: &str = "NETLOG_FORMAT";

/// Optional send interval in milliseconds.
pub const NETLOG_SEND_INTERVAL_MS_ENV: &str = "NETLOG_SEND_INTERVAL_MS";

/// Optional cache size that triggers an early send.
pub const NETLOG_MAX_CACHE_LINES_ENV: &str = "NETLOG_MAX_CACHE_LINES";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
