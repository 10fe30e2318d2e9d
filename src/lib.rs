pub mod record;
pub mod format;
pub mod cache;
pub mod sink;
pub mod http;
mod scheduler;
pub mod writer;
pub mod layer;

pub mod config;
pub mod env;
pub mod init;
pub mod noop_sink;

pub use config::{ConfigError, WriterConfig};
pub use writer::{NetLogWriter, WriterStats};
