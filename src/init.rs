use crate::config::{ConfigError, WriterConfig};
use crate::layer::NetLogLayer;
use crate::writer::NetLogWriter;
use std::sync::Arc;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::Registry;

/// Configuration of the tracing integration.
///
/// **Fields**
/// - `max_level`: most verbose level forwarded to the writer. Events above
///   it never reach the cache.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is added
///   next to [`NetLogLayer`] so events are also printed to the console.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub max_level: LevelFilter,
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            max_level: LevelFilter::INFO,
            enable_stdout: true,
        }
    }
}

/// Errors from installing the global subscriber.
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to set global subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Initialize the global `tracing` subscriber with a [`NetLogWriter`]
/// posting to `writer_config.url`.
///
/// **Parameters**
/// - `writer_config`: app name, endpoint and batching settings.
/// - `layer_config`: [`LayerConfig`] controlling level filtering and
///   console output.
///
/// **Returns**
///
/// The shared writer, so the application can [`close`](NetLogWriter::close)
/// it on shutdown and have the last batch delivered. Must be called from
/// inside a tokio runtime.
pub fn init_tracing_with_config(
    writer_config: WriterConfig,
    layer_config: LayerConfig,
) -> Result<Arc<NetLogWriter>, InitError> {
    let writer = Arc::new(NetLogWriter::new(writer_config)?);
    install(Arc::clone(&writer), layer_config)?;
    Ok(writer)
}

/// Initialize tracing with sensible defaults.
///
/// Equivalent to calling [`init_tracing_with_config`] with
/// [`LayerConfig::default`]. This is the recommended entrypoint for
/// typical microservices.
pub fn init_tracing(writer_config: WriterConfig) -> Result<Arc<NetLogWriter>, InitError> {
    init_tracing_with_config(writer_config, LayerConfig::default())
}

/// Install an already built writer as the global subscriber's log shipper.
pub fn install(writer: Arc<NetLogWriter>, config: LayerConfig) -> Result<(), InitError> {
    let layer = NetLogLayer::new(writer).with_filter(config.max_level);

    // Two variants because the optional fmt layer changes the subscriber type.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}
