use std::sync::Arc;

use async_trait::async_trait;
use netlog_sink::init::{install, LayerConfig};
use netlog_sink::sink::LogSink;
use netlog_sink::{NetLogWriter, WriterConfig};
use tracing::{error, info};

/// Example of delivering batches somewhere other than the HTTP collector
/// by implementing the `LogSink` trait directly.
struct StdoutSink;

#[async_trait]
impl LogSink for StdoutSink {
    async fn send(
        &self,
        app_name: &str,
        batch: &[String],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        for line in batch {
            println!("[{}] {}", app_name, line);
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let config = WriterConfig::new("custom-sink-demo", "http://unused.invalid/");
    let writer = Arc::new(NetLogWriter::with_sink(config, Arc::new(StdoutSink)).expect("create writer"));
    install(
        Arc::clone(&writer),
        LayerConfig { enable_stdout: false, ..LayerConfig::default() },
    )
    .expect("install subscriber");

    info!("custom sink example started");
    error!(db = "my-custom-db", "simulated error sent via custom sink");

    writer.close().await;
}
