use std::sync::Arc;
use std::time::Instant;
use tokio::time::Duration;
use tracing::error;

use netlog_sink::init::{install, LayerConfig};
use netlog_sink::noop_sink::NoopSink;
use netlog_sink::{NetLogWriter, WriterConfig};

#[tokio::main]
async fn main() {
    let config = WriterConfig::new("load-test", "http://127.0.0.1:8080/log")
        .with_send_interval(Duration::from_millis(200))
        .with_max_cache_lines(5_000);
    let writer = Arc::new(
        NetLogWriter::with_sink(config, Arc::new(NoopSink)).expect("create writer"),
    );
    install(
        Arc::clone(&writer),
        LayerConfig { enable_stdout: false, ..LayerConfig::default() },
    )
    .expect("install subscriber");

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        error!(iteration = i, "custom load test error");
    }

    let elapsed = start.elapsed();
    println!("custom config: wrote {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    writer.close().await;
    println!("{:?}", writer.stats());
}
