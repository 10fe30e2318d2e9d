use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::error;

use netlog_sink::init::{install, LayerConfig};
use netlog_sink::noop_sink::NoopSink;
use netlog_sink::{NetLogWriter, WriterConfig};

#[tokio::main]
async fn main() {
    let config = WriterConfig::new("load-test", "http://127.0.0.1:8080/log");
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
        error!(iteration = i, "default load test error");
    }

    let elapsed = start.elapsed();
    println!("default config: wrote {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    // Give the scheduler a chance to run before shutting down
    sleep(Duration::from_secs(1)).await;
    writer.close().await;
    println!("{:?}", writer.stats());
}
