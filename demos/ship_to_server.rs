use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

use netlog_sink::env::{env_or, NETLOG_URL_ENV};
use netlog_sink::init::init_tracing;
use netlog_sink::WriterConfig;

#[tokio::main]
async fn main() {
    let url = env_or(NETLOG_URL_ENV, "http://127.0.0.1:8080/log");
    let config = WriterConfig::new("auth-service", url)
        .with_send_interval(Duration::from_secs(1))
        .with_report_failures(true);

    let writer = init_tracing(config).expect("init tracing");

    info!("starting service");
    warn!(attempts = 3, "password retry limit close");
    error!(user_id = 42, reason = "invalid password", "authentication failed");

    sleep(Duration::from_secs(2)).await;
    writer.close().await;
    println!("{:?}", writer.stats());
}
