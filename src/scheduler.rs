use crate::cache::LineCache;
use crate::sink::LogSink;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Counters shared between a writer and its scheduler.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) written_lines: AtomicU64,
    pub(crate) discarded_lines: AtomicU64,
    pub(crate) sent_batches: AtomicU64,
    pub(crate) dropped_batches: AtomicU64,
}

/// Background loop that drains the cache and hands each batch to a sink.
///
/// Wakes on the send interval, on an early-flush request, or on
/// cancellation. Batches go out one at a time in drain order.
pub(crate) struct Scheduler {
    pub(crate) app_name: String,
    pub(crate) cache: Arc<LineCache>,
    pub(crate) sink: Arc<dyn LogSink>,
    pub(crate) interval: Duration,
    pub(crate) flush_now: Arc<Notify>,
    pub(crate) cancel: CancellationToken,
    pub(crate) counters: Arc<Counters>,
    pub(crate) report_failures: bool,
}

impl Scheduler {
    pub(crate) fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = sleep(self.interval) => {}
                _ = self.flush_now.notified() => {}
            }
            self.send_pending().await;
        }

        self.send_pending().await;
        if let Err(e) = self.sink.flush().await {
            if self.report_failures {
                eprintln!("netlog: sink flush failed on shutdown: {}", e);
            }
        }
    }

    async fn send_pending(&self) {
        let batch = self.cache.drain();
        if batch.is_empty() {
            return;
        }

        match self.sink.send(&self.app_name, &batch).await {
            Ok(()) => {
                self.counters.sent_batches.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.counters.dropped_batches.fetch_add(1, Ordering::Relaxed);
                if self.report_failures {
                    eprintln!("netlog: dropping batch of {} lines: {}", batch.len(), e);
                }
            }
        }
    }
}
