use crate::cache::LineCache;
use crate::config::{ConfigError, WriterConfig};
use crate::format::{LineFormatter, PatternFormatter};
use crate::http::HttpSink;
use crate::record::LogRecord;
use crate::scheduler::{Counters, Scheduler};
use crate::sink::LogSink;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Buffered writer that ships formatted log lines in periodic batches.
///
/// Each [`write`](NetLogWriter::write) formats the record and appends the
/// line to an in-memory cache. A background task started by the constructor
/// drains the cache every `send_interval` (or as soon as `max_cache_lines`
/// is reached) and hands the batch to the sink. Callers never wait on the
/// network and never see a transport error; failed batches are dropped and
/// counted in [`WriterStats::dropped_batches`].
///
/// Constructors spawn onto the current tokio runtime and panic outside one,
/// like `tokio::spawn`.
pub struct NetLogWriter {
    app_name: String,
    formatter: Arc<dyn LineFormatter>,
    cache: Arc<LineCache>,
    max_cache_lines: usize,
    flush_now: Arc<Notify>,
    counters: Arc<Counters>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
    report_failures: bool,
}

/// Point-in-time copy of a writer's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriterStats {
    /// Lines accepted by `write` / `write_line`.
    pub written_lines: u64,
    /// Lines thrown away because the writer was already closed.
    pub discarded_lines: u64,
    /// Batches the sink accepted.
    pub sent_batches: u64,
    /// Batches lost to a sink error.
    pub dropped_batches: u64,
}

impl NetLogWriter {
    /// Create a writer posting to `config.url` over HTTP.
    pub fn new(config: WriterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let sink = HttpSink::from_config(&config)?;
        Ok(Self::start(config, Arc::new(sink), None))
    }

    /// Create a writer delivering batches to a custom sink.
    ///
    /// `config.url` is not used to build a transport here, but an empty app
    /// name is still rejected.
    pub fn with_sink(config: WriterConfig, sink: Arc<dyn LogSink>) -> Result<Self, ConfigError> {
        config.validate_app_name()?;
        Ok(Self::start(config, sink, None))
    }

    /// Like [`with_sink`](Self::with_sink), replacing the template formatter.
    pub fn with_formatter(
        config: WriterConfig,
        sink: Arc<dyn LogSink>,
        formatter: Arc<dyn LineFormatter>,
    ) -> Result<Self, ConfigError> {
        config.validate_app_name()?;
        Ok(Self::start(config, sink, Some(formatter)))
    }

    fn start(
        config: WriterConfig,
        sink: Arc<dyn LogSink>,
        formatter: Option<Arc<dyn LineFormatter>>,
    ) -> Self {
        let formatter =
            formatter.unwrap_or_else(|| Arc::new(PatternFormatter::new(&config.format)));
        let cache = Arc::new(LineCache::new());
        let flush_now = Arc::new(Notify::new());
        let counters = Arc::new(Counters::default());
        let cancel = CancellationToken::new();

        let handle = Scheduler {
            app_name: config.app_name.clone(),
            cache: Arc::clone(&cache),
            sink,
            interval: config.send_interval,
            flush_now: Arc::clone(&flush_now),
            cancel: cancel.clone(),
            counters: Arc::clone(&counters),
            report_failures: config.report_failures,
        }
        .spawn();

        NetLogWriter {
            app_name: config.app_name,
            formatter,
            cache,
            max_cache_lines: config.max_cache_lines,
            flush_now,
            counters,
            cancel,
            task: Mutex::new(Some(handle)),
            report_failures: config.report_failures,
        }
    }

    /// Format `record` and queue the line for the next batch.
    ///
    /// After [`close`](Self::close) the record is discarded without being
    /// formatted.
    pub fn write(&self, record: &LogRecord) {
        if self.discard_if_closed() {
            return;
        }
        self.write_line(self.formatter.format(record));
    }

    /// Queue an already formatted line. Discarded after `close`.
    pub fn write_line(&self, line: impl Into<String>) {
        if self.discard_if_closed() {
            return;
        }
        let cached = self.cache.append(line.into());
        self.counters.written_lines.fetch_add(1, Ordering::Relaxed);
        if cached >= self.max_cache_lines {
            self.flush_now.notify_one();
        }
    }

    // Nothing drains the cache once the scheduler is cancelled.
    fn discard_if_closed(&self) -> bool {
        if !self.cancel.is_cancelled() {
            return false;
        }
        self.counters.discarded_lines.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Stop the background task after it sends whatever is still cached.
    ///
    /// Safe to call more than once; later calls return immediately. Lines
    /// written after `close` are discarded and counted in
    /// [`WriterStats::discarded_lines`].
    pub async fn close(&self) {
        self.cancel.cancel();
        let handle = self
            .task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                if self.report_failures {
                        eprintln!("netlog: scheduler task failed: {}", e);
                }
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Lines waiting for the next batch.
    pub fn pending(&self) -> usize {
        self.cache.len()
    }

    pub fn stats(&self) -> WriterStats {
        WriterStats {
            written_lines: self.counters.written_lines.load(Ordering::Relaxed),
            discarded_lines: self.counters.discarded_lines.load(Ordering::Relaxed),
            sent_batches: self.counters.sent_batches.load(Ordering::Relaxed),
            dropped_batches: self.counters.dropped_batches.load(Ordering::Relaxed),
        }
    }
}

impl Drop for NetLogWriter {
    fn drop(&mut self) {
        // The scheduler sends what is left and exits on its own.
        self.cancel.cancel();
    }
}
