use async_trait::async_trait;
use std::error::Error;

/// Asynchronous destination for batches of formatted log lines.
///
/// Implementations transport one drained batch to a concrete backend
/// (the HTTP collector, stdout, a test recorder). The writer calls `send`
/// from its background scheduler task and never awaits it on the
/// application thread.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Send one batch of lines on behalf of `app_name`.
    ///
    /// **Parameters**
    /// - `app_name`: application name configured on the writer.
    /// - `batch`: lines in the order they were appended. Never retried:
    ///   if this call fails the batch is gone.
    ///
    /// **Returns**
    /// - `Ok(())` if the batch was handed to the backend.
    /// - `Err(..)` if it could not be delivered. The scheduler counts the
    ///   batch as dropped and moves on.
    async fn send(
        &self,
        app_name: &str,
        batch: &[String],
    ) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Flush any buffered state, called once when the writer shuts down.
    ///
    /// Default implementation is a no-op.
    async fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}
