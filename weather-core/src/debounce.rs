//! Single-slot debounce timer.
//!
//! Scheduling a new call while one is pending aborts the pending one and
//! restarts the quiet interval. Only the latest value ever reaches the
//! provider; nothing is queued.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;

pub struct Debouncer<E> {
    interval: Duration,
    slot: Option<AbortHandle>,
    tx: mpsc::UnboundedSender<E>,
}

impl<E> Debouncer<E>
where
    E: Send + 'static,
{
    pub fn new(interval: Duration, tx: mpsc::UnboundedSender<E>) -> Self {
        Self {
            interval,
            slot: None,
            tx,
        }
    }

    /// Wait for the quiet interval, then run `future` and post its output.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&mut self, future: F)
    where
        F: Future<Output = E> + Send + 'static,
    {
        self.cancel();

        let tx = self.tx.clone();
        let interval = self.interval;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            let event = future.await;
            let _ = tx.send(event);
        });

        self.slot = Some(handle.abort_handle());
    }

    /// Discard the pending call, including one already talking to the provider.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.slot.take() {
            handle.abort();
        }
    }

    /// True until the scheduled call has posted its output (or was cancelled).
    #[cfg(test)]
    fn is_pending(&self) -> bool {
        self.slot.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl<E> Drop for Debouncer<E> {
    fn drop(&mut self) {
        if let Some(handle) = self.slot.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_quiet_interval() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::new(Duration::from_millis(1200), tx);

        debouncer.schedule(async { "Lon" });
        assert!(debouncer.is_pending());

        // Nothing before the interval elapses.
        let early = tokio::time::timeout(Duration::from_millis(1199), rx.recv()).await;
        assert!(early.is_err());

        let value = tokio::time::timeout(Duration::from_millis(10), rx.recv())
            .await
            .expect("timeout")
            .expect("channel closed");
        assert_eq!(value, "Lon");
    }

    #[tokio::test(start_paused = true)]
    async fn burst_keeps_only_last_value() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::new(Duration::from_millis(1200), tx);
        let calls = Arc::new(AtomicUsize::new(0));

        for text in ["L", "Lo", "Lon", "Lond", "Londo"] {
            let calls = calls.clone();
            debouncer.schedule(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                text
            });
            tokio::time::sleep(Duration::from_millis(300)).await;
        }

        let value = rx.recv().await.expect("channel closed");
        assert_eq!(value, "Londo");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Nothing else is in flight.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_discards_pending_call() {
        let (tx, mut rx) = mpsc::unbounded_channel::<&str>();
        let mut debouncer = Debouncer::new(Duration::from_millis(100), tx);

        debouncer.schedule(async { "gone" });
        debouncer.cancel();
        assert!(!debouncer.is_pending());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }
}
