use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::task::JoinHandle;
use tracing::debug;

pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// Cosmetic "searching" flag that clears itself after a short delay.
///
/// Results never wait on it. The pending timer is aborted on `cancel`, on a
/// new `begin`, and when the indicator is dropped.
#[derive(Debug, Default)]
pub struct SearchIndicator {
    searching: Arc<AtomicBool>,
    pending: Option<JoinHandle<()>>,
}

impl SearchIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_searching(&self) -> bool {
        self.searching.load(Ordering::Acquire)
    }

    /// Must be called from within a tokio runtime.
    pub fn begin(&mut self, delay: Duration) {
        self.abort_pending();
        self.searching.store(true, Ordering::Release);

        let searching = Arc::clone(&self.searching);
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            searching.store(false, Ordering::Release);
            debug!("search indicator cleared");
        }));
    }

    pub fn cancel(&mut self) {
        self.abort_pending();
        self.searching.store(false, Ordering::Release);
    }

    /// Waits for the pending timer, if any, to clear the flag.
    pub async fn settle(&mut self) {
        if let Some(handle) = self.pending.take() {
            // A cancelled timer has nothing left to do.
            let _ = handle.await;
        }
    }

    fn abort_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for SearchIndicator {
    fn drop(&mut self) {
        self.abort_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn clears_after_delay() {
        let mut indicator = SearchIndicator::new();
        indicator.begin(DEFAULT_DELAY);
        assert!(indicator.is_searching());

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert!(indicator.is_searching());

        indicator.settle().await;
        assert!(!indicator.is_searching());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_the_timer() {
        let mut indicator = SearchIndicator::new();
        indicator.begin(DEFAULT_DELAY);
        indicator.cancel();
        assert!(!indicator.is_searching());

        indicator.begin(Duration::from_secs(10));
        let flag = Arc::clone(&indicator.searching);
        drop(indicator);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(flag.load(Ordering::Acquire));
    }

    #[tokio::test(start_paused = true)]
    async fn restarting_replaces_the_timer() {
        let mut indicator = SearchIndicator::new();
        indicator.begin(Duration::from_millis(100));
        indicator.begin(Duration::from_secs(1));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(indicator.is_searching());

        indicator.settle().await;
        assert!(!indicator.is_searching());
    }
}
