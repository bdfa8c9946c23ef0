//! Debounced idle timers.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// A restartable one-shot timer.
///
/// Each [`restart`](IdleTimer::restart) cancels the pending expiry and arms a
/// new one, so only the most recent input counts. The expiry callback
/// receives the generation it was armed with; callers compare it with
/// [`generation`](IdleTimer::generation) to drop expiries that raced with a
/// restart.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Default)]
pub struct IdleTimer {
    token: Option<CancellationToken>,
    generation: u64,
}

impl IdleTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation of the most recently armed timer.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_armed(&self) -> bool {
        self.token.as_ref().is_some_and(|t| !t.is_cancelled())
    }

    pub fn restart<F, Fut>(&mut self, after: Duration, on_expire: F)
    where
        F: FnOnce(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.generation += 1;

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = tokio::time::sleep(after) => on_expire(generation).await,
            }
        });
        self.token = Some(token);
    }

    pub fn cancel(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
    }
}

impl Drop for IdleTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let fired = Arc::new(AtomicU64::new(0));
        let mut timer = IdleTimer::new();

        let seen = Arc::clone(&fired);
        timer.restart(Duration::from_secs(60), move |generation| async move {
            seen.store(generation, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_supersedes_pending_timer() {
        let fired = Arc::new(AtomicU64::new(0));
        let mut timer = IdleTimer::new();

        for _ in 0..3 {
            let seen = Arc::clone(&fired);
            timer.restart(Duration::from_secs(30), move |generation| async move {
                seen.fetch_add(generation * 100, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_secs(20)).await;
        }
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(15)).await;
        // Only the third arming fired.
        assert_eq!(fired.load(Ordering::SeqCst), 300);
        assert_eq!(timer.generation(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_and_drop() {
        let fired = Arc::new(AtomicU64::new(0));
        {
            let mut timer = IdleTimer::new();
            let seen = Arc::clone(&fired);
            timer.restart(Duration::from_secs(5), move |_| async move {
                seen.fetch_add(1, Ordering::SeqCst);
            });
            assert!(timer.is_armed());
            timer.cancel();
            assert!(!timer.is_armed());

            let seen = Arc::clone(&fired);
            timer.restart(Duration::from_secs(5), move |_| async move {
                seen.fetch_add(1, Ordering::SeqCst);
            });
        }
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
