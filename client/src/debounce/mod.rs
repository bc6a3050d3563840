//! Trailing-edge debounce on the Tokio timer.
//!
//! Each [`Debounced::call`] aborts the pending timer task and schedules a new
//! one, so a burst of calls collapses into a single invocation carrying the
//! last argument, `wait` after the burst ends. Dropping the handle cancels
//! whatever is still pending.
//!
//! `call` spawns onto the current Tokio runtime and must run inside one.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

pub struct Debounced<T> {
    callback: Callback<T>,
    wait: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> Debounced<T> {
    pub fn new<F>(callback: F, wait: Duration) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
            wait,
            pending: Mutex::new(None),
        }
    }

    /// Schedule `callback(arg)` after `wait` of quiet, replacing any call
    /// still waiting.
    pub fn call(&self, arg: T) {
        let callback = Arc::clone(&self.callback);
        let wait = self.wait;

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            callback(arg);
        }));
    }

    /// Drop the pending invocation, if any.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = pending.take() {
            handle.abort();
        }
    }

    /// Whether an invocation is scheduled and has not run yet.
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }
}

impl<T> Drop for Debounced<T> {
    fn drop(&mut self) {
        let pending = self.pending.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = pending.take() {
            handle.abort();
        }
    }
}

/// Wrap `callback` so it only runs once calls have been quiet for `wait`.
pub fn debounce<T, F>(callback: F, wait: Duration) -> Debounced<T>
where
    T: Send + 'static,
    F: Fn(T) + Send + Sync + 'static,
{
    Debounced::new(callback, wait)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    const WAIT: Duration = Duration::from_millis(300);

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(String) + Send + Sync + 'static) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        (calls, move |q: String| sink.lock().unwrap().push(q))
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_yields_one_call_with_last_argument() {
        let (calls, callback) = recorder();
        let debounced = debounce(callback, WAIT);

        for i in 0..5 {
            debounced.call(format!("q{}", i));
            sleep(WAIT / 2).await;
        }
        assert!(calls.lock().unwrap().is_empty());
        assert!(debounced.is_pending());

        sleep(WAIT).await;
        assert_eq!(*calls.lock().unwrap(), vec!["q4".to_string()]);
        assert!(!debounced.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_runs_before_wait() {
        let (calls, callback) = recorder();
        let debounced = debounce(callback, WAIT);

        debounced.call("smith".into());
        sleep(WAIT - Duration::from_millis(1)).await;
        assert!(calls.lock().unwrap().is_empty());

        sleep(Duration::from_millis(2)).await;
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_quiet_periods_each_fire() {
        let (calls, callback) = recorder();
        let debounced = debounce(callback, WAIT);

        debounced.call("a".into());
        sleep(WAIT * 2).await;
        debounced.call("b".into());
        sleep(WAIT * 2).await;

        assert_eq!(*calls.lock().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_and_drop_discard_pending_call() {
        let (calls, callback) = recorder();
        let debounced = debounce(callback, WAIT);
        debounced.call("cancelled".into());
        debounced.cancel();
        sleep(WAIT * 2).await;
        assert!(calls.lock().unwrap().is_empty());

        debounced.call("dropped".into());
        drop(debounced);
        sleep(WAIT * 2).await;
        assert!(calls.lock().unwrap().is_empty());
    }
}
