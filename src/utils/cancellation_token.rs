use std::{
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

/// A cancellation token for interruptible waits, such as the window between two CPU tick
/// samples.
pub struct CancellationToken {
    // Setting this to true marks the token as cancelled.
    mutex: Mutex<bool>,
    cvar: Condvar,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self {
            mutex: Mutex::new(false),
            cvar: Condvar::new(),
        }
    }
}

impl CancellationToken {
    fn lock(&self) -> MutexGuard<'_, bool> {
        // A bool cannot be left half-written, so a poisoned lock is still usable.
        self.mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark the [`CancellationToken`] as cancelled.
    ///
    /// This is idempotent, and once cancelled, will stay cancelled.
    pub fn cancel(&self) {
        let mut guard = self.lock();

        if !*guard {
            *guard = true;
            self.cvar.notify_all();
        }
    }

    /// Whether the token has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.lock()
    }

    /// Sleeps for `duration` unless the token is (or becomes) cancelled first.
    ///
    /// Returns whether the token was cancelled.
    pub fn sleep_with_cancellation(&self, duration: Duration) -> bool {
        let guard = self.lock();

        if *guard {
            return true;
        }

        let (result, _) = self
            .cvar
            .wait_timeout_while(guard, duration, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);

        *result
    }
}

#[cfg(test)]
mod test {
    use std::{
        sync::Arc,
        thread,
        time::{Duration, Instant},
    };

    use super::*;

    #[test]
    fn sleeps_without_cancel() {
        let token = CancellationToken::default();
        let start = Instant::now();

        assert!(!token.sleep_with_cancellation(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn already_cancelled_returns_immediately() {
        let token = CancellationToken::default();
        token.cancel();
        token.cancel();

        let start = Instant::now();
        assert!(token.sleep_with_cancellation(Duration::from_secs(30)));
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(token.is_cancelled());
    }

    #[test]
    fn cancel_wakes_sleeper() {
        let token = Arc::new(CancellationToken::default());
        let sleeper = {
            let token = token.clone();
            thread::spawn(move || token.sleep_with_cancellation(Duration::from_secs(30)))
        };

        thread::sleep(Duration::from_millis(20));
        token.cancel();

        assert!(sleeper.join().unwrap());
    }
}
