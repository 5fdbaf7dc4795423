//! Cancellable periodic background tasks.
//!
//! Cancellation is cooperative: a pending sleep wakes promptly, the
//! current tick (if one is mid-flight) finishes or is abandoned by its own
//! logic, and no further tick runs. Requesting cancellation never blocks
//! on the worker thread, so it is safe from a notification callback and
//! from inside the tick itself.

use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Interval shared by the status-poll and view-refresh loops
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// What a periodic tick wants the loop to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Sleep one interval, then tick again
    Continue,
    /// Exit the loop after this tick
    Stop,
}

#[derive(Default)]
struct TokenInner {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

/// Cancellation flag with prompt wakeup.
///
/// The interval sleep is the loop's only blocking point and its only
/// cancellation point; `cancel` interrupts a pending sleep instead of
/// letting it run out.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<TokenInner>,
}

impl CancelToken {
    /// Create a fresh, uncancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation and wake any pending sleep. Never blocks.
    pub fn cancel(&self) {
        let mut cancelled = self.inner.cancelled.lock();
        *cancelled = true;
        self.inner.wake.notify_all();
    }

    /// Check whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        *self.inner.cancelled.lock()
    }

    /// Sleep for up to `timeout`, returning early when cancelled.
    ///
    /// Returns true when the token is cancelled.
    pub fn sleep(&self, timeout: Duration) -> bool {
        let mut cancelled = self.inner.cancelled.lock();
        if *cancelled {
            return true;
        }
        self.inner.wake.wait_for(&mut cancelled, timeout);
        *cancelled
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// A worker thread running a tick closure once per interval.
///
/// The first tick runs immediately; after that the loop sleeps one
/// interval between ticks. The loop exits when cancelled or when a tick
/// returns [`TickOutcome::Stop`].
pub struct PeriodicTask {
    name: String,
    token: CancelToken,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl PeriodicTask {
    /// Spawn the periodic loop
    pub fn spawn<F>(name: &str, interval: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> TickOutcome + Send + 'static,
    {
        let token = CancelToken::new();
        let loop_token = token.clone();
        let task_name = name.to_string();

        let handle = thread::spawn(move || {
            tracing::debug!(task = %task_name, "periodic task started");
            loop {
                if loop_token.is_cancelled() {
                    break;
                }
                if tick() == TickOutcome::Stop {
                    // Mark the token so observers agree the loop is done.
                    loop_token.cancel();
                    break;
                }
                if loop_token.sleep(interval) {
                    break;
                }
            }
            tracing::debug!(task = %task_name, "periodic task stopped");
        });

        Self {
            name: name.to_string(),
            token,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Get the task name used in logs
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Request cancellation. Never blocks waiting for the worker; the loop
    /// observes the request at its next sleep boundary.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check whether the loop has been asked to stop (or stopped itself)
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait up to `timeout` for the worker thread to exit.
    ///
    /// Returns true when the thread has exited. Intended for tests and
    /// orderly application shutdown; the teardown path never calls it.
    pub fn join_for(&self, timeout: Duration) -> bool {
        let Some(handle) = self.handle.lock().take() else {
            return true;
        };
        let deadline = Instant::now() + timeout;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                *self.handle.lock() = Some(handle);
                return false;
            }
            thread::sleep(Duration::from_millis(5));
        }
        handle.join().is_ok()
    }
}

impl fmt::Debug for PeriodicTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeriodicTask")
            .field("name", &self.name)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
