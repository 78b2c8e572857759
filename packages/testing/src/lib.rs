#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))] // This is all test code, no need to test it.

//! Private helpers for testing and examples in `watchable_events` packages.

use std::fmt;
use std::mem;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

/// Runs a test on a separate thread and fails it if it does not finish within the timeout.
///
/// Watchers are arbitrary user code and a broken dispatch can easily turn into an endless
/// loop or a deadlock on the event lock, so multi-threaded tests are wrapped in this to keep
/// CI from hanging.
///
/// The timeout is 10 seconds under normal conditions and 60 seconds under Miri.
///
/// When the `MUTATION_TESTING` environment variable is set to "1", the watchdog is disabled
/// and the test function is executed directly, so that mutation testing can detect mutations
/// that hang.
///
/// # Panics
///
/// Panics if the test exceeds the timeout. Panics from the test itself are resumed on the
/// calling thread.
///
/// # Example
///
/// ```rust
/// use testing::with_watchdog;
///
/// let sum = with_watchdog(|| 2 + 2);
/// assert_eq!(sum, 4);
/// ```
pub fn with_watchdog<F, R>(test_fn: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    if std::env::var("MUTATION_TESTING").as_deref() == Ok("1") {
        return test_fn();
    }

    let timeout = if cfg!(miri) {
        Duration::from_secs(60)
    } else {
        Duration::from_secs(10)
    };

    let (tx, rx) = mpsc::channel();

    let test_thread = thread::spawn(move || {
        // If this fails, the watchdog has already given up on us.
        drop(tx.send(test_fn()));
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => {
            test_thread.join().expect("test thread finished but then panicked");
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            panic!("test exceeded {timeout:?} timeout - likely stuck in a watcher or on a lock");
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => match test_thread.join() {
            Ok(()) => panic!("test thread disconnected without producing a result"),
            Err(e) => std::panic::resume_unwind(e),
        },
    }
}

/// Collects values observed by watchers so tests can assert on what was delivered and in
/// which order.
///
/// Clones share the same log. The recorder is thread-safe, so the same type serves both
/// single-threaded and thread-safe watchers.
///
/// # Example
///
/// ```rust
/// use testing::Recorder;
///
/// let recorder = Recorder::new();
///
/// let in_watcher = recorder.clone();
/// let watcher = move |value: &u32| in_watcher.record(*value);
///
/// watcher(&1);
/// watcher(&2);
///
/// assert_eq!(recorder.take(), vec![1, 2]);
/// assert!(recorder.take().is_empty());
/// ```
pub struct Recorder<T> {
    entries: Arc<Mutex<Vec<T>>>,
}

impl<T> Recorder<T> {
    /// Creates a recorder with an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Appends `entry` to the log.
    ///
    /// # Panics
    ///
    /// Panics if a previous user of the recorder panicked while holding the log lock.
    pub fn record(&self, entry: T) {
        self.entries
            .lock()
            .expect("recorder lock poisoned")
            .push(entry);
    }

    /// Removes and returns everything recorded so far, in recording order.
    ///
    /// # Panics
    ///
    /// Panics if a previous user of the recorder panicked while holding the log lock.
    #[must_use]
    pub fn take(&self) -> Vec<T> {
        mem::take(&mut *self.entries.lock().expect("recorder lock poisoned"))
    }
}

impl<T> Default for Recorder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Recorder<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<T> fmt::Debug for Recorder<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recorder")
            .field("entries", &self.entries)
            .finish()
    }
}
