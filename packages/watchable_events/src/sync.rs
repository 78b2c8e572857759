//! Thread-safe events.
//!
//! This module provides the thread-safe event type, which can be shared across threads
//! at the cost of a lock around every subscription change and dispatch snapshot.

use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use tracing::{debug, trace};

use crate::builder::EventOptions;
use crate::watcher_set::{Insertion, Removal, WatcherSet};
use crate::{ERR_POISONED_LOCK, Error, EventBuilder, Result, Watchable, Watcher};

/// An event that delivers each sent value to all of its watchers and can be shared
/// between threads.
///
/// Delivery follows the same rules as [`LocalEvent`][crate::LocalEvent]: watchers are invoked
/// synchronously by [`send()`][Self::send] in subscription order, and subscription changes made
/// during a dispatch only take effect from the next dispatch onward.
///
/// Watchers are invoked on the thread that calls `send()`. The internal lock is never held
/// while a watcher runs, so sends from different threads may invoke watchers concurrently.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::thread;
///
/// use watchable_events::{Event, Watcher};
///
/// let deliveries = Arc::new(AtomicUsize::new(0));
/// let event = Arc::new(Event::<&str>::new());
///
/// event.watch(&Watcher::new({
///     let deliveries = Arc::clone(&deliveries);
///     move |_: &&str| {
///         deliveries.fetch_add(1, Ordering::Relaxed);
///     }
/// }));
///
/// thread::spawn({
///     let event = Arc::clone(&event);
///     move || event.send("from another thread")
/// })
/// .join()
/// .unwrap();
///
/// assert_eq!(deliveries.load(Ordering::Relaxed), 1);
/// ```
pub struct Event<T> {
    watchers: Mutex<WatcherSet<Watcher<T>>>,

    options: EventOptions,
}

impl<T> Event<T> {
    /// Creates a new thread-safe event with no watchers.
    ///
    /// # Example
    ///
    /// ```rust
    /// use watchable_events::Event;
    ///
    /// let event = Event::<i32>::new();
    /// assert!(event.is_empty());
    /// ```
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self::with_options(EventOptions::default())
    }

    /// Starts building a new thread-safe event with custom options.
    #[must_use]
    pub fn builder() -> EventBuilder<Self> {
        EventBuilder::new()
    }

    pub(crate) fn with_options(options: EventOptions) -> Self {
        Self {
            watchers: Mutex::new(WatcherSet::Empty),
            options,
        }
    }

    /// Creates a new thread-safe event and hands a dispatcher bound to it to `setup`
    /// before returning the event.
    ///
    /// The dispatcher does not keep the event alive and can be moved to other threads.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::thread;
    ///
    /// use watchable_events::{Event, Watcher};
    ///
    /// let mut producer = None;
    ///
    /// let event = Event::<u64>::with_setup(|dispatch| {
    ///     producer = Some(move || {
    ///         for tick in 0..3 {
    ///             if dispatch.dispatch(tick).is_err() {
    ///                 // The event is gone, so there is nobody left to tell.
    ///                 break;
    ///             }
    ///         }
    ///     });
    /// });
    ///
    /// event.watch(&Watcher::new(|tick: &u64| println!("tick {tick}")));
    ///
    /// thread::spawn(producer.unwrap()).join().unwrap();
    /// ```
    pub fn with_setup<F>(setup: F) -> Arc<Self>
    where
        F: FnOnce(Dispatcher<T>),
    {
        Self::builder().build_with_setup(setup)
    }

    /// The name of the event, as configured via the builder. Empty by default.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.options.name
    }

    /// Subscribes `watcher` to values sent after this call.
    ///
    /// Subscribing a watcher that is already subscribed has no effect - every watcher is
    /// invoked at most once per sent value.
    pub fn watch(&self, watcher: &Watcher<T>) {
        let (outcome, count) = {
            let mut watchers = self.watchers.lock().expect(ERR_POISONED_LOCK);
            let outcome = watchers.insert(watcher, self.options.many_capacity);
            (outcome, watchers.len())
        };

        match outcome {
            Insertion::Added => {
                trace!(event = %self.options.name, watchers = count, "watcher added");
            }
            Insertion::AlreadyPresent => {
                trace!(event = %self.options.name, "watcher already subscribed");
            }
        }
    }

    /// Unsubscribes `watcher`.
    ///
    /// Unsubscribing a watcher that is not subscribed has no effect. A dispatch that is already
    /// in progress on any thread may still invoke the removed watcher.
    pub fn unwatch(&self, watcher: &Watcher<T>) {
        let (outcome, count) = {
            let mut watchers = self.watchers.lock().expect(ERR_POISONED_LOCK);
            let outcome = watchers.remove(watcher);
            (outcome, watchers.len())
        };

        match outcome {
            Removal::Removed => {
                trace!(event = %self.options.name, watchers = count, "watcher removed");
            }
            Removal::NotPresent => trace!(event = %self.options.name, "watcher not subscribed"),
        }
    }

    /// Delivers `value` to every watcher, in the order they were subscribed, on the
    /// current thread.
    ///
    /// Returns `true` if at least one watcher was invoked and `false` if the event had no
    /// watchers when the dispatch started.
    ///
    /// # Panics
    ///
    /// If a watcher panics, the panic propagates to the caller and the remaining watchers of
    /// this dispatch are not invoked. The event itself remains usable.
    pub fn send(&self, value: T) -> bool {
        let snapshot = self.watchers.lock().expect(ERR_POISONED_LOCK).snapshot();

        trace!(event = %self.options.name, watchers = snapshot.len(), "dispatching value");

        if snapshot.is_empty() {
            return false;
        }

        for watcher in &snapshot {
            watcher.invoke(&value);
        }

        true
    }

    /// The number of watchers currently subscribed.
    ///
    /// Other threads may change this at any time, so treat the result as a hint.
    #[must_use]
    pub fn watcher_count(&self) -> usize {
        self.watchers.lock().expect(ERR_POISONED_LOCK).len()
    }

    /// Whether the event currently has no watchers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.watcher_count() == 0
    }
}

impl<T> Default for Event<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Event<T> {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.options.name)
            .field("watcher_count", &self.watcher_count())
            .finish_non_exhaustive()
    }
}

impl<T> Watchable for Event<T> {
    type Value = T;
    type Watcher = Watcher<T>;

    fn watch(&self, watcher: &Watcher<T>) {
        Self::watch(self, watcher);
    }

    fn unwatch(&self, watcher: &Watcher<T>) {
        Self::unwatch(self, watcher);
    }

    fn send(&self, value: T) -> bool {
        Self::send(self, value)
    }
}

impl<T> EventBuilder<Event<T>> {
    /// Builds the thread-safe event.
    #[must_use]
    pub fn build(self) -> Event<T> {
        Event::with_options(self.options)
    }

    /// Builds the thread-safe event and hands a dispatcher bound to it to `setup`.
    ///
    /// See [`Event::with_setup()`] for details.
    pub fn build_with_setup<F>(self, setup: F) -> Arc<Event<T>>
    where
        F: FnOnce(Dispatcher<T>),
    {
        let event = Arc::new(self.build());

        setup(Dispatcher {
            event: Arc::downgrade(&event),
        });

        event
    }
}

/// Sends values to the [`Event`] it was created for, from any thread.
///
/// Obtained via [`Event::with_setup()`]. The dispatcher does not keep the event alive;
/// once the event is dropped, dispatching fails with [`Error::EventDropped`].
pub struct Dispatcher<T> {
    event: Weak<Event<T>>,
}

impl<T> Dispatcher<T> {
    /// Sends `value` to the event this dispatcher is bound to.
    ///
    /// Returns whether any watcher was invoked, like [`Event::send()`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::EventDropped`] if the event no longer exists.
    ///
    /// # Panics
    ///
    /// Propagates panics from watchers, like [`Event::send()`].
    pub fn dispatch(&self, value: T) -> Result<bool> {
        let Some(event) = self.event.upgrade() else {
            debug!("dispatch attempted after event was dropped");
            return Err(Error::EventDropped);
        };

        Ok(event.send(value))
    }
}

impl<T> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            event: Weak::clone(&self.event),
        }
    }
}

impl<T> fmt::Debug for Dispatcher<T> {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("event_alive", &(self.event.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use static_assertions::assert_impl_all;
    use testing::{Recorder, with_watchdog};

    use super::*;

    assert_impl_all!(Event<i32>: Send, Sync);
    assert_impl_all!(Dispatcher<i32>: Send, Sync, Clone);

    fn tagged(recorder: &Recorder<String>, tag: &'static str) -> Watcher<&'static str> {
        let recorder = recorder.clone();
        Watcher::new(move |value: &&str| recorder.record(format!("{value}#{tag}")))
    }

    #[test]
    fn send_without_watchers_returns_false() {
        let event = Event::<u32>::new();

        assert!(!event.send(1));
    }

    #[test]
    fn delivers_in_subscription_order_and_ignores_duplicates() {
        let recorder = Recorder::new();
        let event = Event::new();
        let first = tagged(&recorder, "1");
        let second = tagged(&recorder, "2");

        event.watch(&first);
        event.watch(&second);
        event.watch(&first);

        assert!(event.send("a"));
        assert_eq!(recorder.take(), vec!["a#1", "a#2"]);
    }

    #[test]
    fn unwatch_collapses_and_empties() {
        let recorder = Recorder::new();
        let event = Event::new();
        let first = tagged(&recorder, "1");
        let second = tagged(&recorder, "2");

        event.watch(&first);
        event.watch(&second);

        event.unwatch(&first);
        assert_eq!(event.watcher_count(), 1);
        assert!(event.send("a"));

        event.unwatch(&second);
        event.unwatch(&second);
        assert!(event.is_empty());
        assert!(!event.send("b"));

        assert_eq!(recorder.take(), vec!["a#2"]);
    }

    #[test]
    fn watcher_may_modify_event_during_dispatch() {
        let recorder = Recorder::new();
        let event = Arc::new(Event::new());
        let other = tagged(&recorder, "other");

        event.watch(&Watcher::new({
            let event = Arc::downgrade(&event);
            let other = other.clone();
            let recorder = recorder.clone();
            move |value: &&str| {
                recorder.record(format!("{value}#remover"));

                if let Some(event) = event.upgrade() {
                    // Would deadlock if the lock were held during the dispatch.
                    event.unwatch(&other);
                }
            }
        }));
        event.watch(&other);

        event.send("a");
        event.send("b");

        assert_eq!(recorder.take(), vec!["a#remover", "a#other", "b#remover"]);
    }

    #[test]
    fn panicking_watcher_does_not_poison_event() {
        let recorder = Recorder::new();
        let event = Event::new();
        let exploding = Watcher::new(|_: &&str| panic!("watcher failure"));

        event.watch(&exploding);
        event.watch(&tagged(&recorder, "2"));

        let result = catch_unwind(AssertUnwindSafe(|| event.send("a")));
        assert!(result.is_err());
        assert!(recorder.take().is_empty());

        event.unwatch(&exploding);
        assert!(event.send("b"));
        assert_eq!(recorder.take(), vec!["b#2"]);
    }

    #[test]
    fn sends_from_many_threads() {
        with_watchdog(|| {
            const THREADS: usize = 4;
            const SENDS_PER_THREAD: usize = 100;

            let deliveries = Arc::new(AtomicUsize::new(0));
            let event = Arc::new(Event::<usize>::new());

            event.watch(&Watcher::new({
                let deliveries = Arc::clone(&deliveries);
                move |_: &usize| {
                    deliveries.fetch_add(1, Ordering::Relaxed);
                }
            }));

            let barrier = Arc::new(Barrier::new(THREADS));

            let handles = (0..THREADS)
                .map(|_| {
                    let event = Arc::clone(&event);
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        barrier.wait();
                        for i in 0..SENDS_PER_THREAD {
                            assert!(event.send(i));
                        }
                    })
                })
                .collect::<Vec<_>>();

            for handle in handles {
                handle.join().unwrap();
            }

            assert_eq!(
                deliveries.load(Ordering::Relaxed),
                THREADS * SENDS_PER_THREAD
            );
        });
    }

    #[test]
    fn watchers_added_from_other_threads() {
        with_watchdog(|| {
            let recorder = Recorder::new();
            let event = Arc::new(Event::<u32>::new());

            thread::scope(|s| {
                for _ in 0..3 {
                    s.spawn(|| {
                        let recorder = recorder.clone();
                        event.watch(&Watcher::new(move |value: &u32| recorder.record(*value)));
                    });
                }
            });

            assert_eq!(event.watcher_count(), 3);
            assert!(event.send(7));
            assert_eq!(recorder.take(), vec![7, 7, 7]);
        });
    }

    #[test]
    fn dispatcher_works_across_threads() {
        with_watchdog(|| {
            let recorder = Recorder::new();
            let mut captured = None;

            let event = Event::builder()
                .name("cross_thread")
                .build_with_setup(|dispatch| captured = Some(dispatch));
            let dispatch = captured.unwrap();

            event.watch(&Watcher::new({
                let recorder = recorder.clone();
                move |value: &u32| recorder.record(*value)
            }));

            thread::spawn(move || {
                assert!(dispatch.dispatch(1).unwrap());
                assert!(dispatch.dispatch(2).unwrap());
            })
            .join()
            .unwrap();

            assert_eq!(event.name(), "cross_thread");
            assert_eq!(recorder.take(), vec![1, 2]);
        });
    }

    #[test]
    fn dispatcher_reports_dropped_event() {
        let mut captured = None;

        let event = Event::<u32>::with_setup(|dispatch| captured = Some(dispatch));
        let dispatch = captured.unwrap();

        drop(event);

        assert!(matches!(dispatch.dispatch(1), Err(Error::EventDropped)));
    }

    #[test]
    fn reentrant_send_dispatches_nested() {
        with_watchdog(|| {
            let recorder = Recorder::new();
            let event = Arc::new(Event::<u32>::new());
            let depth = Arc::new(AtomicUsize::new(0));

            event.watch(&Watcher::new({
                let event = Arc::downgrade(&event);
                let recorder = recorder.clone();
                move |value: &u32| {
                    recorder.record(format!("outer {value}"));

                    if depth.fetch_add(1, Ordering::Relaxed) == 0 {
                        let event = event.upgrade().unwrap();

                        // Would deadlock if the lock were held during the dispatch.
                        assert!(event.send(value + 1));
                    }
                }
            }));

            assert!(event.send(1));

            assert_eq!(recorder.take(), vec!["outer 1", "outer 2"]);
        });
    }

    #[test]
    fn dispatcher_inside_own_watcher_is_not_a_cycle() {
        with_watchdog(|| {
            let recorder = Recorder::new();
            let mut captured = None;

            let event = Event::<u32>::with_setup(|dispatch| captured = Some(dispatch));
            let dispatch = captured.unwrap();

            event.watch(&Watcher::new({
                let recorder = recorder.clone();
                let dispatch = dispatch.clone();
                move |value: &u32| {
                    recorder.record(*value);

                    if *value < 3 {
                        dispatch.dispatch(value + 1).unwrap();
                    }
                }
            }));

            assert!(dispatch.dispatch(1).unwrap());
            assert_eq!(recorder.take(), vec![1, 2, 3]);

            let weak = Arc::downgrade(&event);
            drop(event);
            assert!(weak.upgrade().is_none());
            assert!(matches!(dispatch.dispatch(4), Err(Error::EventDropped)));
        });
    }
}
