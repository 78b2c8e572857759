//! Single-threaded events.
//!
//! This module provides the single-threaded event type, which has lower overhead
//! but cannot be shared across threads.

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::builder::EventOptions;
use crate::watcher_set::{Insertion, Removal, WatcherSet};
use crate::{Error, EventBuilder, LocalWatcher, Result, Watchable};

/// An event that delivers each sent value to all of its watchers, on a single thread.
///
/// Watchers are invoked synchronously by [`send()`][Self::send], in the order they were
/// subscribed. The set of watchers a dispatch reaches is fixed when the dispatch starts:
/// watchers may subscribe or unsubscribe (themselves or others) while being invoked, and the
/// change takes effect from the next dispatch onward.
///
/// Values are not retained - a watcher only receives values sent after it subscribed.
///
/// For an event that can be shared between threads, see [`Event`][crate::Event].
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use watchable_events::{LocalEvent, LocalWatcher};
///
/// let received = Rc::new(RefCell::new(Vec::new()));
/// let event = LocalEvent::<String>::new();
///
/// // Nobody is listening yet, so this value is not delivered anywhere.
/// assert!(!event.send("lost".to_string()));
///
/// event.watch(&LocalWatcher::new({
///     let received = Rc::clone(&received);
///     move |value: &String| received.borrow_mut().push(value.clone())
/// }));
///
/// assert!(event.send("hello".to_string()));
/// assert_eq!(*received.borrow(), vec!["hello".to_string()]);
/// ```
pub struct LocalEvent<T> {
    watchers: RefCell<WatcherSet<LocalWatcher<T>>>,

    options: EventOptions,

    // Everything to do with this event is single-threaded,
    // even if T is thread-mobile or thread-safe.
    _single_threaded: PhantomData<*const ()>,
}

impl<T> LocalEvent<T> {
    /// Creates a new single-threaded event with no watchers.
    ///
    /// # Example
    ///
    /// ```rust
    /// use watchable_events::LocalEvent;
    ///
    /// let event = LocalEvent::<i32>::new();
    /// assert!(event.is_empty());
    /// ```
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self::with_options(EventOptions::default())
    }

    /// Starts building a new single-threaded event with custom options.
    #[must_use]
    pub fn builder() -> EventBuilder<Self> {
        EventBuilder::new()
    }

    pub(crate) fn with_options(options: EventOptions) -> Self {
        Self {
            watchers: RefCell::new(WatcherSet::Empty),
            options,
            _single_threaded: PhantomData,
        }
    }

    /// Creates a new single-threaded event and hands a dispatcher bound to it to `setup`
    /// before returning the event.
    ///
    /// The dispatcher is a shortcut for sending values to the event. It does not keep the
    /// event alive, so `setup` may store it anywhere (including in a watcher of the same
    /// event) without creating a reference cycle.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::cell::RefCell;
    /// use std::rc::Rc;
    ///
    /// use watchable_events::{LocalDispatcher, LocalEvent, LocalWatcher};
    ///
    /// let slot: Rc<RefCell<Option<LocalDispatcher<u32>>>> = Rc::default();
    ///
    /// let event = LocalEvent::with_setup({
    ///     let slot = Rc::clone(&slot);
    ///     move |dispatch| *slot.borrow_mut() = Some(dispatch)
    /// });
    ///
    /// event.watch(&LocalWatcher::new(|value: &u32| println!("=> {value}")));
    ///
    /// let dispatch = slot.borrow_mut().take().unwrap();
    /// assert!(dispatch.dispatch(1).unwrap());
    /// ```
    pub fn with_setup<F>(setup: F) -> Rc<Self>
    where
        F: FnOnce(LocalDispatcher<T>),
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
    ///
    /// If called from inside a watcher during a dispatch, the new watcher is not invoked by
    /// that dispatch.
    pub fn watch(&self, watcher: &LocalWatcher<T>) {
        let (outcome, count) = {
            let mut watchers = self.watchers.borrow_mut();
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
    /// Unsubscribing a watcher that is not subscribed has no effect.
    ///
    /// If called from inside a watcher during a dispatch, the removed watcher is still invoked
    /// by that dispatch if it had not been reached yet.
    pub fn unwatch(&self, watcher: &LocalWatcher<T>) {
        let (outcome, count) = {
            let mut watchers = self.watchers.borrow_mut();
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

    /// Delivers `value` to every watcher, in the order they were subscribed.
    ///
    /// Returns `true` if at least one watcher was invoked and `false` if the event had no
    /// watchers when the dispatch started.
    ///
    /// # Panics
    ///
    /// If a watcher panics, the panic propagates to the caller and the remaining watchers of
    /// this dispatch are not invoked. The event itself remains usable.
    pub fn send(&self, value: T) -> bool {
        // The borrow ends before any watcher runs, so watchers are free to modify the event.
        let snapshot = self.watchers.borrow().snapshot();

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
    #[must_use]
    pub fn watcher_count(&self) -> usize {
        self.watchers.borrow().len()
    }

    /// Whether the event currently has no watchers, i.e. whether a send would be a no-op.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.watcher_count() == 0
    }
}

impl<T> Default for LocalEvent<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for LocalEvent<T> {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // We only expose the cardinality, never the watchers themselves.
        f.debug_struct("LocalEvent")
            .field("name", &self.options.name)
            .field("watcher_count", &self.watcher_count())
            .finish_non_exhaustive()
    }
}

impl<T> Watchable for LocalEvent<T> {
    type Value = T;
    type Watcher = LocalWatcher<T>;

    fn watch(&self, watcher: &LocalWatcher<T>) {
        Self::watch(self, watcher);
    }

    fn unwatch(&self, watcher: &LocalWatcher<T>) {
        Self::unwatch(self, watcher);
    }

    fn send(&self, value: T) -> bool {
        Self::send(self, value)
    }
}

impl<T> EventBuilder<LocalEvent<T>> {
    /// Builds the single-threaded event.
    #[must_use]
    pub fn build(self) -> LocalEvent<T> {
        LocalEvent::with_options(self.options)
    }

    /// Builds the single-threaded event and hands a dispatcher bound to it to `setup`.
    ///
    /// See [`LocalEvent::with_setup()`] for details.
    pub fn build_with_setup<F>(self, setup: F) -> Rc<LocalEvent<T>>
    where
        F: FnOnce(LocalDispatcher<T>),
    {
        let event = Rc::new(self.build());

        setup(LocalDispatcher {
            event: Rc::downgrade(&event),
        });

        event
    }
}

/// Sends values to the [`LocalEvent`] it was created for.
///
/// Obtained via [`LocalEvent::with_setup()`]. The dispatcher does not keep the event alive;
/// once the event is dropped, dispatching fails with [`Error::EventDropped`].
pub struct LocalDispatcher<T> {
    event: Weak<LocalEvent<T>>,
}

impl<T> LocalDispatcher<T> {
    /// Sends `value` to the event this dispatcher is bound to.
    ///
    /// Returns whether any watcher was invoked, like [`LocalEvent::send()`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::EventDropped`] if the event no longer exists.
    ///
    /// # Panics
    ///
    /// Propagates panics from watchers, like [`LocalEvent::send()`].
    pub fn dispatch(&self, value: T) -> Result<bool> {
        let Some(event) = self.event.upgrade() else {
            debug!("dispatch attempted after event was dropped");
            return Err(Error::EventDropped);
        };

        Ok(event.send(value))
    }
}

impl<T> Clone for LocalDispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            event: Weak::clone(&self.event),
        }
    }
}

impl<T> fmt::Debug for LocalDispatcher<T> {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalDispatcher")
            .field("event_alive", &(self.event.strong_count() > 0))
            .finish()
    }
}
