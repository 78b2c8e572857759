use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// A callable that can be subscribed to a [`LocalEvent`][crate::LocalEvent].
///
/// Watchers are identified by the callable they wrap, not by what the callable does. Clones of
/// a `LocalWatcher` are the same watcher; two watchers created by separate calls to
/// [`LocalWatcher::new()`] are always different watchers, even if created from equal closures.
/// The `PartialEq` implementation follows the same rule.
///
/// Keep a clone of the watcher around if you intend to unsubscribe it later.
///
/// # Example
///
/// ```rust
/// use watchable_events::{LocalEvent, LocalWatcher};
///
/// let event = LocalEvent::<u32>::new();
/// let watcher = LocalWatcher::new(|value: &u32| println!("got {value}"));
///
/// event.watch(&watcher);
/// assert!(event.send(42));
///
/// event.unwatch(&watcher);
/// assert!(!event.send(43));
/// ```
pub struct LocalWatcher<T> {
    callback: Rc<dyn Fn(&T)>,
}

impl<T> LocalWatcher<T> {
    /// Creates a new watcher that invokes `callback` for every value it is sent.
    #[must_use]
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&T) + 'static,
    {
        Self {
            callback: Rc::new(callback),
        }
    }

    pub(crate) fn invoke(&self, value: &T) {
        (self.callback)(value);
    }

    fn address(&self) -> *const () {
        Rc::as_ptr(&self.callback).cast::<()>()
    }
}

impl<T> Clone for LocalWatcher<T> {
    fn clone(&self) -> Self {
        Self {
            callback: Rc::clone(&self.callback),
        }
    }
}

impl<T> PartialEq for LocalWatcher<T> {
    fn eq(&self, other: &Self) -> bool {
        // Vtable pointers are not reliable for identity, so we compare only the data address.
        self.address() == other.address()
    }
}

impl<T> Eq for LocalWatcher<T> {}

impl<T> fmt::Debug for LocalWatcher<T> {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalWatcher")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// A callable that can be subscribed to a thread-safe [`Event`][crate::Event].
///
/// This is the thread-safe counterpart of [`LocalWatcher`] and follows the same identity
/// rules: clones are the same watcher, separately created watchers never are.
///
/// The watcher is invoked on whichever thread sends the value.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// use watchable_events::{Event, Watcher};
///
/// let total = Arc::new(AtomicU32::new(0));
/// let event = Event::<u32>::new();
///
/// let watcher = Watcher::new({
///     let total = Arc::clone(&total);
///     move |value: &u32| {
///         total.fetch_add(*value, Ordering::Relaxed);
///     }
/// });
///
/// event.watch(&watcher);
/// event.send(2);
/// event.send(3);
///
/// assert_eq!(total.load(Ordering::Relaxed), 5);
/// ```
pub struct Watcher<T> {
    callback: Arc<dyn Fn(&T) + Send + Sync>,
}

impl<T> Watcher<T> {
    /// Creates a new watcher that invokes `callback` for every value it is sent.
    #[must_use]
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    pub(crate) fn invoke(&self, value: &T) {
        (self.callback)(value);
    }

    fn address(&self) -> *const () {
        Arc::as_ptr(&self.callback).cast::<()>()
    }
}

impl<T> Clone for Watcher<T> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<T> PartialEq for Watcher<T> {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl<T> Eq for Watcher<T> {}

impl<T> fmt::Debug for Watcher<T> {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}
