//! The shared vocabulary of types whose values can be watched.

/// A type that delivers values to subscribed watchers.
///
/// This is the common interface of [`LocalEvent`][crate::LocalEvent] and
/// [`Event`][crate::Event]. Other types can implement it to take part in the same
/// `watch`/`unwatch`/`send` vocabulary, which the free functions [`watch()`], [`unwatch()`]
/// and [`send()`] are written against.
pub trait Watchable {
    /// The type of value delivered to watchers.
    type Value;

    /// The handle that identifies a subscribed watcher.
    type Watcher;

    /// Subscribes `watcher` to values sent after this call.
    ///
    /// Subscribing a watcher that is already subscribed has no effect.
    fn watch(&self, watcher: &Self::Watcher);

    /// Unsubscribes `watcher`.
    ///
    /// Unsubscribing a watcher that is not subscribed has no effect.
    fn unwatch(&self, watcher: &Self::Watcher);

    /// Delivers `value` to every subscribed watcher.
    ///
    /// Returns `true` if at least one watcher was invoked.
    fn send(&self, value: Self::Value) -> bool;
}

/// Subscribes `watcher` to values sent to `target`.
///
/// # Example
///
/// ```rust
/// use watchable_events::{LocalEvent, LocalWatcher, send, watch};
///
/// let event = LocalEvent::<&str>::new();
/// watch(&event, &LocalWatcher::new(|value: &&str| println!("{value}")));
///
/// assert!(send(&event, "hello"));
/// ```
pub fn watch<W>(target: &W, watcher: &W::Watcher)
where
    W: Watchable + ?Sized,
{
    target.watch(watcher);
}

/// Unsubscribes `watcher` from values sent to `target`.
pub fn unwatch<W>(target: &W, watcher: &W::Watcher)
where
    W: Watchable + ?Sized,
{
    target.unwatch(watcher);
}

/// Delivers `value` to every watcher of `target`, returning `true` if any watcher was invoked.
pub fn send<W>(target: &W, value: W::Value) -> bool
where
    W: Watchable + ?Sized,
{
    target.send(value)
}
