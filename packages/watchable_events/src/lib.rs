#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Synchronous events that broadcast each sent value to all of their watchers.
//!
//! An event holds zero or more watchers. Sending a value to the event invokes every watcher
//! with that value, immediately and on the sending thread, in the order the watchers were
//! subscribed. Nothing is queued and nothing is retained - a watcher only receives values
//! sent while it is subscribed.
//!
//! Both single-threaded and thread-safe variants are available:
//! - [`LocalEvent<T>`], [`LocalWatcher<T>`], [`LocalDispatcher<T>`] - Single-threaded variants
//! - [`Event<T>`], [`Watcher<T>`], [`Dispatcher<T>`] - Thread-safe variants
//!
//! Both implement the [`Watchable`] trait, which the free functions [`watch()`], [`unwatch()`]
//! and [`send()`] are written against.
//!
//! # Dispatch order
//!
//! Each dispatch reaches exactly the watchers that were subscribed when it started, in
//! subscription order. Watchers may subscribe and unsubscribe watchers (including themselves)
//! while being invoked; such changes apply from the next dispatch onward.
//!
//! Watchers are identified by their handle - subscribing the same watcher twice does not make
//! it receive values twice.
//!
//! Events with zero or one watcher do not allocate any collection, neither to store the
//! watcher nor to dispatch to it.
//!
//! # Failures
//!
//! There is no error isolation between watchers. If a watcher panics, the panic propagates out
//! of `send()` and the remaining watchers of that dispatch are not invoked. The event stays
//! usable.
//!
//! # Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use watchable_events::{LocalEvent, LocalWatcher};
//!
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let event = LocalEvent::<&str>::new();
//!
//! let first = LocalWatcher::new({
//!     let log = Rc::clone(&log);
//!     move |value: &&str| log.borrow_mut().push(format!("first: {value}"))
//! });
//! let second = LocalWatcher::new({
//!     let log = Rc::clone(&log);
//!     move |value: &&str| log.borrow_mut().push(format!("second: {value}"))
//! });
//!
//! event.watch(&first);
//! event.watch(&second);
//! event.send("ping");
//!
//! event.unwatch(&first);
//! event.send("pong");
//!
//! assert_eq!(
//!     *log.borrow(),
//!     vec!["first: ping", "second: ping", "second: pong"]
//! );
//! ```
//!
//! # Logging
//!
//! Subscription changes and dispatches are reported via [`tracing`] at the `trace` level,
//! tagged with the event name configured through [`EventBuilder::name()`].

mod builder;
mod constants;
mod error;
mod local;
mod sync;
mod watchable;
mod watcher;
mod watcher_set;

pub use builder::*;
pub(crate) use constants::*;
pub use error::*;
pub use local::*;
pub use sync::*;
pub use watchable::*;
pub use watcher::*;
