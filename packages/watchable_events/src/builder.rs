use std::borrow::Cow;
use std::marker::PhantomData;

/// The default initial capacity of the watcher list once an event has more than one watcher.
pub(crate) const DEFAULT_MANY_CAPACITY: usize = 2;

/// The largest initial capacity of the watcher list that the builder accepts. Larger requests
/// are clamped; the list still grows beyond this on demand.
pub(crate) const MAX_MANY_CAPACITY: usize = 1024;

/// Configuration shared by both event flavors.
#[derive(Clone, Debug)]
pub(crate) struct EventOptions {
    pub(crate) name: Cow<'static, str>,
    pub(crate) many_capacity: usize,
}

impl Default for EventOptions {
    fn default() -> Self {
        Self {
            name: Cow::Borrowed(""),
            many_capacity: DEFAULT_MANY_CAPACITY,
        }
    }
}

/// Creates instances of [`LocalEvent`][crate::LocalEvent] and [`Event`][crate::Event].
///
/// All parameters are optional. Use `LocalEvent::builder()` or `Event::builder()` to create a
/// new instance of this builder, then finish it with `build()` or `build_with_setup()`.
///
/// # Example
///
/// ```rust
/// use watchable_events::LocalEvent;
///
/// let event = LocalEvent::<String>::builder()
///     .name("ui_button_clicks")
///     .capacity(8)
///     .build();
///
/// assert_eq!(event.name(), "ui_button_clicks");
/// ```
#[derive(Debug)]
pub struct EventBuilder<E> {
    pub(crate) options: EventOptions,

    _event: PhantomData<fn() -> E>,
}

impl<E> EventBuilder<E> {
    pub(crate) fn new() -> Self {
        Self {
            options: EventOptions::default(),
            _event: PhantomData,
        }
    }

    /// Sets the name of the event, which is attached to the log records the event emits.
    ///
    /// The default is an empty name.
    #[must_use]
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.options.name = name.into();
        self
    }

    /// Sets the initial capacity of the watcher list, allocated when the event first has
    /// more than one watcher.
    ///
    /// Events with a single watcher never allocate a list. Values smaller than 2 are raised
    /// to 2 and values larger than 1024 are lowered to 1024. The default is 2.
    #[must_use]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.options.many_capacity = capacity.clamp(DEFAULT_MANY_CAPACITY, MAX_MANY_CAPACITY);
        self
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use testing::Recorder;

    use super::*;
    use crate::{Event, LocalEvent, LocalWatcher, Watcher};

    #[test]
    fn defaults() {
        let builder = EventBuilder::<LocalEvent<u32>>::new();

        assert_eq!(builder.options.name, "");
        assert_eq!(builder.options.many_capacity, DEFAULT_MANY_CAPACITY);
    }

    #[test]
    fn name_accepts_owned_and_borrowed() {
        let builder = EventBuilder::<LocalEvent<u32>>::new().name("static");
        assert_eq!(builder.options.name, "static");

        let builder = builder.name(format!("dynamic_{}", 1));
        assert_eq!(builder.options.name, "dynamic_1");
    }

    #[test]
    fn capacity_is_at_least_two() {
        let builder = EventBuilder::<LocalEvent<u32>>::new().capacity(0);
        assert_eq!(builder.options.many_capacity, 2);

        let builder = builder.capacity(10);
        assert_eq!(builder.options.many_capacity, 10);
    }

    #[test]
    fn capacity_is_clamped_to_maximum() {
        let builder = EventBuilder::<LocalEvent<u32>>::new().capacity(usize::MAX);

        assert_eq!(builder.options.many_capacity, MAX_MANY_CAPACITY);
    }

    #[test]
    fn huge_capacity_does_not_break_events() {
        let recorder = Recorder::new();

        let local = LocalEvent::<u32>::builder().capacity(usize::MAX).build();
        for tag in ["local 1", "local 2"] {
            let recorder = recorder.clone();
            local.watch(&LocalWatcher::new(move |value: &u32| {
                recorder.record(format!("{tag}: {value}"));
            }));
        }

        let sync = Event::<u32>::builder().capacity(usize::MAX).build();
        for tag in ["sync 1", "sync 2"] {
            let recorder = recorder.clone();
            sync.watch(&Watcher::new(move |value: &u32| {
                recorder.record(format!("{tag}: {value}"));
            }));
        }

        assert!(local.send(1));
        assert!(sync.send(2));
        assert_eq!(sync.watcher_count(), 2);

        assert_eq!(
            recorder.take(),
            vec!["local 1: 1", "local 2: 1", "sync 1: 2", "sync 2: 2"]
        );
    }
}
