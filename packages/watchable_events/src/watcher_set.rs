use std::mem;

use smallvec::{SmallVec, smallvec};

/// How many watchers a dispatch snapshot can hold before it spills to the heap.
pub(crate) const SNAPSHOT_INLINE_CAPACITY: usize = 4;

/// A point-in-time copy of the watchers of an event, taken when a dispatch starts.
pub(crate) type Snapshot<W> = SmallVec<[W; SNAPSHOT_INLINE_CAPACITY]>;

/// Outcome of adding a watcher to a [`WatcherSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Insertion {
    Added,
    AlreadyPresent,
}

/// Outcome of removing a watcher from a [`WatcherSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Removal {
    Removed,
    NotPresent,
}

/// The watchers of one event, in subscription order.
///
/// The zero and one watcher cases are stored without a collection. `Many` is only ever used
/// while there are at least two watchers - every removal that brings the count down to one
/// collapses the set back to `Single`.
///
/// Watchers are compared via `PartialEq`, which the watcher handles of this crate implement
/// as identity comparison.
#[derive(Debug)]
pub(crate) enum WatcherSet<W> {
    Empty,
    Single(W),
    Many(Vec<W>),
}

impl<W> Default for WatcherSet<W> {
    fn default() -> Self {
        Self::Empty
    }
}

impl<W> WatcherSet<W>
where
    W: Clone + PartialEq,
{
    /// Appends `watcher` unless it is already a member.
    ///
    /// `many_capacity` is the initial capacity of the vector allocated when the set grows
    /// from one watcher to two. It is never less than 2.
    pub(crate) fn insert(&mut self, watcher: &W, many_capacity: usize) -> Insertion {
        match self {
            Self::Empty => {
                *self = Self::Single(watcher.clone());
                Insertion::Added
            }
            Self::Single(existing) => {
                if existing == watcher {
                    return Insertion::AlreadyPresent;
                }

                let mut watchers = Vec::new();

                // An unsatisfiable capacity request must not turn `watch` into a panic.
                if watchers.try_reserve_exact(many_capacity.max(2)).is_err() {
                    watchers.reserve_exact(2);
                }

                watchers.push(existing.clone());
                watchers.push(watcher.clone());

                *self = Self::Many(watchers);
                Insertion::Added
            }
            Self::Many(watchers) => {
                if watchers.contains(watcher) {
                    return Insertion::AlreadyPresent;
                }

                watchers.push(watcher.clone());
                Insertion::Added
            }
        }
    }

    /// Removes the first member identical to `watcher`, if there is one.
    pub(crate) fn remove(&mut self, watcher: &W) -> Removal {
        // Fast path for the most common case of removing the only watcher.
        if matches!(&*self, Self::Single(existing) if existing == watcher) {
            *self = Self::Empty;
            return Removal::Removed;
        }

        let Self::Many(watchers) = self else {
            // Either empty or a single watcher that is not the one we are looking for.
            return Removal::NotPresent;
        };

        let Some(index) = watchers.iter().position(|w| w == watcher) else {
            return Removal::NotPresent;
        };

        watchers.remove(index);

        if watchers.len() < 2 {
            *self = match mem::take(watchers).pop() {
                Some(remaining) => Self::Single(remaining),
                None => Self::Empty,
            };
        }

        debug_assert!(
            !matches!(self, Self::Many(watchers) if watchers.len() < 2),
            "a watcher list must hold at least two watchers"
        );

        Removal::Removed
    }

    /// Copies the current members so that a dispatch can proceed without holding on to
    /// the set, which the watchers themselves may modify while being invoked.
    pub(crate) fn snapshot(&self) -> Snapshot<W> {
        match self {
            Self::Empty => SmallVec::new(),
            Self::Single(watcher) => smallvec![watcher.clone()],
            Self::Many(watchers) => watchers.iter().cloned().collect(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Single(_) => 1,
            Self::Many(watchers) => watchers.len(),
        }
    }
}
