// A poisoned lock means the process is in an unrecoverable/unsafe state and must exit (we panic).
//
// Watchers never run while the lock is held and capacity requests are clamped, so this can only
// happen if the allocator itself fails while the watcher set is being updated.
pub(crate) const ERR_POISONED_LOCK: &str = "encountered poisoned lock - continued execution \
    is not safe because the watcher set of the event may be in an inconsistent state";
