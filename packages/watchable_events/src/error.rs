use thiserror::Error;

/// Errors that can occur when dispatching values through a dispatcher handle.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The event the dispatcher was bound to no longer exists, so the value was not sent.
    #[error("cannot dispatch value because the event has been dropped")]
    EventDropped,
}

/// A specialized `Result` type for dispatcher operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;
