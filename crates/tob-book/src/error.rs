//! Error types for tob-book.

use thiserror::Error;

/// Book error types.
///
/// Observer failures are contained at the notification site: the book
/// logs them and keeps notifying the remaining subscribers.
#[derive(Debug, Error)]
pub enum BookError {
    #[error("Observer failed: {0}")]
    Observer(String),
}

/// Result type alias for book operations.
pub type Result<T> = std::result::Result<T, BookError>;
