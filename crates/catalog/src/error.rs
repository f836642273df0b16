//! Catalog Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A catalog error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a catalog failure.
///
/// ### Caller Errors
/// - [`ErrorKind::NotFound`] - the collection or chapter being listed isn't
///   there. Presentation layers usually answer with a "not found" page.
///
/// ### Library Errors
/// - [`ErrorKind::MalformedName`] - something on disk breaks the numbering
///   convention. The listing is abandoned as a whole; there is no partial
///   result.
///
/// ### Dependency Errors
/// - [`ErrorKind::Storage`]
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The collection, chapter or directory does not exist.
    #[display("not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// A chapter or page name could not be turned into a sort key.
    #[display("malformed name: {_0}")]
    MalformedName(#[error(not(source))] String),
    /// A storage backend operation failed.
    #[display("storage error")]
    Storage,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // A malformed name stays malformed until someone renames the file.
        matches!(self, Self::Storage)
    }
}
