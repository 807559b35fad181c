//! Archive reader boundary.
//!
//! The extraction driver pulls entries one at a time from an
//! [`EntrySource`]. Content is opened lazily so the driver never holds more
//! than one entry in flight and skipped entries are never decompressed.

use std::io::Read;

use crate::error::EntryReadError;
use crate::types::EntryDescriptor;

mod zip;

pub use self::zip::ZipSource;
pub use self::zip::classify_entry_name;

/// Pull-based source of archive entries.
///
/// Implementations stage one entry per call to
/// [`next_entry`](Self::next_entry); [`open_content`](Self::open_content)
/// then reads the content of that staged entry.
pub trait EntrySource {
    /// Stages the next entry.
    ///
    /// Returns `None` once the archive is exhausted or the source has been
    /// closed. A `Some(Err(_))` affects only that entry; the caller may keep
    /// pulling.
    fn next_entry(&mut self) -> Option<Result<EntryDescriptor, EntryReadError>>;

    /// Opens the content of the most recently staged entry.
    ///
    /// # Errors
    ///
    /// Returns an error if no entry is staged or its data is unreadable.
    fn open_content(&mut self) -> Result<Box<dyn Read + '_>, EntryReadError>;

    /// Releases the source. Idempotent; later calls to
    /// [`next_entry`](Self::next_entry) return `None`.
    fn close(&mut self);
}

impl<S: EntrySource + ?Sized> EntrySource for Box<S> {
    fn next_entry(&mut self) -> Option<Result<EntryDescriptor, EntryReadError>> {
        (**self).next_entry()
    }

    fn open_content(&mut self) -> Result<Box<dyn Read + '_>, EntryReadError> {
        (**self).open_content()
    }

    fn close(&mut self) {
        (**self).close();
    }
}
