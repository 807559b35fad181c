//! Extraction engine.
//!
//! [`Driver`] sequences entries through path resolution and
//! [`EntryWriter`]; [`CancellationToken`] lets callers stop a running job.

pub mod cancel;
pub mod dirs;
pub mod driver;
pub mod stream;
pub mod writer;

pub use cancel::CancellationToken;
pub use driver::Driver;
pub use writer::EntryWriter;
