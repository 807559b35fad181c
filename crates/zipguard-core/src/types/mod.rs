//! Type-safe wrappers for extraction operations.
//!
//! Containment-critical types (`ExtractionRoot`, `ResolvedTarget`) can only
//! be obtained through validation; there are no `From<PathBuf>`
//! conversions for them.

pub mod entry;
pub mod root;
pub mod target;

pub use entry::EntryDescriptor;
pub use entry::EntryKind;
pub use root::ExtractionRoot;
pub use target::PlannedPath;
pub use target::ResolvedTarget;
