//! Containment and permission checks applied to every entry.
//!
//! - [`path`]: two-phase resolution of entry names against the root
//! - [`permissions`]: entry kind and mode derivation

pub mod path;
pub mod permissions;

pub use path::PathResolver;
pub use path::is_metadata_entry;
pub use permissions::ModeResolver;
pub use permissions::ResolvedMode;
