//! Safe ZIP extraction with containment guarantees.
//!
//! `zipguard-core` extracts ZIP archives into a destination directory and
//! guarantees that no file, directory or symlink is created outside of it,
//! whatever entry names or symlinks the archive contains. Entries are
//! processed strictly one at a time so that symlinks created by earlier
//! entries are taken into account when resolving later ones.
//!
//! # Examples
//!
//! ```no_run
//! use zipguard_core::ExtractOptions;
//! use zipguard_core::extract_zip;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = ExtractOptions::new("/output/dir");
//! let report = extract_zip("archive.zip", &options)?;
//! println!("Extracted {} files", report.files_extracted);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod archive;
pub mod config;
pub mod error;
pub mod extraction;
pub mod report;
pub mod security;
pub mod source;
pub mod types;

#[doc(hidden)]
pub mod test_utils;

// Re-export main API types
pub use api::extract_zip;
pub use api::extract_zip_with_hooks;
pub use archive::ExtractionBuilder;
pub use config::ExtractOptions;
pub use error::ExtractionError;
pub use error::Result;
pub use extraction::CancellationToken;
pub use report::ExtractionHooks;
pub use report::ExtractionReport;
pub use report::NoopHooks;
pub use source::EntrySource;
pub use source::ZipSource;

// Re-export types module for easier access
pub use types::EntryDescriptor;
pub use types::EntryKind;
pub use types::ExtractionRoot;
