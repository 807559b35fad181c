//! Test utilities for archive creation and scripted entry sources.
//!
//! This module provides reusable helpers for building in-memory ZIP
//! archives and entry sources with hand-crafted metadata, reducing code
//! duplication across unit, integration and CLI tests.
//!
//! # Panics
//!
//! All functions in this module may panic on I/O errors since they are
//! designed for test use only where panics are acceptable.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::VecDeque;
use std::io::Cursor;
use std::io::Read;
use std::io::Write;
use std::path::Path;

use zip::write::SimpleFileOptions;

use crate::error::EntryReadError;
use crate::source::EntrySource;
use crate::types::EntryDescriptor;

/// Signature of a central directory file header.
const CENTRAL_HEADER_SIGNATURE: [u8; 4] = [b'P', b'K', 1, 2];

/// Returns the offset of every central directory record in `data`.
#[must_use]
pub fn central_header_offsets(data: &[u8]) -> Vec<usize> {
    data.windows(CENTRAL_HEADER_SIGNATURE.len())
        .enumerate()
        .filter(|(_, window)| *window == CENTRAL_HEADER_SIGNATURE)
        .map(|(offset, _)| offset)
        .filter(|offset| offset + 46 <= data.len())
        .collect()
}

/// Rewrites every central directory record of `data` as authored on an
/// MS-DOS host with the given attribute word, the way archivers on Windows
/// record entries. Returns the number of records patched.
///
/// # Examples
///
/// ```
/// use zipguard_core::test_utils::ZipTestBuilder;
/// use zipguard_core::test_utils::set_msdos_attributes;
///
/// let mut zip_data = ZipTestBuilder::new().add_file("file.txt", b"hello").build();
/// assert_eq!(set_msdos_attributes(&mut zip_data, 0x20), 1);
/// ```
pub fn set_msdos_attributes(data: &mut [u8], attributes: u32) -> usize {
    let offsets = central_header_offsets(data);
    for &offset in &offsets {
        // "version made by": low byte is the format version, high byte the host.
        data[offset + 5] = 0;
        data[offset + 38..offset + 42].copy_from_slice(&attributes.to_le_bytes());
    }
    offsets.len()
}

/// Builder for creating ZIP test archives with various entry types.
///
/// # Examples
///
/// ```
/// use zipguard_core::test_utils::ZipTestBuilder;
///
/// let zip_data = ZipTestBuilder::new()
///     .add_file("file.txt", b"content")
///     .add_directory("dir/")
///     .add_symlink("link", "file.txt")
///     .build();
/// ```
pub struct ZipTestBuilder {
    zip: zip::ZipWriter<Cursor<Vec<u8>>>,
}

impl ZipTestBuilder {
    /// Creates a new ZIP test builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            zip: zip::ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    /// Adds a regular file to the archive.
    #[must_use]
    pub fn add_file(self, path: &str, data: &[u8]) -> Self {
        self.add_file_with_mode(path, data, 0o644)
    }

    /// Adds a regular file with custom permission bits.
    #[must_use]
    pub fn add_file_with_mode(mut self, path: &str, data: &[u8], mode: u32) -> Self {
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored)
            .unix_permissions(mode);
        self.zip.start_file(path, options).unwrap();
        self.zip.write_all(data).unwrap();
        self
    }

    /// Adds a deflate-compressed regular file.
    #[must_use]
    pub fn add_compressed_file(mut self, path: &str, data: &[u8]) -> Self {
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .unix_permissions(0o644);
        self.zip.start_file(path, options).unwrap();
        self.zip.write_all(data).unwrap();
        self
    }

    /// Adds a directory to the archive.
    #[must_use]
    pub fn add_directory(mut self, path: &str) -> Self {
        let options = SimpleFileOptions::default().unix_permissions(0o755);
        self.zip.add_directory(path, options).unwrap();
        self
    }

    /// Adds a symlink whose content is `target`.
    #[must_use]
    pub fn add_symlink(mut self, path: &str, target: &str) -> Self {
        let options = SimpleFileOptions::default();
        self.zip.add_symlink(path, target, options).unwrap();
        self
    }

    /// Builds and returns the ZIP archive data.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.zip.finish().unwrap().into_inner()
    }

    /// Builds the archive and writes it to `path`.
    pub fn write_to(self, path: &Path) {
        std::fs::write(path, self.build()).unwrap();
    }
}

impl Default for ZipTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Scripted [`EntrySource`] holding raw descriptors and content in memory.
///
/// Lets tests feed metadata a ZIP writer cannot produce, such as MS-DOS
/// attributes or setuid bits, and inject read errors between entries.
///
/// # Examples
///
/// ```
/// use zipguard_core::source::EntrySource;
/// use zipguard_core::test_utils::MemorySource;
/// use zipguard_core::types::EntryDescriptor;
///
/// let mut source = MemorySource::new()
///     .with_entry(EntryDescriptor::unix("a.txt", 0o100_644), b"a")
///     .with_entry(EntryDescriptor::new("FOLDER").with_attributes(16), b"");
///
/// assert_eq!(source.next_entry().unwrap().unwrap().name, "a.txt");
/// ```
#[derive(Debug, Default)]
pub struct MemorySource {
    pending: VecDeque<Result<(EntryDescriptor, Vec<u8>), EntryReadError>>,
    staged: Option<Vec<u8>>,
    closed: bool,
    close_calls: usize,
    contents_opened: usize,
}

impl MemorySource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    #[must_use]
    pub fn with_entry(mut self, descriptor: EntryDescriptor, content: &[u8]) -> Self {
        self.pending.push_back(Ok((descriptor, content.to_vec())));
        self
    }

    /// Appends a read error in entry position.
    #[must_use]
    pub fn with_error(mut self, error: EntryReadError) -> Self {
        self.pending.push_back(Err(error));
        self
    }

    /// Returns `true` once [`EntrySource::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of times [`EntrySource::close`] was called.
    #[must_use]
    pub fn close_calls(&self) -> usize {
        self.close_calls
    }

    /// Number of times content was opened.
    #[must_use]
    pub fn contents_opened(&self) -> usize {
        self.contents_opened
    }

    /// Number of entries not yet pulled.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl EntrySource for MemorySource {
    fn next_entry(&mut self) -> Option<Result<EntryDescriptor, EntryReadError>> {
        self.staged = None;
        if self.closed {
            return None;
        }
        match self.pending.pop_front()? {
            Ok((descriptor, content)) => {
                self.staged = Some(content);
                Some(Ok(descriptor))
            }
            Err(err) => Some(Err(err)),
        }
    }

    fn open_content(&mut self) -> Result<Box<dyn Read + '_>, EntryReadError> {
        let content = self
            .staged
            .as_deref()
            .ok_or_else(|| EntryReadError::malformed("no entry staged"))?;
        self.contents_opened += 1;
        Ok(Box::new(content))
    }

    fn close(&mut self) {
        self.closed = true;
        self.close_calls += 1;
        self.staged = None;
    }
}
