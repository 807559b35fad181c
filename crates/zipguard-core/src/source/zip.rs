//! ZIP archive adapter.

use std::fs::File;
use std::io;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::path::Path;
use std::path::PathBuf;

use ::zip::ZipArchive;

use super::EntrySource;
use crate::ExtractionError;
use crate::Result;
use crate::error::EntryErrorKind;
use crate::error::EntryReadError;
use crate::types::EntryDescriptor;

/// Fixed-size part of a central directory file header.
const CENTRAL_HEADER_LEN: usize = 46;

/// `PK\x01\x02`, little-endian.
const CENTRAL_HEADER_SIGNATURE: u32 = 0x0201_4b50;

/// Raw platform fields of one central directory record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RawAttributes {
    version_made_by: u16,
    external_attributes: u32,
}

/// Reads entries from a ZIP archive in central directory order.
///
/// Descriptors carry the raw "version made by" and external attribute
/// fields of each central directory record, so entries authored on MS-DOS
/// hosts keep their DOS attributes instead of a mode synthesized by the
/// `zip` crate. When a record cannot be read raw, the decoded Unix mode is
/// used instead.
///
/// # Examples
///
/// ```no_run
/// use zipguard_core::source::EntrySource;
/// use zipguard_core::source::ZipSource;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut source = ZipSource::open("archive.zip")?;
/// while let Some(entry) = source.next_entry() {
///     println!("{}", entry?.name);
/// }
/// # Ok(())
/// # }
/// ```
pub struct ZipSource<R: Read + Seek> {
    archive: ZipArchive<R>,
    attributes: Vec<Option<RawAttributes>>,
    next_index: usize,
    staged: Option<usize>,
    closed: bool,
}

impl ZipSource<BufReader<File>> {
    /// Opens the archive at `path` and reads its central directory.
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::Open` if the file cannot be opened or is not
    /// a readable ZIP archive.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ExtractionError::Open {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_reader(BufReader::new(file), path)
    }
}

impl<R: Read + Seek> ZipSource<R> {
    /// Reads the central directory from an arbitrary seekable reader.
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::Open` if the data is not a readable ZIP
    /// archive.
    pub fn new(reader: R) -> Result<Self> {
        Self::from_reader(reader, Path::new("<reader>"))
    }

    fn from_reader(reader: R, label: &Path) -> Result<Self> {
        let open_error = |e: ::zip::result::ZipError| ExtractionError::Open {
            path: PathBuf::from(label),
            reason: e.to_string(),
        };

        let mut archive = ZipArchive::new(reader).map_err(open_error)?;
        let header_offsets: Vec<Option<u64>> = (0..archive.len())
            .map(|index| {
                archive
                    .by_index_raw(index)
                    .ok()
                    .map(|file| file.central_header_start())
            })
            .collect();

        // The zip crate does not expose the raw attribute word, so the
        // records are read directly and the archive is parsed again.
        let mut reader = archive.into_inner();
        let attributes = header_offsets
            .into_iter()
            .map(|offset| offset.and_then(|o| read_raw_attributes(&mut reader, o).ok()))
            .collect();
        let archive = ZipArchive::new(reader).map_err(open_error)?;

        tracing::debug!(archive = %label.display(), entries = archive.len(), "opened zip archive");
        Ok(Self {
            archive,
            attributes,
            next_index: 0,
            staged: None,
            closed: false,
        })
    }

    /// Number of entries in the central directory.
    #[must_use]
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    /// Returns `true` if the archive has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }
}

impl<R: Read + Seek> EntrySource for ZipSource<R> {
    fn next_entry(&mut self) -> Option<std::result::Result<EntryDescriptor, EntryReadError>> {
        self.staged = None;
        if self.closed || self.next_index >= self.archive.len() {
            return None;
        }

        let index = self.next_index;
        self.next_index += 1;

        let file = match self.archive.by_index(index) {
            Ok(file) => file,
            Err(e) => {
                return Some(Err(EntryReadError::malformed(format!(
                    "entry {index}: {e}"
                ))));
            }
        };

        let name = file.name().to_string();
        if let Some(err) = classify_entry_name(&name) {
            return Some(Err(err));
        }

        let raw = self.attributes.get(index).copied().flatten();
        let descriptor = match (raw, file.unix_mode()) {
            (Some(raw), _) => EntryDescriptor::new(name)
                .with_version_made_by(raw.version_made_by)
                .with_attributes(raw.external_attributes),
            (None, Some(mode)) => EntryDescriptor::unix(name, mode),
            (None, None) => EntryDescriptor::new(name),
        }
        .with_size(file.size());
        drop(file);

        self.staged = Some(index);
        Some(Ok(descriptor))
    }

    fn open_content(&mut self) -> std::result::Result<Box<dyn Read + '_>, EntryReadError> {
        let index = self
            .staged
            .ok_or_else(|| EntryReadError::malformed("no entry staged"))?;
        let file = self
            .archive
            .by_index(index)
            .map_err(|e| EntryReadError::malformed(format!("entry {index}: {e}")))?;
        Ok(Box::new(file))
    }

    fn close(&mut self) {
        self.closed = true;
        self.staged = None;
    }
}

/// Reads the platform fields of the central directory record at `offset`.
fn read_raw_attributes<R: Read + Seek>(reader: &mut R, offset: u64) -> io::Result<RawAttributes> {
    let mut header = [0u8; CENTRAL_HEADER_LEN];
    reader.seek(SeekFrom::Start(offset))?;
    reader.read_exact(&mut header)?;

    let signature = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    if signature != CENTRAL_HEADER_SIGNATURE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "not a central directory header",
        ));
    }

    Ok(RawAttributes {
        version_made_by: u16::from_le_bytes([header[4], header[5]]),
        external_attributes: u32::from_le_bytes([header[38], header[39], header[40], header[41]]),
    })
}

/// Rejects entry names that a ZIP reader must not hand to the extractor.
///
/// Returns the classified error, or `None` if the name is acceptable.
///
/// # Examples
///
/// ```
/// use zipguard_core::error::EntryErrorKind;
/// use zipguard_core::source::classify_entry_name;
///
/// assert!(classify_entry_name("docs/readme.txt").is_none());
/// let err = classify_entry_name("../evil").unwrap();
/// assert_eq!(err.kind, EntryErrorKind::InvalidRelativePath);
/// ```
#[must_use]
pub fn classify_entry_name(name: &str) -> Option<EntryReadError> {
    if name.contains(['\\', '\0']) {
        return Some(EntryReadError::new(
            EntryErrorKind::InvalidCharacters,
            format!("invalid characters in file name: {name}"),
        ));
    }

    let bytes = name.as_bytes();
    let drive_prefix = bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':';
    if name.starts_with('/') || drive_prefix {
        return Some(EntryReadError::new(
            EntryErrorKind::AbsolutePath,
            format!("absolute path: {name}"),
        ));
    }

    if name.split('/').any(|segment| segment == "..") {
        return Some(EntryReadError::new(
            EntryErrorKind::InvalidRelativePath,
            format!("invalid relative path: {name}"),
        ));
    }

    None
}
