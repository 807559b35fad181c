//! Archive entry metadata as supplied by the archive reader.

/// Host system code for MS-DOS / FAT in the "version made by" field.
pub const HOST_MSDOS: u8 = 0;

/// Host system code for Unix in the "version made by" field.
pub const HOST_UNIX: u8 = 3;

/// Kind of filesystem object an entry produces.
///
/// # Examples
///
/// ```
/// use zipguard_core::types::EntryKind;
///
/// assert!(EntryKind::Directory.is_directory());
/// assert!(!EntryKind::File.is_symlink());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Regular file.
    File,

    /// Directory.
    Directory,

    /// Symbolic link; the entry content is the link target.
    Symlink,
}

impl EntryKind {
    /// Returns `true` if this is a regular file.
    #[must_use]
    pub const fn is_file(self) -> bool {
        matches!(self, Self::File)
    }

    /// Returns `true` if this is a directory.
    #[must_use]
    pub const fn is_directory(self) -> bool {
        matches!(self, Self::Directory)
    }

    /// Returns `true` if this is a symlink.
    #[must_use]
    pub const fn is_symlink(self) -> bool {
        matches!(self, Self::Symlink)
    }
}

/// One archive entry record.
///
/// The name is raw and possibly adversarial; nothing about it has been
/// validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDescriptor {
    /// Raw entry name, `/`-separated.
    pub name: String,

    /// Platform attribute field. The high 16 bits hold a Unix mode word
    /// when the authoring host records one; the low byte holds MS-DOS
    /// attributes.
    pub external_attributes: u32,

    /// "Version made by"; the high byte is the authoring host system.
    pub version_made_by: u16,

    /// Uncompressed content size in bytes.
    pub size: u64,
}

impl EntryDescriptor {
    /// Creates a descriptor with no recorded attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            external_attributes: 0,
            version_made_by: 0,
            size: 0,
        }
    }

    /// Creates a descriptor authored on a Unix host with the given mode
    /// word (file type and permission bits).
    pub fn unix(name: impl Into<String>, mode: u32) -> Self {
        Self {
            external_attributes: mode << 16,
            version_made_by: u16::from(HOST_UNIX) << 8,
            ..Self::new(name)
        }
    }

    /// Sets the raw attribute field.
    #[must_use]
    pub fn with_attributes(mut self, external_attributes: u32) -> Self {
        self.external_attributes = external_attributes;
        self
    }

    /// Sets the raw "version made by" field.
    #[must_use]
    pub fn with_version_made_by(mut self, version_made_by: u16) -> Self {
        self.version_made_by = version_made_by;
        self
    }

    /// Sets the uncompressed size.
    #[must_use]
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Host system that authored the entry.
    #[must_use]
    pub fn host_system(&self) -> u8 {
        self.version_made_by.to_be_bytes()[0]
    }

    /// Unix mode word stored in the high half of the attribute field.
    #[must_use]
    pub fn mode_word(&self) -> u32 {
        (self.external_attributes >> 16) & 0xFFFF
    }

    /// Returns `true` if the raw name ends with a path separator.
    #[must_use]
    pub fn has_trailing_separator(&self) -> bool {
        self.name.ends_with('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_kind_predicates() {
        assert!(EntryKind::File.is_file());
        assert!(!EntryKind::File.is_directory());
        assert!(EntryKind::Symlink.is_symlink());
        assert!(!EntryKind::Directory.is_symlink());
    }

    #[test]
    fn test_unix_descriptor_fields() {
        let entry = EntryDescriptor::unix("bin/tool", 0o100_755);
        assert_eq!(entry.mode_word(), 0o100_755);
        assert_eq!(entry.host_system(), HOST_UNIX);
    }

    #[test]
    fn test_msdos_descriptor() {
        let entry = EntryDescriptor::new("DIR").with_attributes(16);
        assert_eq!(entry.host_system(), HOST_MSDOS);
        assert_eq!(entry.mode_word(), 0);
    }

    #[test]
    fn test_trailing_separator() {
        assert!(EntryDescriptor::new("a/b/").has_trailing_separator());
        assert!(!EntryDescriptor::new("a/b").has_trailing_separator());
    }
}
