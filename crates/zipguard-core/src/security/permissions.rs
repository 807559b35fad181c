//! Entry kind and permission resolution.

use crate::ExtractOptions;
use crate::config::DEFAULT_DIR_MODE;
use crate::config::DEFAULT_FILE_MODE;
use crate::types::EntryDescriptor;
use crate::types::EntryKind;
use crate::types::entry::HOST_MSDOS;

/// File type mask of a Unix mode word.
pub const S_IFMT: u32 = 0o170_000;

/// Directory file type.
pub const S_IFDIR: u32 = 0o040_000;

/// Symbolic link file type.
pub const S_IFLNK: u32 = 0o120_000;

/// Permission bits that survive resolution. Setuid, setgid and sticky are
/// never applied to extracted files.
pub const PERMISSION_MASK: u32 = 0o777;

// MS-DOS directory attribute with nothing else set.
const MSDOS_DIRECTORY_ATTRIBUTES: u32 = 16;

/// Kind and final permission bits of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedMode {
    /// What the entry produces on disk.
    pub kind: EntryKind,
    /// Permission bits after defaults and the umask.
    pub mode: u32,
}

/// Derives entry kind and permissions from archive metadata.
///
/// The process umask is captured once on construction and reused for every
/// entry of the job.
///
/// # Examples
///
/// ```
/// use zipguard_core::ExtractOptions;
/// use zipguard_core::security::ModeResolver;
/// use zipguard_core::types::EntryDescriptor;
/// use zipguard_core::types::EntryKind;
///
/// let resolver = ModeResolver::new(&ExtractOptions::new("/tmp/out")).with_umask(0o022);
///
/// let tool = resolver.resolve(&EntryDescriptor::unix("bin/tool", 0o100_775));
/// assert_eq!(tool.kind, EntryKind::File);
/// assert_eq!(tool.mode, 0o755);
///
/// let dir = resolver.resolve(&EntryDescriptor::new("docs/"));
/// assert_eq!(dir.kind, EntryKind::Directory);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeResolver {
    default_dir_mode: u32,
    default_file_mode: u32,
    umask: u32,
}

impl ModeResolver {
    /// Creates a resolver from job options, reading the process umask.
    ///
    /// A configured default of zero falls back to the built-in default.
    #[must_use]
    pub fn new(options: &ExtractOptions) -> Self {
        Self {
            default_dir_mode: non_zero_or(options.default_dir_mode, DEFAULT_DIR_MODE),
            default_file_mode: non_zero_or(options.default_file_mode, DEFAULT_FILE_MODE),
            umask: process_umask(),
        }
    }

    /// Replaces the captured umask.
    #[must_use]
    pub const fn with_umask(mut self, umask: u32) -> Self {
        self.umask = umask & PERMISSION_MASK;
        self
    }

    /// Returns the umask applied to every resolved mode.
    #[must_use]
    pub const fn umask(&self) -> u32 {
        self.umask
    }

    /// Resolves kind and permissions for `entry`.
    ///
    /// Directory detection wins over symlink detection.
    #[must_use]
    pub fn resolve(&self, entry: &EntryDescriptor) -> ResolvedMode {
        let word = entry.mode_word();
        let file_type = word & S_IFMT;

        let is_directory = file_type == S_IFDIR
            || entry.has_trailing_separator()
            || (entry.host_system() == HOST_MSDOS
                && entry.external_attributes == MSDOS_DIRECTORY_ATTRIBUTES);

        let kind = if is_directory {
            EntryKind::Directory
        } else if file_type == S_IFLNK {
            EntryKind::Symlink
        } else {
            EntryKind::File
        };

        let mut permissions = word & 0o7777;
        if permissions == 0 {
            permissions = if kind.is_directory() {
                self.default_dir_mode
            } else {
                self.default_file_mode
            };
        }

        ResolvedMode {
            kind,
            mode: permissions & PERMISSION_MASK & !self.umask,
        }
    }
}

const fn non_zero_or(value: u32, fallback: u32) -> u32 {
    if value == 0 { fallback } else { value }
}

/// Returns the file mode creation mask of the current process.
#[cfg(unix)]
#[must_use]
pub fn process_umask() -> u32 {
    #[cfg(target_os = "linux")]
    if let Some(mask) = umask_from_proc() {
        return mask;
    }

    #[allow(unsafe_code)]
    // SAFETY: umask(2) always succeeds and has no memory effects. The
    // previous mask is restored before returning.
    let previous = unsafe {
        let previous = libc::umask(0o022);
        libc::umask(previous);
        previous
    };
    u32::from(previous) & PERMISSION_MASK
}

/// Returns the file mode creation mask of the current process.
#[cfg(not(unix))]
#[must_use]
pub const fn process_umask() -> u32 {
    0
}

// Reads the mask without mutating it; the field exists since Linux 4.7.
#[cfg(target_os = "linux")]
fn umask_from_proc() -> Option<u32> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    status
        .lines()
        .find_map(|line| line.strip_prefix("Umask:"))
        .and_then(|value| u32::from_str_radix(value.trim(), 8).ok())
        .map(|mask| mask & PERMISSION_MASK)
}
