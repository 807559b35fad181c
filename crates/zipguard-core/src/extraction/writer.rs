//! Materializes resolved entries on disk.

use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::BufWriter;
use std::io::Read;
use std::io::Write;
use std::path::Path;

use tracing::debug;

use super::CancellationToken;
use super::dirs::ensure_dir;
use super::stream::COPY_BUFFER_SIZE;
use super::stream::CopyBuffer;
use super::stream::CopyError;
use super::stream::copy_with_buffer;
use crate::ExtractionError;
use crate::Result;
use crate::error::FsOp;
use crate::security::ResolvedMode;
use crate::source::EntrySource;
use crate::types::EntryKind;
use crate::types::ResolvedTarget;

/// Writes directories, files and symlinks for resolved targets.
///
/// Content is only pulled from the source when something is actually
/// written, so directory entries and dry runs never decompress data.
#[derive(Debug)]
pub struct EntryWriter {
    dry_run: bool,
    buffer: CopyBuffer,
}

impl EntryWriter {
    /// Creates a writer. In dry-run mode every write is a successful no-op.
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            buffer: CopyBuffer::new(),
        }
    }

    /// Returns `true` if this writer performs no writes.
    #[must_use]
    pub const fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Writes the entry currently staged in `source` to `target`.
    ///
    /// Returns the number of content bytes written; always zero for
    /// directories, symlinks and dry runs.
    ///
    /// # Errors
    ///
    /// - `ExtractionError::Entry` if the source cannot open the content
    /// - `ExtractionError::Fs` if a filesystem operation fails
    /// - `ExtractionError::PermissionDenied` if the file stays unwritable
    ///   after relaxing its permissions once
    /// - `ExtractionError::Cancelled` if `cancel` is set mid-copy
    pub fn write<S>(
        &mut self,
        target: &ResolvedTarget,
        mode: &ResolvedMode,
        source: &mut S,
        cancel: &CancellationToken,
    ) -> Result<u64>
    where
        S: EntrySource + ?Sized,
    {
        if self.dry_run {
            debug!(entry = target.name(), kind = ?mode.kind, "dry run, not writing");
            return Ok(0);
        }

        match mode.kind {
            EntryKind::Directory => {
                // Directories get OS default permissions; the resolved mode is
                // informational only.
                ensure_dir(target.dest())
                    .map_err(|e| ExtractionError::fs(FsOp::CreateDir, target.dest(), e))?;
                Ok(0)
            }
            EntryKind::File => {
                if let Some(parent) = target.dest().parent() {
                    ensure_dir(parent)
                        .map_err(|e| ExtractionError::fs(FsOp::CreateDir, parent, e))?;
                }
                let mut content = source.open_content()?;
                self.write_file(target.dest(), mode.mode, &mut content, cancel)
            }
            EntryKind::Symlink => {
                let mut content = source.open_content()?;
                write_symlink(target.dest(), &mut content)?;
                Ok(0)
            }
        }
    }

    fn write_file<R>(
        &mut self,
        dest: &Path,
        mode: u32,
        content: &mut R,
        cancel: &CancellationToken,
    ) -> Result<u64>
    where
        R: Read + ?Sized,
    {
        let file = create_file(dest, mode)?;
        let mut output = BufWriter::with_capacity(COPY_BUFFER_SIZE, file);

        let bytes = copy_with_buffer(content, &mut output, &mut self.buffer, cancel).map_err(
            |e| match e {
                CopyError::Read(e) => ExtractionError::fs(FsOp::Read, dest, e),
                CopyError::Write(e) => ExtractionError::fs(FsOp::Write, dest, e),
                CopyError::Cancelled => ExtractionError::Cancelled,
            },
        )?;

        output
            .flush()
            .map_err(|e| ExtractionError::fs(FsOp::Write, dest, e))?;

        debug!(path = %dest.display(), bytes, mode = %format_args!("{mode:o}"), "wrote file");
        Ok(bytes)
    }
}

/// Opens `dest` for writing, relaxing its permissions once if the first
/// attempt is denied.
fn create_file(dest: &Path, mode: u32) -> Result<File> {
    let mut relaxed = false;
    loop {
        match open_for_write(dest, mode) {
            Ok(file) => return Ok(file),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied && !relaxed => {
                debug!(path = %dest.display(), "permission denied, retrying with owner write access");
                relax_permissions(dest, mode).map_err(|source| {
                    ExtractionError::PermissionDenied {
                        path: dest.to_path_buf(),
                        source,
                    }
                })?;
                relaxed = true;
            }
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                return Err(ExtractionError::PermissionDenied {
                    path: dest.to_path_buf(),
                    source: e,
                });
            }
            Err(e) => return Err(ExtractionError::fs(FsOp::CreateFile, dest, e)),
        }
    }
}

#[cfg(unix)]
fn open_for_write(dest: &Path, mode: u32) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode)
        .open(dest)
}

#[cfg(not(unix))]
fn open_for_write(dest: &Path, _mode: u32) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(dest)
}

#[cfg(unix)]
fn relax_permissions(dest: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(dest, fs::Permissions::from_mode(mode | 0o600))
}

#[cfg(not(unix))]
fn relax_permissions(dest: &Path, _mode: u32) -> io::Result<()> {
    let mut permissions = fs::metadata(dest)?.permissions();
    permissions.set_readonly(false);
    fs::set_permissions(dest, permissions)
}

/// Creates a symlink at `dest` whose target is the entry content, replacing
/// an existing non-directory entry once.
fn write_symlink<R>(dest: &Path, content: &mut R) -> Result<()>
where
    R: Read + ?Sized,
{
    let mut raw = Vec::new();
    content
        .read_to_end(&mut raw)
        .map_err(|e| ExtractionError::fs(FsOp::Read, dest, e))?;
    let link = String::from_utf8(raw).map_err(|e| {
        ExtractionError::fs(
            FsOp::Read,
            dest,
            io::Error::new(io::ErrorKind::InvalidData, e),
        )
    })?;

    let mut replaced = false;
    loop {
        match create_symlink(&link, dest) {
            Ok(()) => {
                debug!(path = %dest.display(), target = %link, "created symlink");
                return Ok(());
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && !replaced => {
                fs::remove_file(dest).map_err(|e| ExtractionError::fs(FsOp::Remove, dest, e))?;
                replaced = true;
            }
            Err(e) => return Err(ExtractionError::fs(FsOp::Symlink, dest, e)),
        }
    }
}

#[cfg(unix)]
fn create_symlink(link: &str, dest: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(link, dest)
}

#[cfg(not(unix))]
fn create_symlink(_link: &str, _dest: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symlinks are not supported on this platform",
    ))
}
