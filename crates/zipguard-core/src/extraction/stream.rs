//! Buffered content copy with cancellation checks.
//!
//! File content is copied through a heap buffer owned by the writer and
//! reused for every entry of a job, instead of allocating per call like
//! `std::io::copy`. The cancellation token is checked before every chunk so
//! a large entry stops promptly.

use std::io::Read;
use std::io::Write;
use std::io::{self};

use super::CancellationToken;

/// Buffer size for content copies (64KB).
///
/// Matches typical filesystem block sizes.
pub const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Reusable copy buffer.
#[derive(Debug)]
pub struct CopyBuffer {
    buf: Box<[u8]>,
}

impl CopyBuffer {
    /// Creates a zeroed buffer of [`COPY_BUFFER_SIZE`] bytes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: vec![0u8; COPY_BUFFER_SIZE].into_boxed_slice(),
        }
    }

    /// Returns the buffer size in bytes.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.buf.len()
    }
}

impl Default for CopyBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Why a copy stopped early.
#[derive(Debug)]
pub enum CopyError {
    /// Reading entry content failed.
    Read(io::Error),
    /// Writing to the destination failed.
    Write(io::Error),
    /// The job was cancelled between chunks.
    Cancelled,
}

/// Copies `reader` into `writer` through `buffer`, returning the number of
/// bytes copied.
///
/// # Errors
///
/// Returns `CopyError::Cancelled` as soon as `cancel` is set, or the
/// failing side's I/O error.
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use zipguard_core::extraction::CancellationToken;
/// use zipguard_core::extraction::stream::CopyBuffer;
/// use zipguard_core::extraction::stream::copy_with_buffer;
///
/// let mut buffer = CopyBuffer::new();
/// let mut output = Vec::new();
/// let copied = copy_with_buffer(
///     &mut Cursor::new(b"hello"),
///     &mut output,
///     &mut buffer,
///     &CancellationToken::new(),
/// )
/// .unwrap();
/// assert_eq!(copied, 5);
/// ```
pub fn copy_with_buffer<R, W>(
    reader: &mut R,
    writer: &mut W,
    buffer: &mut CopyBuffer,
    cancel: &CancellationToken,
) -> Result<u64, CopyError>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut total: u64 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(CopyError::Cancelled);
        }

        let bytes_read = match reader.read(&mut buffer.buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CopyError::Read(e)),
        };

        writer
            .write_all(&buffer.buf[..bytes_read])
            .map_err(CopyError::Write)?;

        total = total.saturating_add(bytes_read as u64);
    }

    Ok(total)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::InvalidData, "corrupt deflate stream"))
        }
    }

    struct CancelAfterFirstChunk {
        inner: Cursor<Vec<u8>>,
        cancel: CancellationToken,
    }

    impl Read for CancelAfterFirstChunk {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.inner.read(buf)?;
            self.cancel.cancel();
            Ok(n)
        }
    }

    #[test]
    fn test_copy_buffer_size() {
        assert_eq!(CopyBuffer::new().size(), COPY_BUFFER_SIZE);
        assert_eq!(CopyBuffer::default().size(), COPY_BUFFER_SIZE);
    }

    #[test]
    fn test_copy_empty_source() {
        let mut buffer = CopyBuffer::new();
        let mut output = Vec::new();
        let copied = copy_with_buffer(
            &mut Cursor::new(Vec::<u8>::new()),
            &mut output,
            &mut buffer,
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(copied, 0);
        assert!(output.is_empty());
    }

    #[test]
    fn test_copy_multiple_chunks() {
        let mut buffer = CopyBuffer::new();
        let input = vec![0x55u8; COPY_BUFFER_SIZE * 3 + 1000];
        let mut output = Vec::new();
        let copied = copy_with_buffer(
            &mut Cursor::new(&input),
            &mut output,
            &mut buffer,
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(copied, input.len() as u64);
        assert_eq!(output, input);
    }

    #[test]
    fn test_copy_stops_when_cancelled() {
        let cancel = CancellationToken::new();
        let mut reader = CancelAfterFirstChunk {
            inner: Cursor::new(vec![1u8; COPY_BUFFER_SIZE * 4]),
            cancel: cancel.clone(),
        };
        let mut output = Vec::new();
        let result = copy_with_buffer(&mut reader, &mut output, &mut CopyBuffer::new(), &cancel);
        assert!(matches!(result, Err(CopyError::Cancelled)));
        assert_eq!(output.len(), COPY_BUFFER_SIZE);
    }

    #[test]
    fn test_copy_already_cancelled_writes_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut output = Vec::new();
        let result = copy_with_buffer(
            &mut Cursor::new(b"data"),
            &mut output,
            &mut CopyBuffer::new(),
            &cancel,
        );
        assert!(matches!(result, Err(CopyError::Cancelled)));
        assert!(output.is_empty());
    }

    #[test]
    fn test_copy_read_error() {
        let mut output = Vec::new();
        let result = copy_with_buffer(
            &mut FailingReader,
            &mut output,
            &mut CopyBuffer::new(),
            &CancellationToken::new(),
        );
        assert!(matches!(result, Err(CopyError::Read(_))));
    }
}
