//! Request body hand-off.
//!
//! Once the head is parsed, the connection owner holds two things: the bytes
//! already read past the head, and the socket (or any other byte source) the
//! rest of the body will come from. [`BodyReader`] stitches them together and
//! stops at the declared Content-Length, so the next request on the
//! connection is never consumed by accident.
//!
//! Chunked transfer coding is not decoded here; see
//! [`RequestHead::body_reader`](crate::RequestHead::body_reader).
//!
//! # Body Size Limits
//!
//! By default, bodies are limited to 1MB. The limit is checked against the
//! declared Content-Length before any byte is read.
//!
//! # Example
//!
//! ```
//! use headscan_http::{BodyConfig, BodyReader};
//!
//! let rest = b"hel";
//! let socket = &b"lo, and the next request"[..];
//!
//! let mut reader = BodyReader::new(rest, socket, Some(5), &BodyConfig::default()).unwrap();
//! assert_eq!(reader.read_all().unwrap(), b"hello");
//! ```

use std::io::{self, Read};

/// Default maximum body size (1MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Configuration for body reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyConfig {
    /// Maximum body size in bytes.
    max_size: usize,
    /// Initial buffer capacity for [`BodyReader::read_all`].
    initial_capacity: usize,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_BODY_SIZE,
            initial_capacity: 4096,
        }
    }
}

impl BodyConfig {
    /// Create a new body configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum body size.
    #[must_use]
    pub fn with_max_size(mut self, size: usize) -> Self {
        self.max_size = size;
        self
    }

    /// Set the initial buffer capacity.
    #[must_use]
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Returns the maximum body size.
    #[must_use]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Returns the initial buffer capacity.
    #[must_use]
    pub fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }
}

/// Error types for body reading.
#[derive(Debug)]
pub enum BodyError {
    /// Declared body exceeds the configured maximum.
    TooLarge {
        /// The declared size.
        size: u64,
        /// The maximum allowed size.
        max: usize,
    },
    /// The source ended before the declared length was read.
    Incomplete {
        /// Bytes received so far.
        received: u64,
        /// Expected total size.
        expected: u64,
    },
    /// A body framing this reader does not handle.
    Unsupported(&'static str),
    /// The underlying source failed.
    Io(io::Error),
}

impl std::fmt::Display for BodyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooLarge { size, max } => {
                write!(f, "body too large: {size} bytes exceeds limit of {max}")
            }
            Self::Incomplete { received, expected } => {
                write!(f, "incomplete body: received {received} of {expected} bytes")
            }
            Self::Unsupported(detail) => write!(f, "unsupported body framing: {detail}"),
            Self::Io(e) => write!(f, "body i/o error: {e}"),
        }
    }
}

impl std::error::Error for BodyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for BodyError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Validates a declared body size before reading.
///
/// # Errors
///
/// Returns `BodyError::TooLarge` if the content length exceeds the limit.
pub fn validate_content_length(content_length: u64, config: &BodyConfig) -> Result<(), BodyError> {
    let max = u64::try_from(config.max_size).unwrap_or(u64::MAX);
    if content_length > max {
        return Err(BodyError::TooLarge {
            size: content_length,
            max: config.max_size,
        });
    }
    Ok(())
}

// ============================================================================
// Content-Length Body Reader
// ============================================================================

/// Reads a body bounded by Content-Length from buffered bytes plus a source.
///
/// Bytes in `rest` are served first without touching the source. Reading
/// stops after exactly `length` bytes; anything beyond belongs to the next
/// request and is left unread.
#[derive(Debug)]
pub struct BodyReader<'a, R> {
    rest: &'a [u8],
    source: R,
    length: u64,
    position: u64,
    initial_capacity: usize,
}

impl<'a, R: Read> BodyReader<'a, R> {
    /// Create a body reader.
    ///
    /// `content_length` of `None` means no body: the reader is immediately
    /// complete.
    ///
    /// # Errors
    ///
    /// Returns `BodyError::TooLarge` if `content_length` exceeds the
    /// configured maximum.
    pub fn new(
        rest: &'a [u8],
        source: R,
        content_length: Option<u64>,
        config: &BodyConfig,
    ) -> Result<Self, BodyError> {
        let length = content_length.unwrap_or(0);
        validate_content_length(length, config)?;
        debug_body!(
            "body reader: {length} bytes declared, {} buffered",
            rest.len()
        );

        Ok(Self {
            rest,
            source,
            length,
            position: 0,
            initial_capacity: config.initial_capacity,
        })
    }

    /// Returns the declared body length.
    #[must_use]
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Returns the number of bytes still to be read.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.length.saturating_sub(self.position)
    }

    /// Returns true if all bytes have been read.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.position >= self.length
    }

    /// Body bytes already buffered that have not been read yet.
    ///
    /// This is zero-copy: the slice borrows from the buffer given to
    /// [`new`](Self::new), trimmed to the remaining body length.
    #[must_use]
    pub fn buffered(&self) -> &'a [u8] {
        let limit = usize::try_from(self.remaining()).unwrap_or(usize::MAX);
        &self.rest[..self.rest.len().min(limit)]
    }

    /// Read all remaining body bytes.
    ///
    /// # Errors
    ///
    /// Returns `BodyError::Incomplete` if the source ends early, or
    /// `BodyError::Io` if it fails.
    pub fn read_all(&mut self) -> Result<Vec<u8>, BodyError> {
        let hint = usize::try_from(self.remaining()).unwrap_or(usize::MAX);
        let mut body = Vec::with_capacity(hint.min(self.initial_capacity));
        match self.read_to_end(&mut body) {
            Ok(_) => Ok(body),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(BodyError::Incomplete {
                received: self.position,
                expected: self.length,
            }),
            Err(e) => Err(BodyError::Io(e)),
        }
    }

    /// Returns the underlying source. Buffered bytes past the body are not
    /// part of it.
    pub fn into_inner(self) -> R {
        self.source
    }
}

impl<R: Read> Read for BodyReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.remaining();
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let want = usize::try_from(remaining).map_or(buf.len(), |r| r.min(buf.len()));

        let n = if self.rest.is_empty() {
            let n = self.source.read(&mut buf[..want])?;
            if n == 0 {
                debug_body!(
                    "source ended at {} of {} body bytes",
                    self.position,
                    self.length
                );
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "body ended before content-length",
                ));
            }
            n
        } else {
            let n = want.min(self.rest.len());
            buf[..n].copy_from_slice(&self.rest[..n]);
            self.rest = &self.rest[n..];
            n
        };

        self.position += n as u64;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // BodyConfig Tests
    // ========================================================================

    #[test]
    fn body_config_defaults() {
        let config = BodyConfig::default();
        assert_eq!(config.max_size(), DEFAULT_MAX_BODY_SIZE);
        assert_eq!(config.initial_capacity(), 4096);
    }

    #[test]
    fn body_config_custom() {
        let config = BodyConfig::new()
            .with_max_size(2048)
            .with_initial_capacity(1024);
        assert_eq!(config.max_size(), 2048);
        assert_eq!(config.initial_capacity(), 1024);
    }

    // ========================================================================
    // BodyReader Tests
    // ========================================================================

    #[test]
    fn reads_entirely_from_rest() {
        let config = BodyConfig::default();
        let mut reader = BodyReader::new(b"Hello, World!", io::empty(), Some(13), &config).unwrap();

        assert_eq!(reader.length(), 13);
        assert_eq!(reader.remaining(), 13);
        assert!(!reader.is_complete());

        assert_eq!(reader.read_all().unwrap(), b"Hello, World!");
        assert!(reader.is_complete());
    }

    #[test]
    fn stops_at_content_length() {
        let config = BodyConfig::default();
        let mut reader = BodyReader::new(
            b"helloGET / HTTP/1.1\r\n",
            io::empty(),
            Some(5),
            &config,
        )
        .unwrap();

        assert_eq!(reader.buffered(), b"hello");
        assert_eq!(reader.read_all().unwrap(), b"hello");
    }

    #[test]
    fn continues_from_source() {
        let config = BodyConfig::default();
        let source = &b"lo world, then more"[..];
        let mut reader = BodyReader::new(b"hel", source, Some(11), &config).unwrap();

        assert_eq!(reader.read_all().unwrap(), b"hello world");
        assert_eq!(reader.into_inner(), b", then more");
    }

    #[test]
    fn incremental_read() {
        let config = BodyConfig::default();
        let mut reader = BodyReader::new(b"Hello", &b", World!"[..], Some(13), &config).unwrap();
        let mut buf = [0u8; 4];

        let n = reader.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"Hell");
        let n = reader.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"o");
        let n = reader.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b", Wo");
        assert_eq!(reader.remaining(), 4);
    }

    #[test]
    fn absent_length_is_empty_body() {
        let config = BodyConfig::default();
        let mut reader = BodyReader::new(b"leftover", io::empty(), None, &config).unwrap();

        assert!(reader.is_complete());
        assert!(reader.buffered().is_empty());
        assert!(reader.read_all().unwrap().is_empty());
    }

    #[test]
    fn source_ends_early() {
        let config = BodyConfig::default();
        let mut reader = BodyReader::new(b"Hel", &b"lo"[..], Some(10), &config).unwrap();

        let result = reader.read_all();
        assert!(matches!(
            result,
            Err(BodyError::Incomplete {
                received: 5,
                expected: 10
            })
        ));
    }

    #[test]
    fn too_large_rejected_up_front() {
        let config = BodyConfig::new().with_max_size(3);
        let result = BodyReader::new(b"small", io::empty(), Some(100), &config);

        assert!(matches!(
            result,
            Err(BodyError::TooLarge { size: 100, max: 3 })
        ));
    }

    // ========================================================================
    // validate_content_length Tests
    // ========================================================================

    #[test]
    fn validate_content_length_bounds() {
        let config = BodyConfig::new().with_max_size(1000);
        assert!(validate_content_length(500, &config).is_ok());
        assert!(validate_content_length(1000, &config).is_ok());
        assert!(matches!(
            validate_content_length(1001, &config),
            Err(BodyError::TooLarge {
                size: 1001,
                max: 1000
            })
        ));
    }

    // ========================================================================
    // BodyError Tests
    // ========================================================================

    #[test]
    fn body_error_display() {
        let err = BodyError::TooLarge {
            size: 2000,
            max: 1000,
        };
        assert_eq!(
            format!("{err}"),
            "body too large: 2000 bytes exceeds limit of 1000"
        );

        let err = BodyError::Incomplete {
            received: 50,
            expected: 100,
        };
        assert_eq!(
            format!("{err}"),
            "incomplete body: received 50 of 100 bytes"
        );

        let err = BodyError::Unsupported("transfer-encoding");
        assert_eq!(
            format!("{err}"),
            "unsupported body framing: transfer-encoding"
        );
    }

    #[test]
    fn body_error_source() {
        use std::error::Error;

        let err = BodyError::from(io::Error::other("socket closed"));
        assert!(err.source().is_some());
        assert!(BodyError::Unsupported("x").source().is_none());
    }
}
