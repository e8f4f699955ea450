//! HTTP request head parser.
//!
//! A single forward scan over a buffer believed to hold a complete request
//! head. The request line is split into method, path and version; the header
//! block is walked by an eight-state machine that records header names and
//! values as spans into the buffer. Nothing is copied except values rebuilt by
//! obsolete line folding.
//!
//! The parser keeps no scan position between calls. When the buffer ends
//! before the blank line terminating the head, [`HttpParser::parse`] returns
//! [`ParseError::MissingData`] and the caller retries with a larger buffer
//! holding every byte read so far.
//!
//! # Example
//!
//! ```
//! use headscan_http::HttpParser;
//!
//! let buffer = b"POST /items HTTP/1.1\r\nHost: example.com\r\nContent-Length: 5\r\n\r\nhello";
//! let mut parser = HttpParser::new();
//!
//! let offset = parser.parse(buffer).unwrap();
//! assert_eq!(&buffer[offset..], b"hello");
//!
//! let head = parser.head(buffer).unwrap();
//! assert_eq!(head.method(), b"POST");
//! assert_eq!(head.host(), Some(&b"example.com"[..]));
//! assert_eq!(head.content_length(), Some(5));
//! ```

use crate::body::BodyConfig;
use crate::config::ParserConfig;
use crate::head::{DerivedCache, RequestHead};
use crate::table::{Entry, HeaderTable, Span};

/// Number of header slots a parser allocates by default.
pub const DEFAULT_HEADER_CAPACITY: usize = 4;

/// Read-buffer size that usually holds a whole request head in one read.
pub const OPTIMAL_BUFFER_SIZE: usize = 1500;

pub(crate) const CONTENT_LENGTH: &[u8] = b"Content-Length";

const TRANSFER_ENCODING: &[u8] = b"Transfer-Encoding";

/// HTTP parsing error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// The buffer ended before the head was complete. Read more bytes and
    /// parse the whole buffer again.
    MissingData,
    /// Malformed line termination. Fatal for the current request.
    BadProtocol(&'static str),
    /// An HTTP feature that is deliberately not handled.
    Unsupported(&'static str),
}

impl ParseError {
    /// Returns true if the caller should read more bytes and retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::MissingData)
    }

    /// Returns true if the request cannot be recovered.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !self.is_retryable()
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingData => write!(f, "missing data"),
            Self::BadProtocol(detail) => write!(f, "bad protocol: {detail}"),
            Self::Unsupported(detail) => write!(f, "unsupported http feature: {detail}"),
        }
    }
}

impl std::error::Error for ParseError {}

// ============================================================================
// Request Line Scanner
// ============================================================================

/// Spans of the request line plus the offset where header lines begin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RequestLineSpans {
    pub(crate) method: Span,
    pub(crate) path: Span,
    pub(crate) version: Span,
    pub(crate) headers_start: usize,
}

/// Split `METHOD SP PATH SP VERSION (CRLF | LF)`.
///
/// Method and path end at the first space or tab. The version ends at CR LF
/// or a bare LF; a CR followed by anything else is a protocol error.
pub(crate) fn scan_request_line(input: &[u8]) -> Result<RequestLineSpans, ParseError> {
    let method_end = memchr::memchr2(b' ', b'\t', input).ok_or(ParseError::MissingData)?;
    let path_start = method_end + 1;

    let path_end = memchr::memchr2(b' ', b'\t', &input[path_start..])
        .map(|pos| path_start + pos)
        .ok_or(ParseError::MissingData)?;
    let version_start = path_end + 1;

    let version_end = memchr::memchr2(b'\r', b'\n', &input[version_start..])
        .map(|pos| version_start + pos)
        .ok_or(ParseError::MissingData)?;

    let headers_start = if input[version_end] == b'\n' {
        version_end + 1
    } else {
        match input.get(version_end + 1) {
            Some(b'\n') => version_end + 2,
            Some(_) => {
                debug_parse!("CR without LF after version at offset {version_end}");
                return Err(ParseError::BadProtocol("missing newline in version"));
            }
            None => return Err(ParseError::MissingData),
        }
    };

    Ok(RequestLineSpans {
        method: Span::new(0, method_end),
        path: Span::new(path_start, path_end),
        version: Span::new(version_start, version_end),
        headers_start,
    })
}

// ============================================================================
// Header State Machine
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderState {
    /// Start of a line: a header name, a continuation, or the blank line.
    NextHeader,
    /// Saw CR at the start of a line; LF ends the head.
    NextHeaderNewline,
    /// Inside a header name, waiting for `:`.
    HeaderName,
    /// Skipping whitespace between `:` and the value.
    HeaderValueSpace,
    /// Inside a header value.
    HeaderValue,
    /// Saw CR after a value; LF required.
    HeaderValueNewline,
    /// Skipping leading whitespace of a folded continuation line.
    FoldStart,
    /// Inside a folded continuation.
    FoldValue,
}

/// Reusable HTTP/1.x request head parser.
///
/// Create once per connection (or take one from a
/// [`ParserPool`](crate::ParserPool)) and reuse it: each call to
/// [`parse`](Self::parse) starts a new cycle, and [`reset`](Self::reset)
/// returns the parser to its pooled state between requests.
///
/// All fields are stored as spans into the buffer passed to `parse`. Read them
/// through [`head`](Self::head) with that same buffer.
#[derive(Debug)]
pub struct HttpParser {
    method: Span,
    path: Span,
    version: Span,
    table: HeaderTable,
    capacity_hint: usize,
    subscribe_all: bool,
    subscribed: Vec<Vec<u8>>,
    cache: DerivedCache,
    body_offset: Option<usize>,
    body_config: BodyConfig,
}

impl HttpParser {
    /// Create a parser with room for [`DEFAULT_HEADER_CAPACITY`] headers.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HEADER_CAPACITY)
    }

    /// Create a parser pre-sized for `capacity` headers.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            method: Span::default(),
            path: Span::default(),
            version: Span::default(),
            table: HeaderTable::with_capacity(capacity),
            capacity_hint: capacity,
            subscribe_all: true,
            subscribed: Vec::new(),
            cache: DerivedCache::default(),
            body_offset: None,
            body_config: BodyConfig::default(),
        }
    }

    /// Create a parser from a configuration.
    #[must_use]
    pub fn with_config(config: &ParserConfig) -> Self {
        let mut parser = Self::with_capacity(config.header_capacity);
        parser.subscribe_all = config.subscribe_all;
        parser.subscribed = config
            .subscribe
            .iter()
            .map(|name| name.as_bytes().to_vec())
            .collect();
        parser.body_config = config.body_config();
        parser
    }

    /// Capture every header (`true`, the default) or only subscribed ones.
    pub fn subscribe_all_headers(&mut self, all: bool) {
        self.subscribe_all = all;
    }

    /// Add `name` to the allow-set used when not capturing every header.
    ///
    /// Matching during the scan is byte-exact, so subscribe the casing the
    /// peer sends.
    pub fn subscribe_header(&mut self, name: impl AsRef<[u8]>) {
        self.subscribed.push(name.as_ref().to_vec());
    }

    /// Returns true if a header with this exact name would be stored.
    #[must_use]
    pub fn accepts(&self, name: &[u8]) -> bool {
        if self.subscribe_all {
            return true;
        }
        self.subscribed
            .iter()
            .any(|sub| sub.first() == name.first() && sub.as_slice() == name)
    }

    /// Parse a request head from `input`.
    ///
    /// Returns the offset immediately after the blank line ending the
    /// headers, which is where the body begins.
    ///
    /// # Errors
    ///
    /// - [`ParseError::MissingData`] if `input` ends before the head does.
    /// - [`ParseError::BadProtocol`] on a CR not followed by LF.
    /// - [`ParseError::BadProtocol`] on a header line that ends before its
    ///   `:`. This is stricter than plain CR/LF sequencing: the line is
    ///   rejected outright instead of being scanned past in search of a
    ///   colon, which could only end in [`ParseError::MissingData`].
    pub fn parse(&mut self, input: &[u8]) -> Result<usize, ParseError> {
        self.begin_cycle();

        let line = scan_request_line(input).inspect_err(|err| {
            if err.is_retryable() {
                debug_parse!("request line incomplete after {} bytes", input.len());
            }
        })?;
        self.method = line.method;
        self.path = line.path;
        self.version = line.version;

        let offset = self.scan_headers(input, line.headers_start)?;
        self.body_offset = Some(offset);
        Ok(offset)
    }

    /// Parse `input` and return a view over the parsed head.
    ///
    /// # Errors
    ///
    /// Same as [`parse`](Self::parse).
    pub fn parse_head<'a>(&'a mut self, input: &'a [u8]) -> Result<RequestHead<'a>, ParseError> {
        let offset = self.parse(input)?;
        Ok(RequestHead::new(self, input, offset))
    }

    /// View the last successfully parsed head.
    ///
    /// `input` must be the buffer given to [`parse`](Self::parse), or a
    /// larger buffer with the same prefix. Returns `None` if the last parse
    /// did not complete.
    #[must_use]
    pub fn head<'a>(&'a self, input: &'a [u8]) -> Option<RequestHead<'a>> {
        let offset = self.body_offset?;
        debug_assert!(
            input.len() >= offset,
            "buffer shorter than the parsed head"
        );
        Some(RequestHead::new(self, input, offset))
    }

    /// Return the parser to its pooled state.
    ///
    /// Clears the derived Host and Content-Length caches and the header
    /// table. The table's backing storage is kept for the next request, and
    /// holds at least as many slots as the larger of the capacity hint and
    /// the subscription count (plus one for Content-Length).
    pub fn reset(&mut self) {
        self.begin_cycle();
        self.table.reset_to(self.table_floor());
        debug_table!("parser reset, {} slots retained", self.table.capacity());
    }

    /// Offset where the body begins, if the last parse completed.
    #[must_use]
    pub fn body_offset(&self) -> Option<usize> {
        self.body_offset
    }

    /// Number of headers stored by the last parse.
    #[must_use]
    pub fn header_count(&self) -> usize {
        self.table.len()
    }

    /// Current header table capacity.
    #[must_use]
    pub fn header_capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Body limits applied by [`RequestHead::body_reader`].
    #[must_use]
    pub fn body_config(&self) -> &BodyConfig {
        &self.body_config
    }

    pub(crate) fn method_span(&self) -> Span {
        self.method
    }

    pub(crate) fn path_span(&self) -> Span {
        self.path
    }

    pub(crate) fn version_span(&self) -> Span {
        self.version
    }

    pub(crate) fn table(&self) -> &HeaderTable {
        &self.table
    }

    pub(crate) fn cache(&self) -> &DerivedCache {
        &self.cache
    }

    fn table_floor(&self) -> usize {
        self.capacity_hint.max(self.subscribed.len() + 1)
    }

    fn begin_cycle(&mut self) {
        self.method = Span::default();
        self.path = Span::default();
        self.version = Span::default();
        self.table.clear();
        self.cache.clear();
        self.body_offset = None;
    }

    fn scan_headers(&mut self, input: &[u8], headers_start: usize) -> Result<usize, ParseError> {
        let total = input.len();
        let mut state = HeaderState::NextHeader;
        let mut start = headers_start;
        let mut name = Span::default();
        // Whether the header a continuation line would extend was stored.
        let mut last_stored = false;

        let mut i = headers_start;
        while i < total {
            let c = input[i];
            match state {
                HeaderState::NextHeader => match c {
                    b'\r' => state = HeaderState::NextHeaderNewline,
                    b'\n' => return Ok(i + 1),
                    b' ' | b'\t' => state = HeaderState::FoldStart,
                    _ => {
                        start = i;
                        state = HeaderState::HeaderName;
                    }
                },
                HeaderState::NextHeaderNewline => {
                    if c != b'\n' {
                        debug_parse!("CR without LF ending headers at offset {i}");
                        return Err(ParseError::BadProtocol("missing newline after headers"));
                    }
                    return Ok(i + 1);
                }
                HeaderState::HeaderName => match c {
                    b':' => {
                        name = Span::new(start, i);
                        state = HeaderState::HeaderValueSpace;
                    }
                    b'\r' | b'\n' => {
                        debug_parse!("header line without colon at offset {start}");
                        return Err(ParseError::BadProtocol("missing colon in header"));
                    }
                    _ => {}
                },
                HeaderState::HeaderValueSpace => {
                    if c != b' ' && c != b'\t' {
                        // Re-examine this byte as the first byte of the value.
                        start = i;
                        state = HeaderState::HeaderValue;
                        continue;
                    }
                }
                HeaderState::HeaderValue => {
                    let next = match c {
                        b'\r' => HeaderState::HeaderValueNewline,
                        b'\n' => HeaderState::NextHeader,
                        _ => {
                            i += 1;
                            continue;
                        }
                    };
                    last_stored = self.complete_header(input, name, Span::new(start, i));
                    state = next;
                }
                HeaderState::HeaderValueNewline => {
                    if c != b'\n' {
                        debug_parse!("CR without LF after header value at offset {i}");
                        return Err(ParseError::BadProtocol("missing newline after header"));
                    }
                    state = HeaderState::NextHeader;
                }
                HeaderState::FoldStart => {
                    if c != b' ' && c != b'\t' {
                        start = i;
                        state = HeaderState::FoldValue;
                        continue;
                    }
                }
                HeaderState::FoldValue => {
                    let next = match c {
                        b'\r' => HeaderState::HeaderValueNewline,
                        b'\n' => HeaderState::NextHeader,
                        _ => {
                            i += 1;
                            continue;
                        }
                    };
                    let continuation = &input[start..i];
                    if last_stored && !continuation.is_empty() {
                        self.table.fold_into_last(input, continuation);
                    } else if !last_stored {
                        debug_table!("dropped continuation line at offset {start}");
                    }
                    state = next;
                }
            }
            i += 1;
        }

        debug_parse!("headers incomplete after {total} bytes in state {state:?}");
        Err(ParseError::MissingData)
    }

    /// Classify a finished header line. Returns true if it was stored.
    fn complete_header(&mut self, input: &[u8], name: Span, value: Span) -> bool {
        let name_bytes = name.resolve(input);

        if name_bytes.first() == Some(&b'C') && name_bytes == CONTENT_LENGTH {
            let parsed = parse_content_length(value.resolve(input));
            self.cache.record_content_length(parsed);
            self.table.push(Entry::new(name, value));
            return true;
        }

        // Body framing must be known even when the header is not stored.
        if matches!(name_bytes.first(), Some(b'T' | b't'))
            && name_bytes.eq_ignore_ascii_case(TRANSFER_ENCODING)
        {
            self.cache.record_transfer_encoding(value.resolve(input));
        }

        if self.accepts(name_bytes) {
            self.table.push(Entry::new(name, value));
            return true;
        }

        debug_table!(
            "dropped unsubscribed header {:?}",
            String::from_utf8_lossy(name_bytes)
        );
        false
    }
}

impl Default for HttpParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a Content-Length value as a base-10 unsigned integer.
pub(crate) fn parse_content_length(value: &[u8]) -> Option<u64> {
    std::str::from_utf8(value).ok()?.parse().ok()
}
