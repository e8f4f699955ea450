//! Borrowed view over a parsed request head.
//!
//! [`RequestHead`] pairs a parser with the buffer it parsed and resolves the
//! stored spans into byte slices. Host and Content-Length are derived lazily
//! and memoized in the parser until the next cycle begins.

use std::cell::Cell;
use std::io::Read;

use crate::body::{BodyError, BodyReader};
use crate::parser::{CONTENT_LENGTH, HttpParser, parse_content_length};
use crate::table::Entry;

const HOST: &[u8] = b"Host";

/// Memoized Host and Content-Length lookups, plus body framing seen during
/// the scan.
///
/// Each lookup is a freshness flag plus a value. Only a new parse cycle or
/// [`HttpParser::reset`] clears them.
#[derive(Debug, Default)]
pub(crate) struct DerivedCache {
    host_read: Cell<bool>,
    host: Cell<Option<usize>>,
    content_length_read: Cell<bool>,
    content_length: Cell<Option<u64>>,
    transfer_coded: Cell<bool>,
}

impl DerivedCache {
    pub(crate) fn clear(&self) {
        self.host_read.set(false);
        self.host.set(None);
        self.content_length_read.set(false);
        self.content_length.set(None);
        self.transfer_coded.set(false);
    }

    /// Record a Content-Length seen during the scan.
    ///
    /// A value that failed to parse leaves any earlier value in place but
    /// still marks the field as read.
    pub(crate) fn record_content_length(&self, value: Option<u64>) {
        if value.is_some() {
            self.content_length.set(value);
        }
        self.content_length_read.set(true);
    }

    pub(crate) fn content_length_read(&self) -> bool {
        self.content_length_read.get()
    }

    /// Record a Transfer-Encoding value. Anything but `identity` marks the
    /// body as transfer-coded for the rest of the cycle.
    pub(crate) fn record_transfer_encoding(&self, value: &[u8]) {
        if !value.trim_ascii().eq_ignore_ascii_case(b"identity") {
            self.transfer_coded.set(true);
        }
    }

    pub(crate) fn transfer_coded(&self) -> bool {
        self.transfer_coded.get()
    }
}

// ============================================================================
// Header View
// ============================================================================

/// A single stored header.
///
/// The name always aliases the parsed buffer. The value does too, unless it
/// was rebuilt by folding continuation lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header<'a> {
    name: &'a [u8],
    value: &'a [u8],
    folded: bool,
}

impl<'a> Header<'a> {
    /// Returns the header name, case preserved.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'a [u8] {
        self.name
    }

    /// Returns the header value.
    #[inline]
    #[must_use]
    pub fn value(&self) -> &'a [u8] {
        self.value
    }

    /// Returns the header name as a string, if valid UTF-8.
    #[must_use]
    pub fn name_str(&self) -> Option<&'a str> {
        std::str::from_utf8(self.name).ok()
    }

    /// Returns the header value as a string, if valid UTF-8.
    #[must_use]
    pub fn value_str(&self) -> Option<&'a str> {
        std::str::from_utf8(self.value).ok()
    }

    /// Returns the header as a raw `(name, value)` pair.
    #[inline]
    #[must_use]
    pub fn as_bytes_pair(&self) -> (&'a [u8], &'a [u8]) {
        (self.name, self.value)
    }

    /// Returns true if this header name matches (ASCII case-insensitive).
    #[must_use]
    pub fn name_eq_ignore_case(&self, other: impl AsRef<[u8]>) -> bool {
        self.name.eq_ignore_ascii_case(other.as_ref())
    }

    /// Returns true if the value was joined from continuation lines.
    #[inline]
    #[must_use]
    pub fn is_folded(&self) -> bool {
        self.folded
    }
}

/// Iterator over stored headers in document order.
#[derive(Debug, Clone)]
pub struct Headers<'a> {
    entries: std::slice::Iter<'a, Entry>,
    input: &'a [u8],
}

impl<'a> Iterator for Headers<'a> {
    type Item = Header<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.next()?;
        Some(Header {
            name: entry.name(self.input),
            value: entry.value(self.input),
            folded: entry.is_folded(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl ExactSizeIterator for Headers<'_> {}

// ============================================================================
// Request Head
// ============================================================================

/// A parsed request head: the parser's spans resolved against its buffer.
///
/// Obtained from [`HttpParser::parse_head`] or [`HttpParser::head`]. Every
/// slice it returns lives as long as both the parser borrow and the buffer.
#[derive(Debug, Clone, Copy)]
pub struct RequestHead<'a> {
    parser: &'a HttpParser,
    input: &'a [u8],
    body_offset: usize,
}

impl<'a> RequestHead<'a> {
    pub(crate) fn new(parser: &'a HttpParser, input: &'a [u8], body_offset: usize) -> Self {
        Self {
            parser,
            input,
            body_offset,
        }
    }

    /// Returns the request method, e.g. `GET`.
    #[inline]
    #[must_use]
    pub fn method(&self) -> &'a [u8] {
        self.parser.method_span().resolve(self.input)
    }

    /// Returns the request target exactly as sent, query string included.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &'a [u8] {
        self.parser.path_span().resolve(self.input)
    }

    /// Returns the protocol version, e.g. `HTTP/1.1`.
    #[inline]
    #[must_use]
    pub fn version(&self) -> &'a [u8] {
        self.parser.version_span().resolve(self.input)
    }

    /// Offset in the buffer where the body begins.
    #[inline]
    #[must_use]
    pub fn body_offset(&self) -> usize {
        self.body_offset
    }

    /// Bytes already read past the head.
    #[must_use]
    pub fn rest(&self) -> &'a [u8] {
        self.input.get(self.body_offset..).unwrap_or(&[])
    }

    /// Iterate over stored headers in document order.
    #[must_use]
    pub fn headers(&self) -> Headers<'a> {
        Headers {
            entries: self.parser.table().iter(),
            input: self.input,
        }
    }

    /// Number of stored headers.
    #[must_use]
    pub fn header_count(&self) -> usize {
        self.parser.table().len()
    }

    /// Value of the first header named `name`.
    ///
    /// Tries an exact byte match first, then falls back to an ASCII
    /// case-insensitive match.
    #[must_use]
    pub fn find_header(&self, name: impl AsRef<[u8]>) -> Option<&'a [u8]> {
        let table = self.parser.table();
        let index = table.find_index(self.input, name.as_ref())?;
        self.value_at(index)
    }

    /// Values of every header named `name` (ASCII case-insensitive), in
    /// document order.
    #[must_use]
    pub fn find_all_headers(&self, name: impl AsRef<[u8]>) -> Vec<&'a [u8]> {
        let name = name.as_ref();
        self.headers()
            .filter(|header| header.name_eq_ignore_case(name))
            .map(|header| header.value)
            .collect()
    }

    /// Value of the Host header, looked up once per cycle.
    #[must_use]
    pub fn host(&self) -> Option<&'a [u8]> {
        let cache = self.parser.cache();
        if !cache.host_read.get() {
            cache
                .host
                .set(self.parser.table().find_index(self.input, HOST));
            cache.host_read.set(true);
        }
        self.value_at(cache.host.get()?)
    }

    /// Declared body length, or `None` if the header is absent or invalid.
    ///
    /// A canonical `Content-Length` header is recognized during the scan;
    /// other casings are looked up here on first call. Either way the value
    /// is parsed at most once per cycle.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        let cache = self.parser.cache();
        if !cache.content_length_read.get() {
            let parsed = self
                .find_header(CONTENT_LENGTH)
                .and_then(parse_content_length);
            cache.record_content_length(parsed);
        }
        cache.content_length.get()
    }

    /// Returns true if the method is exactly `GET`.
    #[must_use]
    pub fn is_get(&self) -> bool {
        self.method() == b"GET"
    }

    /// Returns true if the method is exactly `POST`.
    #[must_use]
    pub fn is_post(&self) -> bool {
        self.method() == b"POST"
    }

    /// Returns true if the method is exactly `PUT`.
    #[must_use]
    pub fn is_put(&self) -> bool {
        self.method() == b"PUT"
    }

    /// Returns true if the method is `POST` or `PUT`.
    #[must_use]
    pub fn is_post_or_put(&self) -> bool {
        self.is_post() || self.is_put()
    }

    /// Build a reader for the request body.
    ///
    /// The reader yields `rest` (bytes already read past the head) first, then
    /// pulls from `source`, stopping at the declared Content-Length. With no
    /// usable Content-Length the body is empty.
    ///
    /// # Errors
    ///
    /// - [`BodyError::Unsupported`] if any `Transfer-Encoding` header names a
    ///   coding other than `identity`. This holds whether or not the header
    ///   was subscribed and stored.
    /// - [`BodyError::TooLarge`] if Content-Length exceeds the configured
    ///   limit.
    pub fn body_reader<'r, R: Read>(
        &self,
        rest: &'r [u8],
        source: R,
    ) -> Result<BodyReader<'r, R>, BodyError> {
        if self.parser.cache().transfer_coded() {
            debug_body!("refusing transfer-coded body");
            return Err(BodyError::Unsupported("transfer-encoding"));
        }
        BodyReader::new(
            rest,
            source,
            self.content_length(),
            self.parser.body_config(),
        )
    }

    fn value_at(&self, index: usize) -> Option<&'a [u8]> {
        self.parser
            .table()
            .get(index)
            .map(|entry| entry.value(self.input))
    }
}
