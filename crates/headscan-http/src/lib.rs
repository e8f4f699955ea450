//! Zero-copy HTTP/1.x request head parser.
//!
//! This crate parses the request line and header block of an HTTP/1.x
//! request in a single forward pass over a caller-owned buffer. It is meant
//! to sit inside a server's connection loop: it never performs I/O, never
//! blocks, and allocates only when header folding forces it or the header
//! table grows.
//!
//! # Features
//!
//! - Zero-copy request line and header parsing
//! - Header subscription: store every header, or only an allow-set
//! - Memoized Host and Content-Length lookups
//! - Reusable parsers with amortized zero-allocation reset
//! - Content-Length bounded body hand-off to any `std::io::Read`
//!
//! # Example
//!
//! ```
//! use headscan_http::{HttpParser, ParseError};
//!
//! let mut parser = HttpParser::new();
//! let mut buffer = b"GET /x HTTP/1.1\r\nHost: a.".to_vec();
//!
//! // Not a full head yet: read more and parse the whole buffer again.
//! assert_eq!(parser.parse(&buffer), Err(ParseError::MissingData));
//!
//! buffer.extend_from_slice(b"com\r\n\r\n");
//! let head = parser.parse_head(&buffer).unwrap();
//! assert_eq!(head.path(), b"/x");
//! assert_eq!(head.host(), Some(&b"a.com"[..]));
//! assert_eq!(head.content_length(), None);
//! ```

#![deny(unsafe_code)]

#[macro_use]
pub mod debug;

pub mod body;
mod config;
mod head;
mod parser;
mod pool;
mod table;

pub use body::{BodyConfig, BodyError, BodyReader, DEFAULT_MAX_BODY_SIZE, validate_content_length};
pub use config::{ConfigError, ParserConfig};
pub use head::{Header, Headers, RequestHead};
pub use parser::{DEFAULT_HEADER_CAPACITY, HttpParser, OPTIMAL_BUFFER_SIZE, ParseError};
pub use pool::{DEFAULT_MAX_IDLE, ParserPool, PooledParser};
pub use table::{HEADER_GROWTH, Span};
