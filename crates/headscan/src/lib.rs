//! Zero-copy HTTP/1.x request head parsing for server connection loops.
//!
//! headscan splits an HTTP/1.x request head into its request line and
//! headers in a single forward pass, without copying:
//!
//! - **Zero-copy** - method, path, version and header values are views into
//!   the caller's read buffer
//! - **Retry on short reads** - an incomplete head reports
//!   [`ParseError::MissingData`] so the caller can read more and parse again
//! - **Header subscription** - store every header or only an allow-set
//! - **Reusable** - one parser per connection, or a shared [`ParserPool`]
//!
//! # Quick Start
//!
//! ```
//! use headscan::prelude::*;
//!
//! let buffer = b"POST /items HTTP/1.1\r\nHost: example.com\r\nContent-Length: 2\r\n\r\nok";
//! let mut parser = HttpParser::new();
//! let head = parser.parse_head(buffer).unwrap();
//!
//! assert!(head.is_post());
//! assert_eq!(head.host(), Some(&b"example.com"[..]));
//!
//! let mut body = head.body_reader(head.rest(), std::io::empty()).unwrap();
//! assert_eq!(body.read_all().unwrap(), b"ok");
//! ```
//!
//! # Crate Structure
//!
//! - [`headscan_http`] - the parser, header views, body reader and pool

#![forbid(unsafe_code)]

pub use headscan_http as http;

pub use headscan_http::{
    BodyConfig, BodyError, BodyReader, ConfigError, DEFAULT_HEADER_CAPACITY, Header, Headers,
    HttpParser, OPTIMAL_BUFFER_SIZE, ParseError, ParserConfig, ParserPool, PooledParser,
    RequestHead,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        BodyError, Header, HttpParser, OPTIMAL_BUFFER_SIZE, ParseError, ParserConfig, ParserPool,
        RequestHead,
    };
}

/// Debug logging controls.
pub mod debug {
    pub use headscan_http::debug::{disable_debug, enable_debug, is_debug_enabled};
}
