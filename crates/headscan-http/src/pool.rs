//! Pool of reusable parsers.
//!
//! A server that does not keep one parser per connection can share a
//! [`ParserPool`] instead. Each [`acquire`](ParserPool::acquire) hands out a
//! parser exclusively; dropping the guard resets it and returns it to the
//! pool, keeping its header storage for the next request.
//!
//! ```
//! use headscan_http::{ParserConfig, ParserPool};
//!
//! let pool = ParserPool::new(ParserConfig::default());
//! {
//!     let mut parser = pool.acquire();
//!     let head = parser.parse_head(b"GET / HTTP/1.1\r\nHost: a\r\n\r\n").unwrap();
//!     assert_eq!(head.host(), Some(&b"a"[..]));
//! }
//! assert_eq!(pool.idle_count(), 1);
//! ```

use std::ops::{Deref, DerefMut};

use parking_lot::Mutex;

use crate::config::ParserConfig;
use crate::parser::HttpParser;

/// Default number of idle parsers a pool keeps.
pub const DEFAULT_MAX_IDLE: usize = 64;

/// A free list of [`HttpParser`]s built from one configuration.
#[derive(Debug)]
pub struct ParserPool {
    config: ParserConfig,
    idle: Mutex<Vec<HttpParser>>,
    max_idle: usize,
}

impl ParserPool {
    /// Create an empty pool. Parsers are built lazily from `config`.
    #[must_use]
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            idle: Mutex::new(Vec::new()),
            max_idle: DEFAULT_MAX_IDLE,
        }
    }

    /// Set how many idle parsers are kept; extras are dropped on release.
    #[must_use]
    pub fn with_max_idle(mut self, max_idle: usize) -> Self {
        self.max_idle = max_idle;
        self
    }

    /// Take a parser from the pool, building a new one if none is idle.
    pub fn acquire(&self) -> PooledParser<'_> {
        let parser = self.idle.lock().pop().unwrap_or_else(|| {
            debug_pool!("pool empty, building parser");
            HttpParser::with_config(&self.config)
        });
        PooledParser {
            pool: self,
            parser: Some(parser),
        }
    }

    /// Number of parsers waiting in the pool.
    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    /// The configuration new parsers are built from.
    #[must_use]
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    fn release(&self, mut parser: HttpParser) {
        parser.reset();
        let mut idle = self.idle.lock();
        if idle.len() < self.max_idle {
            idle.push(parser);
        } else {
            debug_pool!("pool full ({} idle), dropping parser", idle.len());
        }
    }
}

impl Default for ParserPool {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

/// A parser on loan from a [`ParserPool`].
///
/// Derefs to [`HttpParser`]. Reset and returned to the pool on drop.
#[derive(Debug)]
pub struct PooledParser<'p> {
    pool: &'p ParserPool,
    parser: Option<HttpParser>,
}

impl Deref for PooledParser<'_> {
    type Target = HttpParser;

    fn deref(&self) -> &HttpParser {
        self.parser.as_ref().expect("parser present until drop")
    }
}

impl DerefMut for PooledParser<'_> {
    fn deref_mut(&mut self) -> &mut HttpParser {
        self.parser.as_mut().expect("parser present until drop")
    }
}

impl Drop for PooledParser<'_> {
    fn drop(&mut self) {
        if let Some(parser) = self.parser.take() {
            self.pool.release(parser);
        }
    }
}
