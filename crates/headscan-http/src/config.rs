//! Parser configuration.
//!
//! A [`ParserConfig`] can be built in code or loaded from JSON:
//!
//! ```
//! use headscan_http::{HttpParser, ParserConfig};
//!
//! let config = ParserConfig::from_json(
//!     r#"{ "header_capacity": 8, "subscribe_all": false, "subscribe": ["Host", "Cookie"] }"#,
//! )
//! .unwrap();
//!
//! let parser = HttpParser::with_config(&config);
//! assert!(parser.accepts(b"Cookie"));
//! assert!(!parser.accepts(b"Accept"));
//! ```

use serde::Deserialize;

use crate::body::{BodyConfig, DEFAULT_MAX_BODY_SIZE};
use crate::parser::DEFAULT_HEADER_CAPACITY;

/// Error loading a [`ParserConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// The document is not valid JSON for this configuration.
    Json(serde_json::Error),
    /// A field holds a value the parser cannot use.
    Invalid(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(e) => write!(f, "invalid parser config: {e}"),
            Self::Invalid(detail) => write!(f, "invalid parser config: {detail}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(e) => Some(e),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Construction-time settings for [`HttpParser`](crate::HttpParser).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserConfig {
    /// Header slots allocated up front.
    pub header_capacity: usize,
    /// Store every header (`true`) or only those in `subscribe`.
    pub subscribe_all: bool,
    /// Header names stored when `subscribe_all` is false. Matched byte-exact.
    pub subscribe: Vec<String>,
    /// Largest Content-Length a body reader accepts.
    pub max_body_size: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            header_capacity: DEFAULT_HEADER_CAPACITY,
            subscribe_all: true,
            subscribe: Vec::new(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

impl ParserConfig {
    /// Creates a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of header slots allocated up front.
    #[must_use]
    pub fn header_capacity(mut self, capacity: usize) -> Self {
        self.header_capacity = capacity;
        self
    }

    /// Sets whether every header is stored.
    #[must_use]
    pub fn subscribe_all(mut self, all: bool) -> Self {
        self.subscribe_all = all;
        self
    }

    /// Adds a header name to the allow-set.
    #[must_use]
    pub fn subscribe(mut self, name: impl Into<String>) -> Self {
        self.subscribe.push(name.into());
        self
    }

    /// Sets the largest body a body reader accepts.
    #[must_use]
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the parser cannot use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.header_capacity == 0 {
            return Err(ConfigError::Invalid("header_capacity must be at least 1"));
        }
        if self.subscribe.iter().any(String::is_empty) {
            return Err(ConfigError::Invalid("subscribed header names must not be empty"));
        }
        Ok(())
    }

    pub(crate) fn body_config(&self) -> BodyConfig {
        BodyConfig::new().with_max_size(self.max_body_size)
    }
}
