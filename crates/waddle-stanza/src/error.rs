//! Error types for stanza parsing and endpoint configuration.

use std::str::Utf8Error;

use quick_xml::events::attributes::AttrError;
use thiserror::Error;

/// Failure to turn a byte buffer into a stanza descriptor.
///
/// This is the only hard failure of the parser. A failed parse never yields a
/// partial descriptor; callers discard the input and re-parse fresh data.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The tokenizer rejected the input (unterminated or mismatched tags, etc.)
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// An attribute inside a start tag was malformed
    #[error("XML attribute error: {0}")]
    Attribute(#[from] AttrError),

    /// Element name or character data was not valid UTF-8
    #[error("Encoding error: {0}")]
    Encoding(#[from] Utf8Error),

    /// Input ended before the root element was closed
    #[error("Incomplete stanza: input ended inside <{0}>")]
    Incomplete(String),

    /// Non-whitespace character data preceded the root element
    #[error("Character data before the root element")]
    TextOutsideRoot,

    /// Input contained no element at all
    #[error("No root element found")]
    NoRootElement,
}

/// Server configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the configuration file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for a server entry
    #[error("Invalid server configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// The server entry has an empty host
    #[error("Server configuration is missing a host")]
    MissingHost,
}
