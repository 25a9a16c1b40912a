// src/error.rs

//! Unified error handling for the publisher.

use std::fmt;

use thiserror::Error;

/// Result type alias for publisher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// XML reading failed
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Service-account token signing failed
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Scheduled descriptor rejected at the boundary
    #[error("Descriptor {file}: {source}")]
    Descriptor {
        file: String,
        #[source]
        source: DescriptorError,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Sitemap document is unusable
    #[error("Sitemap error: {0}")]
    Sitemap(String),

    /// Credential loading or token exchange failed
    #[error("Auth error: {0}")]
    Auth(String),

    /// An indexing endpoint answered with a failure
    #[error("Indexing error for {channel}: {message}")]
    Indexing { channel: String, message: String },

    /// Another run holds the lock
    #[error("Run lock held: {0}")]
    Locked(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a sitemap error.
    pub fn sitemap(message: impl Into<String>) -> Self {
        Self::Sitemap(message.into())
    }

    /// Create an auth error.
    pub fn auth(message: impl fmt::Display) -> Self {
        Self::Auth(message.to_string())
    }

    /// Create an indexing error with the channel it came from.
    pub fn indexing(channel: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Indexing {
            channel: channel.into(),
            message: message.to_string(),
        }
    }

    /// Wrap a descriptor validation failure with the file it came from.
    pub fn descriptor(file: impl Into<String>, source: DescriptorError) -> Self {
        Self::Descriptor {
            file: file.into(),
            source,
        }
    }
}

/// Why a scheduled descriptor could not be accepted.
#[derive(Error, Debug)]
pub enum DescriptorError {
    /// Not valid JSON, or a field has the wrong type
    #[error("malformed JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A required field is absent or blank
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// `articleFile` is not a plain file name
    #[error("invalid articleFile {0:?}")]
    InvalidArticleFile(String),
}
