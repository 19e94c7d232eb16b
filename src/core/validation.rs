//! URL validation for inbound messages
//!
//! Free text only turns into a download once it passes this gate:
//! - parses as an absolute URL
//! - HTTP/HTTPS scheme only
//! - has a host
//! - bounded length

use thiserror::Error;
use url::Url;

use crate::core::config;

/// Validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Text does not look like a URL at all
    #[error("not a URL: {0}")]
    NotAUrl(String),

    /// Parsed, but the scheme is not http/https
    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    /// Parsed, but there is no host to download from
    #[error("URL has no host")]
    MissingHost,

    /// Longer than `config::validation::MAX_URL_LENGTH`
    #[error("URL is too long ({0} characters)")]
    TooLong(usize),
}

/// Validates that `text` is a downloadable media URL.
///
/// Surrounding whitespace is ignored. Only the http and https schemes are
/// accepted, and the URL must name a host.
///
/// # Examples
/// ```
/// use grabbot::core::validation::validate_media_url;
///
/// assert!(validate_media_url("https://example.com/video").is_ok());
/// assert!(validate_media_url("  http://youtu.be/abc  ").is_ok());
/// assert!(validate_media_url("not a url").is_err());
/// assert!(validate_media_url("ftp://example.com/file").is_err());
/// ```
pub fn validate_media_url(text: &str) -> Result<Url, ValidationError> {
    let trimmed = text.trim();

    if trimmed.len() > config::validation::MAX_URL_LENGTH {
        return Err(ValidationError::TooLong(trimmed.len()));
    }

    let parsed = Url::parse(trimmed).map_err(|_| ValidationError::NotAUrl(trimmed.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(ValidationError::UnsupportedScheme(other.to_string())),
    }

    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(parsed),
        _ => Err(ValidationError::MissingHost),
    }
}
