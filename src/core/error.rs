use thiserror::Error;

/// Centralized error types for the application
///
/// Per-request failures never reach this type: downloads end in a
/// `DownloadOutcome` and transfers in a `DeliveryStatus`. `AppError` covers
/// startup and plumbing failures that the binary reports before exiting.
///
/// # Example
///
/// ```no_run
/// use grabbot::core::error::AppError;
///
/// fn handle_error(err: AppError) {
///     eprintln!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or malformed startup configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Telegram API errors
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
