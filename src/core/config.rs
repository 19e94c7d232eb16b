use once_cell::sync::Lazy;
use secrecy::SecretString;
use std::env;
use std::time::Duration;

use crate::core::error::AppError;

/// Configuration constants for the bot
/// Cached yt-dlp binary path
/// Read once at startup from YTDL_BIN environment variable or defaults to "yt-dlp"
pub static YTDL_BIN: Lazy<String> = Lazy::new(|| env::var("YTDL_BIN").unwrap_or_else(|_| "yt-dlp".to_string()));

/// Path to cookies file passed to yt-dlp for sites that require a login
/// Read from YTDL_COOKIES_FILE environment variable
/// Example: youtube_cookies.txt
pub static YTDL_COOKIES_FILE: Lazy<Option<String>> = Lazy::new(|| non_empty_var("YTDL_COOKIES_FILE"));

/// User agent override for yt-dlp requests
/// Read from YTDL_USER_AGENT environment variable
pub static YTDL_USER_AGENT: Lazy<Option<String>> = Lazy::new(|| non_empty_var("YTDL_USER_AGENT"));

/// Download folder path
/// Read from DOWNLOAD_FOLDER environment variable
/// Defaults to ~/downloads/grabbot, supports tilde (~) expansion
pub static DOWNLOAD_FOLDER: Lazy<String> = Lazy::new(|| {
    let raw = env::var("DOWNLOAD_FOLDER").unwrap_or_else(|_| "~/downloads/grabbot".to_string());
    shellexpand::tilde(&raw).into_owned()
});

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: grabbot.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "grabbot.log".to_string()));

/// Environment variables checked for the bot token, in priority order
pub const BOT_TOKEN_VARS: &[&str] = &["BOT_TOKEN", "TELOXIDE_TOKEN", "TOKEN"];

/// Reads the bot token from the environment.
///
/// Called once at startup. A missing or blank token is fatal: the caller
/// must stop before any update is processed.
pub fn bot_token() -> Result<SecretString, AppError> {
    BOT_TOKEN_VARS
        .iter()
        .find_map(|name| non_empty_var(name))
        .map(SecretString::from)
        .ok_or_else(|| {
            AppError::Config(format!(
                "no bot token found, set one of: {}",
                BOT_TOKEN_VARS.join(", ")
            ))
        })
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Download configuration
pub mod download {
    use super::Duration;
    use once_cell::sync::Lazy;
    use std::env;

    /// Default bounded wait for one offloaded download (in seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 600; // 10 minutes

    /// Bounded wait for one offloaded download
    /// Read from DOWNLOAD_TIMEOUT_SECS environment variable
    pub static TIMEOUT_SECS: Lazy<u64> = Lazy::new(|| {
        env::var("DOWNLOAD_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
    });

    /// Container every delivered file ends up in
    pub const CONTAINER_EXTENSION: &str = "mp4";

    /// Number of retries yt-dlp performs for the main request
    pub const RETRIES: u32 = 10;

    /// Number of retries yt-dlp performs per fragment
    pub const FRAGMENT_RETRIES: u32 = 10;

    /// Socket timeout handed to yt-dlp (in seconds)
    pub const SOCKET_TIMEOUT_SECS: u64 = 30;

    /// Bounded wait for the offloaded download
    pub fn timeout() -> Duration {
        Duration::from_secs(*TIMEOUT_SECS)
    }

    /// yt-dlp kills itself a little before the orchestrator gives up,
    /// so the child process is reaped by the engine rather than leaked
    pub fn process_timeout() -> Duration {
        let outer = timeout();
        outer.saturating_sub(Duration::from_secs(5)).max(Duration::from_secs(1))
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for HTTP requests (in seconds)
    /// Large enough for video uploads through a local Bot API server
    pub const REQUEST_TIMEOUT_SECS: u64 = 900; // 15 minutes

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Validation configuration
pub mod validation {
    /// Maximum URL length (RFC 7230 recommends 8000, but we use 2048 for safety)
    pub const MAX_URL_LENGTH: usize = 2048;

    /// Standard Telegram Bot API upload limit (50 MB)
    pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

    /// Local Bot API server upload limit (2 GB)
    pub const MAX_LOCAL_UPLOAD_BYTES: u64 = 2000 * 1024 * 1024;

    /// Maximum file size that can be sent to the user.
    ///
    /// A local Bot API server (BOT_API_URL not pointing to api.telegram.org)
    /// accepts much larger files than the public endpoint.
    pub fn max_upload_bytes() -> u64 {
        if super::bot_api::is_local() {
            MAX_LOCAL_UPLOAD_BYTES
        } else {
            MAX_UPLOAD_BYTES
        }
    }
}

/// Bot API server configuration utilities
pub mod bot_api {
    /// Returns the BOT_API_URL environment variable if set.
    pub fn get_url() -> Option<String> {
        std::env::var("BOT_API_URL").ok().filter(|url| !url.trim().is_empty())
    }

    /// Returns true if using a local Bot API server (not api.telegram.org).
    pub fn is_local() -> bool {
        get_url().map(|url| is_local_url(&url)).unwrap_or(false)
    }

    /// Checks if the given URL string points to a local Bot API server.
    pub fn is_local_url(url: &str) -> bool {
        !url.contains("api.telegram.org")
    }
}
