//! Request and outcome values that cross the orchestrator boundary.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use url::Url;

use crate::download::quality::QualityTier;
use crate::download::ytdlp_errors::{classify, ErrorCategory};

/// A download to perform. Only built from an already validated URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: Url,
    pub tier: QualityTier,
}

impl DownloadRequest {
    pub fn new(url: Url, tier: QualityTier) -> Self {
        Self { url, tier }
    }
}

/// Transient file on disk, deleted when the guard is dropped.
///
/// Whoever holds the guard owns the file. Deletion failures are logged and
/// otherwise ignored; a file that is already gone is not an error.
#[derive(Debug)]
pub struct DownloadedFile {
    path: PathBuf,
}

impl DownloadedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size on disk in bytes
    pub fn size(&self) -> std::io::Result<u64> {
        fs_err::metadata(&self.path).map(|m| m.len())
    }
}

impl Drop for DownloadedFile {
    fn drop(&mut self) {
        match fs_err::remove_file(&self.path) {
            Ok(()) => log::debug!("Removed transient file {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove transient file: {}", e),
        }
    }
}

/// Successful download, ready for delivery
#[derive(Debug)]
pub struct DownloadedMedia {
    pub file: DownloadedFile,
    pub title: String,
    pub duration_secs: u32,
    pub thumbnail: Option<String>,
}

/// Failed download with its classified category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadFailure {
    pub raw_message: String,
    pub category: ErrorCategory,
}

impl DownloadFailure {
    /// Failure reported by the engine; the category comes from its text.
    pub fn from_engine_message(raw_message: impl Into<String>) -> Self {
        let raw_message = raw_message.into();
        let category = classify(&raw_message);
        Self { raw_message, category }
    }

    /// Failure raised by the orchestrator itself. Always `Generic`, the
    /// text is ours and must not be keyword-matched.
    pub fn generic(raw_message: impl Into<String>) -> Self {
        Self {
            raw_message: raw_message.into(),
            category: ErrorCategory::Generic,
        }
    }

    pub fn timed_out(timeout_secs: u64) -> Self {
        Self::generic(format!("Download did not finish within {} seconds", timeout_secs))
    }
}

/// Terminal result of one download attempt
#[derive(Debug)]
pub enum DownloadOutcome {
    Success(DownloadedMedia),
    Failure(DownloadFailure),
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Success(_))
    }
}

/// Lifecycle of a single inbound request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Received,
    Validated,
    Dispatched,
    Succeeded,
    Failed,
}

impl RequestState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RequestState::Succeeded | RequestState::Failed)
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestState::Received => "received",
            RequestState::Validated => "validated",
            RequestState::Dispatched => "dispatched",
            RequestState::Succeeded => "succeeded",
            RequestState::Failed => "failed",
        };
        f.write_str(name)
    }
}
