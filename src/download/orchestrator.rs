//! Download orchestration: engine configuration, offloading, and result
//! normalisation.
//!
//! `download` never fails. Every problem becomes a `DownloadOutcome::Failure`
//! so the caller can always render a reply.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::core::config;
use crate::download::engine::{
    remove_files_by_token, EngineError, EngineOutput, EngineRequest, ExtractionEngine, RobustnessOptions,
};
use crate::download::outcome::{DownloadFailure, DownloadOutcome, DownloadRequest, DownloadedFile, DownloadedMedia};
use crate::download::quality;

/// Title used when the engine reports none
pub const DEFAULT_TITLE: &str = "Untitled";

type EngineResult = Result<EngineOutput, EngineError>;

/// Runs downloads through an extraction engine.
pub struct DownloadOrchestrator {
    engine: Arc<dyn ExtractionEngine>,
    work_dir: PathBuf,
    timeout: Duration,
    process_timeout: Duration,
    options: RobustnessOptions,
    cookies_file: Option<PathBuf>,
    user_agent: Option<String>,
}

impl DownloadOrchestrator {
    /// Creates an orchestrator with an explicit working directory and wait.
    /// Engine-side settings (robustness, cookies, user agent) start at
    /// their defaults.
    pub fn new(engine: Arc<dyn ExtractionEngine>, work_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            engine,
            work_dir: work_dir.into(),
            timeout,
            process_timeout: timeout,
            options: RobustnessOptions::default(),
            cookies_file: None,
            user_agent: None,
        }
    }

    /// Creates an orchestrator from environment configuration.
    pub fn from_config(engine: Arc<dyn ExtractionEngine>) -> Self {
        let mut orchestrator = Self::new(engine, config::DOWNLOAD_FOLDER.as_str(), config::download::timeout());
        orchestrator.process_timeout = config::download::process_timeout();
        orchestrator.cookies_file = config::YTDL_COOKIES_FILE
            .as_deref()
            .map(|path| PathBuf::from(shellexpand::tilde(path).into_owned()));
        orchestrator.user_agent = config::YTDL_USER_AGENT.clone();
        orchestrator
    }

    pub fn with_cookies_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cookies_file = Some(path.into());
        self
    }

    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Engine configuration for a request, with a fresh per-request token.
    pub fn engine_request(&self, request: &DownloadRequest) -> EngineRequest {
        let spec = quality::resolve(request.tier);
        let token = Uuid::new_v4().simple().to_string();

        EngineRequest {
            url: request.url.to_string(),
            format_expression: spec.expression,
            output_template: format!("%(id)s_{}.%(ext)s", token),
            work_dir: self.work_dir.clone(),
            token,
            merge_container: config::download::CONTAINER_EXTENSION.to_string(),
            options: self.options.clone(),
            cookies_file: self.cookies_file.clone(),
            user_agent: self.user_agent.clone(),
            process_timeout: self.process_timeout.min(self.timeout),
        }
    }

    /// Downloads the requested media.
    pub async fn download(&self, request: &DownloadRequest) -> DownloadOutcome {
        if let Err(e) = fs_err::tokio::create_dir_all(&self.work_dir).await {
            log::error!("Cannot prepare download folder: {}", e);
            return DownloadOutcome::Failure(DownloadFailure::generic(format!(
                "Cannot prepare download folder: {}",
                e
            )));
        }

        let engine_request = self.engine_request(request);
        log::info!(
            "Dispatching download of {} at {} (token {})",
            request.url,
            request.tier,
            engine_request.token
        );

        let token = engine_request.token.clone();
        let engine = Arc::clone(&self.engine);
        let mut handle: JoinHandle<EngineResult> =
            tokio::task::spawn_blocking(move || engine.extract(&engine_request));

        let joined = match tokio::time::timeout(self.timeout, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                log::error!(
                    "Download of {} timed out after {}s",
                    request.url,
                    self.timeout.as_secs()
                );
                reap_late_result(handle, self.work_dir.clone(), token);
                return DownloadOutcome::Failure(DownloadFailure::timed_out(self.timeout.as_secs()));
            }
        };

        let output = match joined {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                let failure = DownloadFailure::from_engine_message(e.message);
                log::log!(
                    failure.category.log_level(),
                    "Download of {} failed ({:?}): {}",
                    request.url,
                    failure.category,
                    failure.raw_message
                );
                remove_files_by_token(&self.work_dir, &token);
                return DownloadOutcome::Failure(failure);
            }
            Err(e) => {
                log::error!("Download worker for {} did not complete: {}", request.url, e);
                remove_files_by_token(&self.work_dir, &token);
                return DownloadOutcome::Failure(DownloadFailure::generic(format!("Download worker failed: {}", e)));
            }
        };

        // The guard owns the file from here, every early return deletes it
        let file = DownloadedFile::new(output.file_path);
        let file = match ensure_container_extension(file).await {
            Ok(file) => file,
            Err(e) => {
                log::error!("Failed to normalise extension for {}: {}", request.url, e);
                remove_files_by_token(&self.work_dir, &token);
                return DownloadOutcome::Failure(DownloadFailure::generic(format!(
                    "Failed to prepare downloaded file: {}",
                    e
                )));
            }
        };

        let title = output
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        log::info!("Downloaded {} -> {}", request.url, file.path().display());
        DownloadOutcome::Success(DownloadedMedia {
            file,
            title,
            duration_secs: output.duration_secs.unwrap_or(0),
            thumbnail: output.thumbnail,
        })
    }
}

/// Awaits a worker that outlived its wait and deletes whatever it produced,
/// finished or not.
fn reap_late_result(handle: JoinHandle<EngineResult>, work_dir: PathBuf, token: String) {
    tokio::spawn(async move {
        match handle.await {
            Ok(Ok(output)) => {
                log::warn!(
                    "Late download result after timeout, removing {}",
                    output.file_path.display()
                );
                drop(DownloadedFile::new(output.file_path));
            }
            Ok(Err(e)) => log::warn!("Late download failure after timeout: {}", e),
            Err(e) => log::warn!("Late download worker did not complete: {}", e),
        }
        remove_files_by_token(&work_dir, &token);
    });
}

/// Renames the file to the canonical container extension when the engine
/// produced something else. On failure the guard deletes the original.
async fn ensure_container_extension(file: DownloadedFile) -> std::io::Result<DownloadedFile> {
    let wanted = config::download::CONTAINER_EXTENSION;
    let has_wanted = file
        .path()
        .extension()
        .map(|ext| ext == wanted)
        .unwrap_or(false);
    if has_wanted {
        return Ok(file);
    }

    let target = file.path().with_extension(wanted);
    fs_err::tokio::rename(file.path(), &target).await?;
    log::debug!("Renamed {} to {}", file.path().display(), target.display());

    // The old path no longer exists, dropping its guard is a no-op
    drop(file);
    Ok(DownloadedFile::new(target))
}
