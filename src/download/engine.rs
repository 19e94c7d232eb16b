//! Extraction engine seam and its yt-dlp implementation.
//!
//! The engine is a single synchronous, blocking call. The orchestrator
//! runs it on the blocking thread pool and bounds the wait.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use serde::Deserialize;
use thiserror::Error;

use crate::core::config;
use crate::core::utils::truncate_tail_utf8;

/// How much stderr is kept for error reporting
const STDERR_TAIL_BYTES: usize = 2048;

/// Robustness switches passed to every engine run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RobustnessOptions {
    pub no_check_certificate: bool,
    pub geo_bypass: bool,
    pub retries: u32,
    pub fragment_retries: u32,
    pub socket_timeout_secs: u64,
}

impl Default for RobustnessOptions {
    fn default() -> Self {
        Self {
            no_check_certificate: true,
            geo_bypass: true,
            retries: config::download::RETRIES,
            fragment_retries: config::download::FRAGMENT_RETRIES,
            socket_timeout_secs: config::download::SOCKET_TIMEOUT_SECS,
        }
    }
}

/// Everything the engine needs for one download
#[derive(Debug, Clone)]
pub struct EngineRequest {
    pub url: String,
    pub format_expression: String,
    /// Output template inside `work_dir`, e.g. `%(id)s_<token>.%(ext)s`
    pub output_template: String,
    pub work_dir: PathBuf,
    /// Unique per request, embedded in the output template
    pub token: String,
    pub merge_container: String,
    pub options: RobustnessOptions,
    pub cookies_file: Option<PathBuf>,
    pub user_agent: Option<String>,
    /// Hard limit for the engine process itself
    pub process_timeout: Duration,
}

/// What a successful engine run produced
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOutput {
    pub file_path: PathBuf,
    pub title: Option<String>,
    pub duration_secs: Option<u32>,
    pub thumbnail: Option<String>,
}

/// Engine failure, carrying the raw text used for classification
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct EngineError {
    pub message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A media extractor. Implementations block the calling thread.
pub trait ExtractionEngine: Send + Sync {
    fn extract(&self, request: &EngineRequest) -> Result<EngineOutput, EngineError>;
}

/// Info JSON printed by `--print after_move:%()j`
#[derive(Debug, Default, Deserialize)]
struct YtDlpInfo {
    title: Option<String>,
    duration: Option<f64>,
    thumbnail: Option<String>,
    filepath: Option<PathBuf>,
}

/// Engine backed by the `yt-dlp` binary
#[derive(Debug, Clone)]
pub struct YtDlpEngine {
    binary: String,
}

impl Default for YtDlpEngine {
    fn default() -> Self {
        Self::new(config::YTDL_BIN.as_str())
    }
}

impl YtDlpEngine {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }

    /// Builds the yt-dlp argument list for a request.
    pub fn build_args(request: &EngineRequest) -> Vec<String> {
        let output = request.work_dir.join(&request.output_template);
        let mut args = vec![
            "--no-playlist".to_string(),
            "--no-progress".to_string(),
            "--no-simulate".to_string(),
            "--print".to_string(),
            "after_move:%()j".to_string(),
            "-f".to_string(),
            request.format_expression.clone(),
            "--merge-output-format".to_string(),
            request.merge_container.clone(),
            "-o".to_string(),
            output.to_string_lossy().into_owned(),
        ];

        let opts = &request.options;
        if opts.no_check_certificate {
            args.push("--no-check-certificate".to_string());
        }
        if opts.geo_bypass {
            args.push("--geo-bypass".to_string());
        }
        args.extend([
            "--retries".to_string(),
            opts.retries.to_string(),
            "--fragment-retries".to_string(),
            opts.fragment_retries.to_string(),
            "--socket-timeout".to_string(),
            opts.socket_timeout_secs.to_string(),
        ]);

        if let Some(cookies) = &request.cookies_file {
            args.push("--cookies".to_string());
            args.push(cookies.to_string_lossy().into_owned());
        }
        if let Some(agent) = &request.user_agent {
            args.push("--user-agent".to_string());
            args.push(agent.clone());
        }

        // The URL goes last, after `--` so it is never read as an option
        args.push("--".to_string());
        args.push(request.url.clone());
        args
    }

    fn spawn(&self, request: &EngineRequest) -> Result<Child, EngineError> {
        let args = Self::build_args(request);
        log::debug!("Running {} {}", self.binary, args.join(" "));

        Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| EngineError::new(format!("Failed to start {}: {}", self.binary, e)))
    }
}

impl ExtractionEngine for YtDlpEngine {
    fn extract(&self, request: &EngineRequest) -> Result<EngineOutput, EngineError> {
        let child = self.spawn(request)?;
        let finished = wait_with_output_timeout(child, request.process_timeout)?;

        if !finished.success {
            let message = error_text(&finished.stderr);
            log::warn!("yt-dlp failed for {}: {}", request.url, message);
            return Err(EngineError::new(message));
        }

        let info = parse_info(&finished.stdout);
        let file_path = match info.as_ref().and_then(|i| i.filepath.clone()) {
            Some(path) if path.exists() => path,
            _ => find_file_by_token(&request.work_dir, &request.token).ok_or_else(|| {
                EngineError::new(format!(
                    "yt-dlp finished but no output file for token {} was found",
                    request.token
                ))
            })?,
        };

        let info = info.unwrap_or_default();

        Ok(EngineOutput {
            file_path,
            title: info.title,
            duration_secs: info.duration.filter(|d| d.is_finite() && *d >= 0.0).map(|d| d as u32),
            thumbnail: info.thumbnail,
        })
    }
}

struct FinishedProcess {
    success: bool,
    stdout: String,
    stderr: String,
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Waits for the child with a deadline, killing it when the deadline
/// passes. Pipes are drained on separate threads so a chatty child never
/// blocks on a full pipe while we poll.
///
/// Only yt-dlp itself is killed. An ffmpeg it started for merging keeps
/// running until it finishes on its own, and its drain threads stay
/// blocked on the inherited pipes until then. The timeout path does not
/// join them, so the caller is never held up by it.
fn wait_with_output_timeout(mut child: Child, timeout: Duration) -> Result<FinishedProcess, EngineError> {
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());
    let deadline = Instant::now() + timeout;

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if Instant::now() >= deadline {
                    log::error!("yt-dlp process timed out after {}s, killing", timeout.as_secs());
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(EngineError::new(format!(
                        "yt-dlp process timed out after {}s",
                        timeout.as_secs()
                    )));
                }
                std::thread::sleep(Duration::from_millis(200));
            }
            Err(e) => return Err(EngineError::new(format!("Failed to wait for yt-dlp: {}", e))),
        }
    };

    Ok(FinishedProcess {
        success: status.success(),
        stdout: stdout.join().unwrap_or_default(),
        stderr: stderr.join().unwrap_or_default(),
    })
}

/// Last info JSON line on stdout, if any parses
fn parse_info(stdout: &str) -> Option<YtDlpInfo> {
    stdout
        .lines()
        .rev()
        .map(str::trim)
        .filter(|line| line.starts_with('{'))
        .find_map(|line| serde_json::from_str(line).ok())
}

/// Failure text from stderr: the `ERROR:` lines when there are any,
/// otherwise the tail of stderr.
fn error_text(stderr: &str) -> String {
    let errors: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("ERROR:"))
        .collect();

    let text = if errors.is_empty() {
        truncate_tail_utf8(stderr.trim(), STDERR_TAIL_BYTES).to_string()
    } else {
        truncate_tail_utf8(&errors.join("\n"), STDERR_TAIL_BYTES).to_string()
    };

    if text.is_empty() {
        "yt-dlp exited with an error and no output".to_string()
    } else {
        text
    }
}

/// Finds the file carrying `token` in its name, skipping partial downloads.
pub fn find_file_by_token(dir: &Path, token: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .find(|path| {
            let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            name.contains(token) && !name.ends_with(".part") && !name.ends_with(".ytdl")
        })
}

/// Removes every file in `dir` whose name carries `token`: partial
/// downloads, yt-dlp state files and per-format pieces. Returns how many
/// were removed.
pub fn remove_files_by_token(dir: &Path, token: &str) -> usize {
    let entries = match fs_err::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Cannot list {} for cleanup: {}", dir.display(), e);
            }
            return 0;
        }
    };

    let mut removed = 0;
    for path in entries.filter_map(Result::ok).map(|entry| entry.path()) {
        let carries_token = path
            .file_name()
            .map(|n| n.to_string_lossy().contains(token))
            .unwrap_or(false);
        if !carries_token || !path.is_file() {
            continue;
        }
        match fs_err::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove leftover download file: {}", e),
        }
    }
    if removed > 0 {
        log::debug!("Removed {} leftover file(s) for token {}", removed, token);
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn request() -> EngineRequest {
        EngineRequest {
            url: "https://example.com/video".to_string(),
            format_expression: "bestvideo[height<=720]+bestaudio/best[height<=720]/best".to_string(),
            output_template: "%(id)s_tok123.%(ext)s".to_string(),
            work_dir: PathBuf::from("/tmp/grabbot"),
            token: "tok123".to_string(),
            merge_container: "mp4".to_string(),
            options: RobustnessOptions::default(),
            cookies_file: None,
            user_agent: None,
            process_timeout: Duration::from_secs(5),
        }
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_build_args_core_options() {
        let args = YtDlpEngine::build_args(&request());
        assert_eq!(
            value_after(&args, "-f"),
            Some("bestvideo[height<=720]+bestaudio/best[height<=720]/best")
        );
        assert_eq!(value_after(&args, "--merge-output-format"), Some("mp4"));
        assert_eq!(value_after(&args, "-o"), Some("/tmp/grabbot/%(id)s_tok123.%(ext)s"));
        assert_eq!(value_after(&args, "--retries"), Some("10"));
        assert_eq!(value_after(&args, "--fragment-retries"), Some("10"));
        assert_eq!(value_after(&args, "--socket-timeout"), Some("30"));
        assert!(args.contains(&"--no-check-certificate".to_string()));
        assert!(args.contains(&"--geo-bypass".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("https://example.com/video"));
        assert!(!args.contains(&"--cookies".to_string()));
    }

    #[test]
    fn test_build_args_optional_settings() {
        let mut req = request();
        req.cookies_file = Some(PathBuf::from("/etc/grabbot/cookies.txt"));
        req.user_agent = Some("Mozilla/5.0".to_string());
        req.options.geo_bypass = false;

        let args = YtDlpEngine::build_args(&req);
        assert_eq!(value_after(&args, "--cookies"), Some("/etc/grabbot/cookies.txt"));
        assert_eq!(value_after(&args, "--user-agent"), Some("Mozilla/5.0"));
        assert!(!args.contains(&"--geo-bypass".to_string()));
    }

    #[test]
    fn test_parse_info_takes_last_json_line() {
        let stdout = r#"[info] something
{"id": "old"}
{"id": "abc", "title": "Demo", "duration": 65.4, "thumbnail": "https://i.example/t.jpg", "filepath": "/tmp/abc_tok.mp4"}
"#;
        let info = parse_info(stdout).unwrap();
        assert_eq!(info.thumbnail.as_deref(), Some("https://i.example/t.jpg"));
        assert_eq!(info.title.as_deref(), Some("Demo"));
        assert_eq!(info.duration, Some(65.4));
        assert_eq!(info.filepath, Some(PathBuf::from("/tmp/abc_tok.mp4")));
    }

    #[test]
    fn test_parse_info_tolerates_missing_fields_and_garbage() {
        let info = parse_info("{\"id\": \"x\"}").unwrap();
        assert!(info.filepath.is_none());
        assert!(info.title.is_none());
        assert!(info.duration.is_none());
        assert!(parse_info("no json here").is_none());
        assert!(parse_info("{not json").is_none());
    }

    #[test]
    fn test_error_text_prefers_error_lines() {
        let stderr = "WARNING: falling back\n[youtube] abc: Downloading webpage\nERROR: [youtube] abc: Sign in to confirm you're not a bot\n";
        assert_eq!(
            error_text(stderr),
            "ERROR: [youtube] abc: Sign in to confirm you're not a bot"
        );
    }

    #[test]
    fn test_error_text_falls_back_to_tail() {
        assert_eq!(error_text("  something broke  "), "something broke");
        assert_eq!(error_text(""), "yt-dlp exited with an error and no output");

        let long = "z".repeat(STDERR_TAIL_BYTES * 2);
        assert_eq!(error_text(&long).len(), STDERR_TAIL_BYTES);
    }

    #[test]
    fn test_find_file_by_token() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc_tok123.webm.part"), b"partial").unwrap();
        std::fs::write(dir.path().join("other_zzz.mp4"), b"other").unwrap();
        assert_eq!(find_file_by_token(dir.path(), "tok123"), None);

        std::fs::write(dir.path().join("abc_tok123.mp4"), b"video").unwrap();
        assert_eq!(
            find_file_by_token(dir.path(), "tok123"),
            Some(dir.path().join("abc_tok123.mp4"))
        );
    }

    #[test]
    fn test_remove_files_by_token_leaves_other_requests_alone() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("vid_tok123.f137.mp4.part"), b"partial").unwrap();
        std::fs::write(dir.path().join("vid_tok123.f140.m4a"), b"audio").unwrap();
        std::fs::write(dir.path().join("vid_tok123.mp4.ytdl"), b"state").unwrap();
        std::fs::write(dir.path().join("vid_other.mp4"), b"other").unwrap();

        assert_eq!(remove_files_by_token(dir.path(), "tok123"), 3);

        let left: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(left, vec!["vid_other.mp4".to_string()]);
    }

    #[test]
    fn test_remove_files_by_token_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(remove_files_by_token(&dir.path().join("gone"), "tok123"), 0);
    }

    #[test]
    fn test_missing_binary_is_engine_error() {
        let engine = YtDlpEngine::new("/nonexistent/yt-dlp-binary");
        let err = engine.extract(&request()).unwrap_err();
        assert!(err.message.starts_with("Failed to start"));
    }
}
