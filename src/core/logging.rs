//! Logging initialization and configuration checking
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - Startup diagnostics for the download configuration

use anyhow::Result;
use simplelog::*;
use std::path::Path;

use crate::core::config;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to initialize logger
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file =
        fs_err::File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs the download configuration at application startup
///
/// Validates and logs:
/// - download folder and yt-dlp binary
/// - bounded wait for downloads
/// - YTDL_COOKIES_FILE existence, when set
/// - Bot API endpoint and the resulting upload limit
pub fn log_startup_configuration() {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("⚙️  Download Configuration");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("📁 DOWNLOAD_FOLDER: {}", config::DOWNLOAD_FOLDER.as_str());
    log::info!("🔧 YTDL_BIN: {}", config::YTDL_BIN.as_str());
    log::info!(
        "⏱️  Download timeout: {}s (yt-dlp process: {}s)",
        config::download::timeout().as_secs(),
        config::download::process_timeout().as_secs()
    );

    match config::YTDL_COOKIES_FILE.as_deref() {
        Some(cookies_file) => {
            let cookies_path = shellexpand::tilde(cookies_file).into_owned();
            if Path::new(&cookies_path).exists() {
                log::info!("✅ YTDL_COOKIES_FILE: {}", cookies_path);
            } else {
                log::error!("❌ YTDL_COOKIES_FILE: {} (FILE NOT FOUND!)", cookies_path);
                log::error!("   Sites that require a login will fail");
            }
        }
        None => log::warn!("⚠️  YTDL_COOKIES_FILE: not set, login-gated media will be rejected"),
    }

    if config::YTDL_USER_AGENT.is_some() {
        log::info!("🕵️  YTDL_USER_AGENT: custom user agent configured");
    }

    match config::bot_api::get_url() {
        Some(url) if config::bot_api::is_local_url(&url) => {
            log::info!("🛰️  Local Bot API server: {}", url);
        }
        _ => log::info!("🛰️  Bot API: api.telegram.org"),
    }
    log::info!(
        "📦 Upload limit: {} MB",
        config::validation::max_upload_bytes() / (1024 * 1024)
    );
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
