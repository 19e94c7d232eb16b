//! Grabbot - Telegram bot that downloads videos with yt-dlp
//!
//! Users send a link, the bot downloads it at their chosen quality tier and
//! replies with the file, or with an explanation of what went wrong.
//!
//! # Module Structure
//!
//! - `core`: Configuration, errors, logging, URL validation
//! - `storage`: In-memory per-user preferences
//! - `download`: Quality tiers, yt-dlp engine, orchestration, delivery
//! - `telegram`: Bot setup, chat transport, and update handlers

pub mod cli;
pub mod core;
pub mod download;
pub mod storage;
pub mod telegram;

// Re-export commonly used types for convenience
pub use core::{config, AppError, AppResult};
pub use download::{DownloadOrchestrator, QualityTier};
pub use storage::SessionStore;
