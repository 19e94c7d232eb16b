//! Outbound chat operations behind a trait.
//!
//! The router and the delivery pipeline only talk to `ChatTransport`, so
//! they can be driven by a recording fake in tests.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId, ParseMode};
use thiserror::Error;

/// How the text of an outgoing message is parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    Plain,
    Html,
}

/// Inline keyboard button with an opaque callback payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub payload: String,
}

impl InlineButton {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Telegram request failed: {0}")]
    Request(#[from] teloxide::RequestError),

    #[error("{0}")]
    Other(String),
}

/// Outbound chat operations used by the bot core
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_text(&self, chat: ChatId, text: &str, style: TextStyle) -> Result<MessageId, TransportError>;

    async fn send_keyboard(
        &self,
        chat: ChatId,
        text: &str,
        style: TextStyle,
        rows: Vec<Vec<InlineButton>>,
    ) -> Result<MessageId, TransportError>;

    async fn edit_text(&self, chat: ChatId, message: MessageId, text: &str, style: TextStyle)
        -> Result<(), TransportError>;

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<(), TransportError>;

    /// Sends a video file. `thumbnail` is a URL for the preview image;
    /// implementations may skip it when it cannot be fetched.
    async fn send_file(
        &self,
        chat: ChatId,
        path: &Path,
        caption: &str,
        style: TextStyle,
        thumbnail: Option<&str>,
    ) -> Result<MessageId, TransportError>;
}

/// Telegram rejects thumbnails above 200 KB
const MAX_THUMBNAIL_BYTES: usize = 200 * 1024;
const THUMBNAIL_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

fn parse_mode(style: TextStyle) -> Option<ParseMode> {
    match style {
        TextStyle::Plain => None,
        TextStyle::Html => Some(ParseMode::Html),
    }
}

fn keyboard(rows: Vec<Vec<InlineButton>>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(rows.into_iter().map(|row| {
        row.into_iter()
            .map(|button| InlineKeyboardButton::callback(button.label, button.payload))
            .collect::<Vec<_>>()
    }))
}

/// Production transport backed by a teloxide `Bot`
#[derive(Clone)]
pub struct TeloxideTransport {
    bot: Bot,
    http: reqwest::Client,
}

impl TeloxideTransport {
    pub fn new(bot: Bot) -> Self {
        Self {
            bot,
            http: reqwest::Client::new(),
        }
    }

    /// Downloads the preview image. Any problem means no thumbnail.
    async fn fetch_thumbnail(&self, url: &str) -> Option<Vec<u8>> {
        let response = match self.http.get(url).timeout(THUMBNAIL_FETCH_TIMEOUT).send().await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Failed to download thumbnail {}: {}", url, e);
                return None;
            }
        };
        if !response.status().is_success() {
            log::warn!("Thumbnail request for {} failed with status {}", url, response.status());
            return None;
        }

        match response.bytes().await {
            Ok(bytes) if usable_thumbnail_size(bytes.len()) => Some(bytes.to_vec()),
            Ok(bytes) => {
                log::warn!("Skipping thumbnail of {} bytes", bytes.len());
                None
            }
            Err(e) => {
                log::warn!("Failed to read thumbnail bytes: {}", e);
                None
            }
        }
    }
}

fn usable_thumbnail_size(len: usize) -> bool {
    len > 0 && len <= MAX_THUMBNAIL_BYTES
}

#[async_trait]
impl ChatTransport for TeloxideTransport {
    async fn send_text(&self, chat: ChatId, text: &str, style: TextStyle) -> Result<MessageId, TransportError> {
        let request = self.bot.send_message(chat, text);
        let message = match parse_mode(style) {
            Some(mode) => request.parse_mode(mode).await?,
            None => request.await?,
        };
        Ok(message.id)
    }

    async fn send_keyboard(
        &self,
        chat: ChatId,
        text: &str,
        style: TextStyle,
        rows: Vec<Vec<InlineButton>>,
    ) -> Result<MessageId, TransportError> {
        let request = self.bot.send_message(chat, text).reply_markup(keyboard(rows));
        let message = match parse_mode(style) {
            Some(mode) => request.parse_mode(mode).await?,
            None => request.await?,
        };
        Ok(message.id)
    }

    async fn edit_text(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        style: TextStyle,
    ) -> Result<(), TransportError> {
        let request = self.bot.edit_message_text(chat, message, text);
        match parse_mode(style) {
            Some(mode) => request.parse_mode(mode).await?,
            None => request.await?,
        };
        Ok(())
    }

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<(), TransportError> {
        self.bot.delete_message(chat, message).await?;
        Ok(())
    }

    async fn send_file(
        &self,
        chat: ChatId,
        path: &Path,
        caption: &str,
        style: TextStyle,
        thumbnail: Option<&str>,
    ) -> Result<MessageId, TransportError> {
        let mut request = self
            .bot
            .send_video(chat, InputFile::file(path.to_path_buf()))
            .caption(caption)
            .supports_streaming(true);
        if let Some(url) = thumbnail {
            if let Some(bytes) = self.fetch_thumbnail(url).await {
                request = request.thumbnail(InputFile::memory(bytes));
            }
        }
        let message = match parse_mode(style) {
            Some(mode) => request.parse_mode(mode).await?,
            None => request.await?,
        };
        Ok(message.id)
    }
}
