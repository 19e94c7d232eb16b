//! Hands a downloaded file to the chat and cleans up after it.

use std::sync::Arc;

use teloxide::types::{ChatId, MessageId};

use crate::core::config;
use crate::core::utils::{escape_html, format_duration, truncate_chars};
use crate::download::outcome::DownloadedMedia;
use crate::download::quality::{FormatSpec, QualityTier};
use crate::download::ytdlp_errors::render_transfer_error;
use crate::telegram::transport::{ChatTransport, TextStyle, TransportError};

/// Where and how a file is delivered
#[derive(Debug, Clone)]
pub struct DeliveryContext {
    pub chat: ChatId,
    /// Status message to update and finally remove, if one was sent
    pub progress_message: Option<MessageId>,
    pub tier: QualityTier,
    pub spec: FormatSpec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered,
    TransferFailed,
}

/// Sends downloaded media through a chat transport
#[derive(Clone)]
pub struct DeliveryPipeline {
    transport: Arc<dyn ChatTransport>,
    max_upload_bytes: u64,
}

impl DeliveryPipeline {
    pub fn new(transport: Arc<dyn ChatTransport>, max_upload_bytes: u64) -> Self {
        Self {
            transport,
            max_upload_bytes,
        }
    }

    /// Uses the upload limit of the configured Bot API server.
    pub fn from_config(transport: Arc<dyn ChatTransport>) -> Self {
        Self::new(transport, config::validation::max_upload_bytes())
    }

    /// Delivers `media` and deletes its file whatever happens.
    pub async fn deliver(&self, media: DownloadedMedia, ctx: &DeliveryContext) -> DeliveryStatus {
        let DownloadedMedia {
            file,
            title,
            duration_secs,
            thumbnail,
        } = media;

        if let Some(progress) = ctx.progress_message {
            let text = format!("📤 Uploading <b>{}</b>...", escape_html(&title));
            if let Err(e) = self.transport.edit_text(ctx.chat, progress, &text, TextStyle::Html).await {
                log::warn!("Failed to update progress message: {}", e);
            }
        }

        let result = match file.size() {
            Ok(size) if size > self.max_upload_bytes => Err(TransportError::Other(format!(
                "File is {:.1} MB, the upload limit is {:.1} MB",
                size as f64 / (1024.0 * 1024.0),
                self.max_upload_bytes as f64 / (1024.0 * 1024.0)
            ))),
            Ok(_) => {
                let caption = build_caption(&title, ctx.tier, &ctx.spec, duration_secs);
                self.transport
                    .send_file(ctx.chat, file.path(), &caption, TextStyle::Html, thumbnail.as_deref())
                    .await
                    .map(|_| ())
            }
            Err(e) => Err(TransportError::Other(format!("Cannot read downloaded file: {}", e))),
        };

        let status = match result {
            Ok(()) => {
                if let Some(progress) = ctx.progress_message {
                    if let Err(e) = self.transport.delete_message(ctx.chat, progress).await {
                        log::warn!("Failed to delete progress message: {}", e);
                    }
                }
                log::info!("Delivered {} to chat {}", file.path().display(), ctx.chat.0);
                DeliveryStatus::Delivered
            }
            Err(e) => {
                log::error!("Failed to deliver {} to chat {}: {}", file.path().display(), ctx.chat.0, e);
                self.report_failure(ctx, &render_transfer_error(&e.to_string())).await;
                DeliveryStatus::TransferFailed
            }
        };

        drop(file);
        status
    }

    async fn report_failure(&self, ctx: &DeliveryContext, text: &str) {
        if let Some(progress) = ctx.progress_message {
            match self.transport.edit_text(ctx.chat, progress, text, TextStyle::Html).await {
                Ok(()) => return,
                Err(e) => log::warn!("Failed to edit progress message, sending a new one: {}", e),
            }
        }
        if let Err(e) = self.transport.send_text(ctx.chat, text, TextStyle::Html).await {
            log::error!("Failed to report delivery failure to chat {}: {}", ctx.chat.0, e);
        }
    }
}

/// Titles are cut so the caption stays well under Telegram's 1024 limit
const MAX_TITLE_CHARS: usize = 200;

/// Caption with title, tier, resolution and duration, in HTML.
pub fn build_caption(title: &str, tier: QualityTier, spec: &FormatSpec, duration_secs: u32) -> String {
    let mut caption = format!(
        "🎬 <b>{}</b>\n📊 Quality: {} ({})",
        escape_html(&truncate_chars(title, MAX_TITLE_CHARS)),
        tier.display_name(),
        spec.label
    );
    if duration_secs > 0 {
        caption.push_str(&format!("\n⏱ Duration: {}", format_duration(duration_secs)));
    }
    caption
}
