//! Request routing: commands, quality callbacks, and links

use std::sync::Arc;

use teloxide::types::{ChatId, MessageId, UserId};

use super::types::{InboundEvent, Sender};
use crate::core::validation::validate_media_url;
use crate::download::delivery::{DeliveryContext, DeliveryPipeline};
use crate::download::orchestrator::DownloadOrchestrator;
use crate::download::outcome::{DownloadOutcome, DownloadRequest, RequestState};
use crate::download::quality::{self, QualityTier};
use crate::download::ytdlp_errors::render;
use crate::storage::SessionStore;
use crate::telegram::bot::Command;
use crate::telegram::menu;
use crate::telegram::transport::{ChatTransport, TextStyle, TransportError};

/// Tracks one link request through its states.
struct RequestTrace {
    user: UserId,
    state: RequestState,
}

impl RequestTrace {
    fn received(user: UserId) -> Self {
        log::info!("Request from user {}: {}", user, RequestState::Received);
        Self {
            user,
            state: RequestState::Received,
        }
    }

    fn advance(&mut self, next: RequestState) {
        log::info!("Request from user {}: {} -> {}", self.user, self.state, next);
        self.state = next;
    }
}

/// Dispatches inbound events to their handlers
pub struct Router {
    sessions: Arc<SessionStore>,
    orchestrator: Arc<DownloadOrchestrator>,
    delivery: DeliveryPipeline,
    transport: Arc<dyn ChatTransport>,
}

impl Router {
    pub fn new(
        sessions: Arc<SessionStore>,
        orchestrator: Arc<DownloadOrchestrator>,
        delivery: DeliveryPipeline,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        Self {
            sessions,
            orchestrator,
            delivery,
            transport,
        }
    }

    /// Handles one event. Errors are transport failures while replying.
    pub async fn handle(&self, event: InboundEvent) -> Result<(), TransportError> {
        match event {
            InboundEvent::Command { sender, chat, command } => self.handle_command(&sender, chat, command).await,
            InboundEvent::Callback {
                sender,
                message,
                payload,
            } => self.handle_callback(&sender, message, &payload).await,
            InboundEvent::Text { sender, chat, text } => self.handle_text(&sender, chat, &text).await,
        }
    }

    async fn handle_command(&self, sender: &Sender, chat: ChatId, command: Command) -> Result<(), TransportError> {
        log::info!("Received command {:?} from user {}", command, sender.id);
        match command {
            Command::Start => {
                let mention = menu::user_mention(sender.id, &sender.first_name);
                self.transport
                    .send_text(chat, &menu::welcome_text(&mention), TextStyle::Html)
                    .await?;
            }
            Command::Help => {
                let tier = self.sessions.get_tier(sender.id);
                self.transport
                    .send_text(chat, &menu::help_text(tier), TextStyle::Html)
                    .await?;
            }
            Command::Quality => {
                let tier = self.sessions.get_tier(sender.id);
                self.transport
                    .send_keyboard(
                        chat,
                        &menu::quality_menu_text(tier),
                        TextStyle::Html,
                        menu::quality_keyboard(),
                    )
                    .await?;
            }
        }
        Ok(())
    }

    async fn handle_callback(
        &self,
        sender: &Sender,
        message: Option<(ChatId, MessageId)>,
        payload: &str,
    ) -> Result<(), TransportError> {
        let Some(tier) = QualityTier::from_callback_payload(payload) else {
            log::warn!("Ignoring unknown callback payload {:?} from user {}", payload, sender.id);
            return Ok(());
        };

        self.sessions.set_tier(sender.id, tier);
        log::info!("User {} selected quality {}", sender.id, tier);

        let text = menu::quality_confirmation_text(tier);
        match message {
            Some((chat, message_id)) => self.transport.edit_text(chat, message_id, &text, TextStyle::Html).await,
            None => Ok(()),
        }
    }

    async fn handle_text(&self, sender: &Sender, chat: ChatId, text: &str) -> Result<(), TransportError> {
        let mut trace = RequestTrace::received(sender.id);

        let url = match validate_media_url(text) {
            Ok(url) => url,
            Err(e) => {
                log::info!("Rejected text from user {}: {}", sender.id, e);
                trace.advance(RequestState::Failed);
                self.transport
                    .send_text(chat, menu::INVALID_URL_TEXT, TextStyle::Plain)
                    .await?;
                return Ok(());
            }
        };
        trace.advance(RequestState::Validated);

        let tier = self.sessions.get_tier(sender.id);
        let request = DownloadRequest::new(url, tier);

        let progress = match self
            .transport
            .send_text(chat, &menu::processing_text(tier, request.url.as_str()), TextStyle::Html)
            .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                log::warn!("Failed to send processing message: {}", e);
                None
            }
        };

        trace.advance(RequestState::Dispatched);
        match self.orchestrator.download(&request).await {
            DownloadOutcome::Success(media) => {
                trace.advance(RequestState::Succeeded);
                let ctx = DeliveryContext {
                    chat,
                    progress_message: progress,
                    tier,
                    spec: quality::resolve(tier),
                };
                self.delivery.deliver(media, &ctx).await;
                Ok(())
            }
            DownloadOutcome::Failure(failure) => {
                trace.advance(RequestState::Failed);
                let text = render(failure.category, &failure.raw_message);
                self.reply_or_edit(chat, progress, &text).await
            }
        }
    }

    /// Replaces the progress message with `text`, or sends it fresh when
    /// there is no progress message or it cannot be edited.
    async fn reply_or_edit(&self, chat: ChatId, progress: Option<MessageId>, text: &str) -> Result<(), TransportError> {
        if let Some(message_id) = progress {
            match self.transport.edit_text(chat, message_id, text, TextStyle::Html).await {
                Ok(()) => return Ok(()),
                Err(e) => log::warn!("Failed to edit progress message: {}", e),
            }
        }
        self.transport.send_text(chat, text, TextStyle::Html).await?;
        Ok(())
    }
}
