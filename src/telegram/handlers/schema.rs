//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::types::{HandlerDeps, HandlerError, InboundEvent, Sender};
use crate::telegram::bot::Command;

/// Creates the dispatcher schema for the Telegram bot.
///
/// Updates are reduced to `InboundEvent`s and handed to the router, so the
/// same routing logic runs in production and in tests.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    dptree::entry()
        .branch(command_handler(deps.clone()))
        .branch(message_handler(deps.clone()))
        .branch(callback_handler(deps))
}

fn sender_of(msg: &Message) -> Option<Sender> {
    msg.from.as_ref().map(Sender::from)
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                let Some(sender) = sender_of(&msg) else {
                    return Ok(());
                };
                deps.router
                    .handle(InboundEvent::Command {
                        sender,
                        chat: msg.chat.id,
                        command: cmd,
                    })
                    .await?;
                Ok(())
            }
        },
    ))
}

fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some())
        .endpoint(move |msg: Message| {
            let deps = deps.clone();
            async move {
                let (Some(sender), Some(text)) = (sender_of(&msg), msg.text()) else {
                    return Ok(());
                };
                deps.router
                    .handle(InboundEvent::Text {
                        sender,
                        chat: msg.chat.id,
                        text: text.to_string(),
                    })
                    .await?;
                Ok(())
            }
        })
}

fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
                log::warn!("Failed to answer callback query: {}", e);
            }

            let Some(payload) = q.data.clone() else {
                return Ok(());
            };
            let message = q.message.as_ref().map(|m| (m.chat().id, m.id()));

            deps.router
                .handle(InboundEvent::Callback {
                    sender: Sender::from(&q.from),
                    message,
                    payload,
                })
                .await?;
            Ok(())
        }
    })
}
