//! Handler types and dependencies

use std::sync::Arc;

use teloxide::types::{ChatId, MessageId, User, UserId};

use super::router::Router;
use crate::telegram::bot::Command;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub router: Arc<Router>,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(router: Arc<Router>) -> Self {
        Self { router }
    }
}

/// Who sent an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: UserId,
    pub first_name: String,
}

impl Sender {
    pub fn new(id: UserId, first_name: impl Into<String>) -> Self {
        Self {
            id,
            first_name: first_name.into(),
        }
    }
}

impl From<&User> for Sender {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.first_name.clone())
    }
}

/// An update reduced to what the router acts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Command {
        sender: Sender,
        chat: ChatId,
        command: Command,
    },
    Callback {
        sender: Sender,
        /// Message carrying the keyboard, absent for inline-mode messages
        message: Option<(ChatId, MessageId)>,
        payload: String,
    },
    Text {
        sender: Sender,
        chat: ChatId,
        text: String,
    },
}
