//! Telegram bot integration and handlers

pub mod bot;
pub mod handlers;
pub mod menu;
pub mod transport;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands, Command};
pub use handlers::{schema, HandlerDeps, HandlerError, InboundEvent, Router, Sender};
pub use transport::{ChatTransport, InlineButton, TeloxideTransport, TextStyle, TransportError};
