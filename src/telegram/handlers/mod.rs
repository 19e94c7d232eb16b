//! Telegram bot handler tree configuration
//!
//! The dispatcher schema turns updates into `InboundEvent`s; the `Router`
//! acts on them through a `ChatTransport`. Tests drive the router directly
//! with a recording transport.

mod router;
mod schema;
mod types;

pub use router::Router;
pub use schema::schema;
pub use types::{HandlerDeps, HandlerError, InboundEvent, Sender};
