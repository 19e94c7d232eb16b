//! Process-lifetime state shared across update handlers

pub mod sessions;

pub use sessions::{SessionStore, UserSession};
