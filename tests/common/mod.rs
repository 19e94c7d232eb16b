//! Common test utilities
//!
//! This module is shared across all integration tests

pub mod helpers;
pub mod recorder;

#[allow(unused_imports)]
pub use helpers::{create_test_chat_id, text_event, Harness};
#[allow(unused_imports)]
pub use recorder::{ApiCall, RecordingTransport};
