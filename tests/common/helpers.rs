//! Test helpers for wiring a router against fakes

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use teloxide::types::{ChatId, UserId};

use grabbot::download::{DeliveryPipeline, DownloadOrchestrator, ExtractionEngine};
use grabbot::storage::SessionStore;
use grabbot::telegram::{InboundEvent, Router, Sender};

use super::recorder::RecordingTransport;

/// Chat id for a test user; private chats share the user's id
pub fn create_test_chat_id(user: u64) -> ChatId {
    ChatId(user as i64)
}

pub fn sender(user: u64) -> Sender {
    Sender::new(UserId(user), format!("User{}", user))
}

pub fn text_event(user: u64, text: &str) -> InboundEvent {
    InboundEvent::Text {
        sender: sender(user),
        chat: create_test_chat_id(user),
        text: text.to_string(),
    }
}

/// Router wired to a recording transport and a temporary work dir
pub struct Harness {
    pub router: Router,
    pub transport: Arc<RecordingTransport>,
    pub sessions: Arc<SessionStore>,
    pub work_dir: TempDir,
}

impl Harness {
    pub fn new(engine: Arc<dyn ExtractionEngine>) -> Self {
        Self::with_limits(engine, Duration::from_secs(10), 50 * 1024 * 1024)
    }

    pub fn with_limits(engine: Arc<dyn ExtractionEngine>, timeout: Duration, max_upload_bytes: u64) -> Self {
        let work_dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(RecordingTransport::new());
        let sessions = Arc::new(SessionStore::new());
        let orchestrator = Arc::new(DownloadOrchestrator::new(engine, work_dir.path(), timeout));
        let router = Router::new(
            Arc::clone(&sessions),
            orchestrator,
            DeliveryPipeline::new(transport.clone(), max_upload_bytes),
            transport.clone(),
        );

        Self {
            router,
            transport,
            sessions,
            work_dir,
        }
    }

    pub fn work_dir(&self) -> &Path {
        self.work_dir.path()
    }

    /// Number of entries left in the work dir
    pub fn leftover_files(&self) -> usize {
        std::fs::read_dir(self.work_dir.path()).map(|d| d.count()).unwrap_or(0)
    }
}
