//! Recording chat transport
//!
//! Stores every outbound call instead of talking to Telegram. Individual
//! operations can be switched to fail to exercise error paths.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use teloxide::types::{ChatId, MessageId};

use grabbot::telegram::{ChatTransport, InlineButton, TextStyle, TransportError};

/// One outbound call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    SendText {
        chat: ChatId,
        id: MessageId,
        text: String,
        style: TextStyle,
    },
    SendKeyboard {
        chat: ChatId,
        id: MessageId,
        text: String,
        rows: Vec<Vec<InlineButton>>,
    },
    EditText {
        chat: ChatId,
        message: MessageId,
        text: String,
    },
    Delete {
        chat: ChatId,
        message: MessageId,
    },
    SendFile {
        chat: ChatId,
        path: PathBuf,
        caption: String,
        thumbnail: Option<String>,
        /// Whether the file was on disk while it was being sent
        existed: bool,
    },
}

#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<ApiCall>>,
    next_id: AtomicI32,
    fail_send_file: AtomicBool,
    fail_edit: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI32::new(100),
            ..Default::default()
        }
    }

    pub fn fail_send_file(&self, fail: bool) {
        self.fail_send_file.store(fail, Ordering::SeqCst);
    }

    pub fn fail_edit(&self, fail: bool) {
        self.fail_edit.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, chat: ChatId) -> Vec<ApiCall> {
        self.calls()
            .into_iter()
            .filter(|call| match call {
                ApiCall::SendText { chat: c, .. }
                | ApiCall::SendKeyboard { chat: c, .. }
                | ApiCall::EditText { chat: c, .. }
                | ApiCall::Delete { chat: c, .. }
                | ApiCall::SendFile { chat: c, .. } => *c == chat,
            })
            .collect()
    }

    /// All texts that were sent or written by edits, in order
    pub fn texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::SendText { text, .. }
                | ApiCall::SendKeyboard { text, .. }
                | ApiCall::EditText { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn sent_files(&self) -> Vec<(PathBuf, String, bool)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::SendFile {
                    path, caption, existed, ..
                } => Some((path, caption, existed)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: ApiCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_message_id(&self) -> MessageId {
        MessageId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_text(&self, chat: ChatId, text: &str, style: TextStyle) -> Result<MessageId, TransportError> {
        let id = self.next_message_id();
        self.record(ApiCall::SendText {
            chat,
            id,
            text: text.to_string(),
            style,
        });
        Ok(id)
    }

    async fn send_keyboard(
        &self,
        chat: ChatId,
        text: &str,
        _style: TextStyle,
        rows: Vec<Vec<InlineButton>>,
    ) -> Result<MessageId, TransportError> {
        let id = self.next_message_id();
        self.record(ApiCall::SendKeyboard {
            chat,
            id,
            text: text.to_string(),
            rows,
        });
        Ok(id)
    }

    async fn edit_text(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        _style: TextStyle,
    ) -> Result<(), TransportError> {
        if self.fail_edit.load(Ordering::SeqCst) {
            return Err(TransportError::Other("message can't be edited".to_string()));
        }
        self.record(ApiCall::EditText {
            chat,
            message,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<(), TransportError> {
        self.record(ApiCall::Delete { chat, message });
        Ok(())
    }

    async fn send_file(
        &self,
        chat: ChatId,
        path: &Path,
        caption: &str,
        _style: TextStyle,
        thumbnail: Option<&str>,
    ) -> Result<MessageId, TransportError> {
        self.record(ApiCall::SendFile {
            chat,
            path: path.to_path_buf(),
            caption: caption.to_string(),
            thumbnail: thumbnail.map(str::to_string),
            existed: path.exists(),
        });
        if self.fail_send_file.load(Ordering::SeqCst) {
            return Err(TransportError::Other("Request Entity Too Large".to_string()));
        }
        Ok(self.next_message_id())
    }
}
