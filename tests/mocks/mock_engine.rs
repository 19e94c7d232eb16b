//! Scripted extraction engine
//!
//! Replays a fixed behaviour instead of running yt-dlp, and records the
//! requests it was given.

#![allow(dead_code)]

use std::sync::Mutex;
use std::time::Duration;

use grabbot::download::{EngineError, EngineOutput, EngineRequest, ExtractionEngine};

/// What the engine does when called
#[derive(Debug, Clone)]
pub enum Script {
    /// Writes `<id>_<token>.<ext>` into the work dir and reports it
    Produce {
        ext: &'static str,
        title: Option<&'static str>,
        duration_secs: Option<u32>,
        thumbnail: Option<&'static str>,
        bytes: usize,
    },
    /// Fails with this raw error text
    Fail(&'static str),
}

impl Script {
    pub fn video(title: &'static str) -> Self {
        Script::Produce {
            ext: "mp4",
            title: Some(title),
            duration_secs: Some(125),
            thumbnail: Some("https://i.example.com/demo.jpg"),
            bytes: 1024,
        }
    }
}

pub struct ScriptedEngine {
    script: Script,
    delay: Duration,
    requests: Mutex<Vec<EngineRequest>>,
}

impl ScriptedEngine {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Blocks for `delay` before acting on the script
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<EngineRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl ExtractionEngine for ScriptedEngine {
    fn extract(&self, request: &EngineRequest) -> Result<EngineOutput, EngineError> {
        self.requests.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        match &self.script {
            Script::Fail(message) => Err(EngineError::new(*message)),
            Script::Produce {
                ext,
                title,
                duration_secs,
                thumbnail,
                bytes,
            } => {
                let path = request.work_dir.join(format!("demo_{}.{}", request.token, ext));
                std::fs::write(&path, vec![0u8; *bytes]).map_err(|e| EngineError::new(e.to_string()))?;
                Ok(EngineOutput {
                    file_path: path,
                    title: title.map(str::to_string),
                    duration_secs: *duration_secs,
                    thumbnail: thumbnail.map(str::to_string),
                })
            }
        }
    }
}
