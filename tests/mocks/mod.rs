//! Mock implementations of the download engine
//!
//! Lets integration tests run the full pipeline without yt-dlp or network.

pub mod mock_engine;

#[allow(unused_imports)]
pub use mock_engine::{Script, ScriptedEngine};
