//! Download management and processing

pub mod delivery;
pub mod engine;
pub mod orchestrator;
pub mod outcome;
pub mod quality;
pub mod ytdlp_errors;

// Re-exports for convenience
pub use delivery::{DeliveryContext, DeliveryPipeline, DeliveryStatus};
pub use engine::{EngineError, EngineOutput, EngineRequest, ExtractionEngine, YtDlpEngine};
pub use orchestrator::DownloadOrchestrator;
pub use outcome::{DownloadFailure, DownloadOutcome, DownloadRequest, DownloadedFile, DownloadedMedia, RequestState};
pub use quality::{FormatSpec, QualityTier};
pub use ytdlp_errors::ErrorCategory;
