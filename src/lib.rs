//! Caruso - Audio Transcription Service
//!
//! Hexagonal Architecture:
//! - domain/: Pure business logic (jobs, chunks, progress, workspace, archive)
//! - ports/: Trait definitions
//! - adapters/: Concrete implementations (ffmpeg, yt-dlp, whisper)
//! - application/: Orchestration services (chunk pipeline, job coordinator)
//! - config: Environment configuration
//!
//! A job takes one audio source (uploaded files or a YouTube URL) through
//! compress -> split -> per-segment transcribe -> package, inside an
//! isolated workspace that is removed on every exit path.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports for convenience
pub use application::coordinator::{JobError, JobService};
pub use application::pipeline::{ChunkPipeline, PipelineError, PipelineReport};
pub use config::Config;
pub use domain::jobs::{Job, JobInput, UploadedFile};
