//! Environment configuration.

use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Config {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: String,
    /// Parent directory for per-job workspaces and packaged archives
    pub work_dir: PathBuf,
    /// Path to the ggml whisper model file
    pub whisper_model_path: PathBuf,
    /// ffmpeg binary (name on PATH or an absolute path to a bundled copy)
    pub ffmpeg_path: PathBuf,
    /// yt-dlp binary
    pub ytdlp_path: PathBuf,
    /// Target audio bitrate in kbps, tuned for speech
    pub bitrate_kbps: u32,
    /// Segment duration in seconds
    pub chunk_seconds: u32,
    /// Upper bound on jobs processed at the same time
    pub max_concurrent_jobs: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            addr: env::var("ADDR").unwrap_or_else(|_| String::from("127.0.0.1")),
            port: env::var("PORT").unwrap_or_else(|_| String::from("3000")),
            work_dir: PathBuf::from(
                env::var("WORK_DIR").unwrap_or_else(|_| String::from("./transcription_jobs")),
            ),
            whisper_model_path: PathBuf::from(
                env::var("WHISPER_MODEL_PATH")
                    .unwrap_or_else(|_| String::from("./whisper_models/ggml-base.bin")),
            ),
            ffmpeg_path: PathBuf::from(
                env::var("FFMPEG_PATH").unwrap_or_else(|_| String::from("ffmpeg")),
            ),
            ytdlp_path: PathBuf::from(
                env::var("YTDLP_PATH").unwrap_or_else(|_| String::from("yt-dlp")),
            ),
            bitrate_kbps: parse_env("AUDIO_BITRATE_KBPS", 48),
            chunk_seconds: parse_env("CHUNK_SECONDS", 300),
            max_concurrent_jobs: parse_env("MAX_CONCURRENT_JOBS", 2),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
