pub mod ffmpeg;
pub mod progress;
pub mod whisper;
pub mod ytdlp;

pub use ffmpeg::{FfmpegTranscoder, RealFfmpegRunner};
pub use progress::LogProgress;
pub use whisper::WhisperEngine;
pub use ytdlp::{RealYtDlpRunner, YtDlpDownloader};
