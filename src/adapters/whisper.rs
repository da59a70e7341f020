use crate::ports::transcriber::TranscriberPort;
use async_trait::async_trait;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

/// Sample rate the model ingests. The transcoder pins its output to this
/// rate, so anything else arriving here is a pipeline bug or a corrupt
/// segment and fails the chunk.
const MODEL_SAMPLE_RATE: i32 = 16_000;

#[derive(Debug)]
struct TranscribeError(String);

impl std::fmt::Display for TranscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for TranscribeError {}

/// Shared whisper.cpp model, loaded once and reused across jobs.
/// Reentrancy of the underlying library is unverified, so inference runs
/// one call at a time behind the gate.
pub struct WhisperEngine {
    ctx: Arc<WhisperContext>,
    gate: Mutex<()>,
}

impl std::fmt::Debug for WhisperEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("WhisperEngine").finish_non_exhaustive()
    }
}

impl WhisperEngine {
    pub fn load(model_path: &Path) -> Result<Self, Box<dyn Error + Send + Sync>> {
        if !model_path.exists() {
            return Err(Box::new(TranscribeError(format!(
                "Whisper model not found at {:?}. Download a ggml model from \
                 https://huggingface.co/ggerganov/whisper.cpp/tree/main",
                model_path
            ))));
        }

        let path_str = model_path
            .to_str()
            .ok_or_else(|| TranscribeError(format!("Non-UTF8 model path: {:?}", model_path)))?;
        let ctx = WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
            .map_err(|e| TranscribeError(format!("Failed to load whisper model: {}", e)))?;

        Ok(Self {
            ctx: Arc::new(ctx),
            gate: Mutex::new(()),
        })
    }
}

#[async_trait]
impl TranscriberPort for WhisperEngine {
    async fn transcribe(&self, audio_path: &Path) -> Result<String, Box<dyn Error + Send + Sync>> {
        let _slot = self.gate.lock().await;

        let ctx = self.ctx.clone();
        let path = audio_path.to_path_buf();

        // CPU-bound inference stays off the async runtime.
        let text = tokio::task::spawn_blocking(move || -> Result<String, String> {
            let samples = decode_segment(&path)?;

            let mut state = ctx.create_state().map_err(|e| e.to_string())?;
            let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
            params.set_print_progress(false);
            params.set_print_realtime(false);
            params.set_no_timestamps(true);

            state.full(params, &samples).map_err(|e| e.to_string())?;

            // The model yields a finite, non-restartable sequence of
            // segments; drain it fully before the state is released.
            let text = state
                .as_iter()
                .filter_map(|segment| segment.to_str().ok().map(|s| s.to_string()))
                .collect::<Vec<_>>()
                .join(" ");
            Ok(text)
        })
        .await
        .map_err(|e| TranscribeError(format!("Transcription task failed: {}", e)))?
        .map_err(TranscribeError)?;

        Ok(text.trim().to_string())
    }
}

/// Decode one mp3 segment to 16 kHz mono f32 samples.
fn decode_segment(path: &Path) -> Result<Vec<f32>, String> {
    use minimp3::{Decoder, Error as Mp3Error, Frame};

    let bytes = std::fs::read(path).map_err(|e| format!("Cannot read {:?}: {}", path, e))?;
    let mut decoder = Decoder::new(bytes.as_slice());
    let mut samples = Vec::new();
    let mut sample_rate = 0i32;

    loop {
        match decoder.next_frame() {
            Ok(Frame {
                data,
                sample_rate: sr,
                channels,
                ..
            }) => {
                sample_rate = sr;
                samples.extend(to_mono_f32(&data, channels));
            }
            Err(Mp3Error::Eof) => break,
            Err(e) => return Err(format!("MP3 decode error in {:?}: {:?}", path, e)),
        }
    }

    if samples.is_empty() {
        return Err(format!("No audio decoded from {:?}", path));
    }
    if sample_rate != MODEL_SAMPLE_RATE {
        return Err(format!(
            "Expected {} Hz audio in {:?}, got {} Hz",
            MODEL_SAMPLE_RATE, path, sample_rate
        ));
    }

    Ok(samples)
}

/// Interleaved i16 PCM to mono f32 in [-1.0, 1.0], averaging channels.
fn to_mono_f32(data: &[i16], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.iter().map(|&s| s as f32 / i16::MAX as f32).collect();
    }
    data.chunks_exact(channels)
        .map(|frame| {
            let sum: f32 = frame.iter().map(|&s| s as f32 / i16::MAX as f32).sum();
            sum / channels as f32
        })
        .collect()
}
