use crate::domain::chunks::{self, chunk_header};
use crate::domain::progress::ProgressCounter;
use crate::ports::progress::ProgressSink;
use crate::ports::transcoder::TranscoderPort;
use crate::ports::transcriber::TranscriberPort;
use std::error::Error;
use std::io;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

#[derive(Debug)]
pub enum PipelineError {
    Compression(String),
    Split(String),
    NoSegments,
    Transcript(String),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            PipelineError::Compression(e) => write!(f, "compression failed: {}", e),
            PipelineError::Split(e) => write!(f, "split failed: {}", e),
            PipelineError::NoSegments => write!(f, "no audio chunks were generated"),
            PipelineError::Transcript(e) => write!(f, "cannot write transcript: {}", e),
        }
    }
}

impl Error for PipelineError {}

/// Outcome of one pipeline run. A transcribed count lower than the segment
/// total means some chunks were skipped and are absent from the transcript.
#[derive(Debug, Clone, Copy)]
pub struct PipelineReport {
    pub total_segments: usize,
    pub transcribed_chunks: usize,
}

/// The core orchestrator: takes one raw audio file through
/// compress -> split -> per-chunk (compress -> transcribe -> append ->
/// delete) -> cleanup, reporting progress along the way.
///
/// Intermediate artifacts are deleted as soon as the next stage's output
/// exists, so peak disk usage stays bounded regardless of input length.
pub struct ChunkPipeline<T, M> {
    transcoder: T,
    transcriber: M,
    bitrate_kbps: u32,
    chunk_seconds: u32,
}

impl<T, M> ChunkPipeline<T, M>
where
    T: TranscoderPort,
    M: TranscriberPort,
{
    pub fn new(transcoder: T, transcriber: M, bitrate_kbps: u32, chunk_seconds: u32) -> Self {
        Self {
            transcoder,
            transcriber,
            bitrate_kbps,
            chunk_seconds,
        }
    }

    pub async fn run(
        &self,
        raw_audio: &Path,
        workspace: &Path,
        transcript_path: &Path,
        progress: &dyn ProgressSink,
    ) -> Result<PipelineReport, PipelineError> {
        let stem = raw_audio
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("audio")
            .to_string();

        progress.status("Compressing audio...");
        let compressed = workspace.join(format!("{}_compressed.mp3", stem));
        self.transcoder
            .compress(raw_audio, &compressed, self.bitrate_kbps)
            .await
            .map_err(|e| PipelineError::Compression(e.to_string()))?;
        // Ownership transfer: the raw input is owned by this stage and is
        // released as soon as the compressed copy exists.
        let _ = fs::remove_file(raw_audio).await;

        progress.status("Splitting audio into chunks...");
        let segment_dir = workspace.join(format!("{}_segments", stem));
        fs::create_dir_all(&segment_dir)
            .await
            .map_err(|e| PipelineError::Split(e.to_string()))?;
        self.transcoder
            .split(&compressed, &segment_dir, self.chunk_seconds)
            .await
            .map_err(|e| PipelineError::Split(e.to_string()))?;
        let _ = fs::remove_file(&compressed).await;

        let segments = chunks::ordered_segments(&segment_dir)
            .map_err(|e| PipelineError::Split(format!("cannot list segments: {}", e)))?;
        if segments.is_empty() {
            return Err(PipelineError::NoSegments);
        }

        let mut counter = ProgressCounter::new(segments.len());
        let mut transcribed = 0usize;

        for (index, segment) in segments.iter().enumerate() {
            let normalized = segment.with_extension("norm.mp3");

            match self.transcribe_segment(segment, &normalized).await {
                Ok(text) => {
                    append_chunk(transcript_path, index, self.chunk_seconds, &text)
                        .await
                        .map_err(|e| PipelineError::Transcript(e.to_string()))?;
                    transcribed += 1;
                }
                Err(e) => {
                    // Fatal to the segment only: the chunk is skipped and
                    // the job carries on.
                    eprintln!("Skipping chunk {} of {}: {}", index, stem, e);
                }
            }

            let _ = fs::remove_file(segment).await;
            let _ = fs::remove_file(&normalized).await;

            counter.advance();
            progress.report(counter.processed(), counter.total());
        }

        // The segment directory should be empty by now; its removal is not
        // part of the job outcome.
        let _ = fs::remove_dir_all(&segment_dir).await;

        Ok(PipelineReport {
            total_segments: counter.total(),
            transcribed_chunks: transcribed,
        })
    }

    async fn transcribe_segment(
        &self,
        segment: &Path,
        normalized: &Path,
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        self.transcoder
            .compress(segment, normalized, self.bitrate_kbps)
            .await?;
        self.transcriber.transcribe(normalized).await
    }
}

/// Append one chunk to the transcript file. Append-only, so chunks already
/// written survive any later failure.
async fn append_chunk(
    path: &Path,
    index: usize,
    chunk_seconds: u32,
    text: &str,
) -> io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    let entry = format!("{}\n{}\n\n", chunk_header(index, chunk_seconds), text);
    file.write_all(entry.as_bytes()).await?;
    file.flush().await
}
