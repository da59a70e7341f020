use async_trait::async_trait;
use std::error::Error;
use std::path::Path;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait TranscoderPort: Send + Sync {
    /// Re-encode an audio file at the given bitrate (kbps), normalized for
    /// speech transcription. The output file must exist and be non-empty
    /// for the call to count as a success.
    async fn compress(
        &self,
        input: &Path,
        output: &Path,
        bitrate_kbps: u32,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Split an audio file into fixed-duration segment files inside
    /// output_dir, named chunk_000.mp3, chunk_001.mp3, ...
    async fn split(
        &self,
        input: &Path,
        output_dir: &Path,
        chunk_seconds: u32,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;
}
