use async_trait::async_trait;
use std::error::Error;
use std::path::Path;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait TranscriberPort: Send + Sync {
    /// Transcribe one audio file to text. The underlying model yields a
    /// finite sequence of text segments; implementations drain it fully and
    /// concatenate in emission order. Failures are returned to the caller,
    /// which decides whether to skip the chunk or abort.
    async fn transcribe(&self, audio_path: &Path) -> Result<String, Box<dyn Error + Send + Sync>>;
}
