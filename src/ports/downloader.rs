use async_trait::async_trait;
use std::error::Error;
use std::path::{Path, PathBuf};

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait DownloaderPort: Send + Sync {
    /// Fetch the audio track of a remote video into dest_dir.
    /// The returned path is the only success signal; the adapter itself
    /// re-verifies that the file exists.
    async fn fetch(
        &self,
        url: &str,
        dest_dir: &Path,
    ) -> Result<PathBuf, Box<dyn Error + Send + Sync>>;
}
