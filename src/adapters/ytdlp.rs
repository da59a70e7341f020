use crate::ports::downloader::DownloaderPort;
use async_trait::async_trait;
use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command as TokioCommand;

/// The one trusted hosting domain for remote videos.
pub const YOUTUBE_URL_PREFIX: &str = "https://www.youtube.com";

const DOWNLOAD_ATTEMPTS: usize = 3;
const DOWNLOADED_AUDIO_NAME: &str = "video_audio.m4a";

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait YtDlpRunner: Send + Sync {
    async fn run_download(&self, url: &str, target: &Path) -> io::Result<Output>;
}

pub struct RealYtDlpRunner {
    binary: PathBuf,
}

impl RealYtDlpRunner {
    pub fn new(binary: PathBuf) -> Self {
        Self { binary }
    }
}

#[async_trait]
impl YtDlpRunner for RealYtDlpRunner {
    async fn run_download(&self, url: &str, target: &Path) -> io::Result<Output> {
        TokioCommand::new(&self.binary)
            .arg("-x")
            .arg("--audio-format")
            .arg("m4a")
            .arg("-o")
            .arg(target)
            .arg(url)
            .output()
            .await
    }
}

#[derive(Debug)]
struct DownloadError(String);

impl std::fmt::Display for DownloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for DownloadError {}

pub struct YtDlpDownloader<R> {
    runner: R,
}

impl<R> YtDlpDownloader<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl<R: YtDlpRunner> DownloaderPort for YtDlpDownloader<R> {
    async fn fetch(
        &self,
        url: &str,
        dest_dir: &Path,
    ) -> Result<PathBuf, Box<dyn Error + Send + Sync>> {
        // Cheap fast-fail before touching the network; never retried.
        if !url.starts_with(YOUTUBE_URL_PREFIX) {
            return Err(Box::new(DownloadError(format!(
                "Invalid YouTube URL: {}",
                url
            ))));
        }

        let target = dest_dir.join(DOWNLOADED_AUDIO_NAME);
        let mut last_error = String::new();

        for attempt in 1..=DOWNLOAD_ATTEMPTS {
            match self.runner.run_download(url, &target).await {
                Ok(output) if output.status.success() => {
                    // The tool's exit code alone is not trusted.
                    if target.exists() {
                        return Ok(target);
                    }
                    last_error =
                        String::from("downloader exited successfully but produced no file");
                    eprintln!("yt-dlp attempt {}/{}: {}", attempt, DOWNLOAD_ATTEMPTS, last_error);
                }
                Ok(output) => {
                    last_error = String::from_utf8_lossy(&output.stderr).to_string();
                    eprintln!(
                        "yt-dlp attempt {}/{} failed: {}",
                        attempt, DOWNLOAD_ATTEMPTS, last_error
                    );
                }
                Err(e) => {
                    last_error = e.to_string();
                    eprintln!(
                        "yt-dlp attempt {}/{} could not start: {}",
                        attempt, DOWNLOAD_ATTEMPTS, last_error
                    );
                }
            }
        }

        Err(Box::new(DownloadError(format!(
            "Failed to download audio after {} attempts: {}",
            DOWNLOAD_ATTEMPTS, last_error
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;
    use tempfile::tempdir;

    fn create_mock_std_output(stderr_str: &str, success: bool) -> io::Result<Output> {
        Ok(Output {
            status: if success {
                ExitStatus::from_raw(0)
            } else {
                ExitStatus::from_raw(1)
            },
            stdout: Vec::new(),
            stderr: stderr_str.as_bytes().to_vec(),
        })
    }

    #[tokio::test]
    async fn test_invalid_domain_rejected_without_invocation() {
        let mut mock_runner = MockYtDlpRunner::new();
        mock_runner.expect_run_download().times(0);

        let downloader = YtDlpDownloader::new(mock_runner);
        let dir = tempdir().unwrap();
        let err = downloader
            .fetch("https://vimeo.com/12345", dir.path())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid YouTube URL"));
    }

    #[tokio::test]
    async fn test_successful_download_returns_target_path() {
        let mut mock_runner = MockYtDlpRunner::new();
        mock_runner
            .expect_run_download()
            .withf(|url, _| url == "https://www.youtube.com/watch?v=abc")
            .times(1)
            .returning(|_, target| {
                std::fs::write(target, b"m4a bytes").unwrap();
                Box::pin(async move { create_mock_std_output("", true) })
            });

        let downloader = YtDlpDownloader::new(mock_runner);
        let dir = tempdir().unwrap();
        let path = downloader
            .fetch("https://www.youtube.com/watch?v=abc", dir.path())
            .await
            .unwrap();
        assert_eq!(path, dir.path().join(DOWNLOADED_AUDIO_NAME));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_transient_failure_retried_then_succeeds() {
        let mut mock_runner = MockYtDlpRunner::new();
        mock_runner
            .expect_run_download()
            .times(1)
            .returning(|_, _| {
                Box::pin(async move { create_mock_std_output("HTTP Error 503", false) })
            });
        mock_runner
            .expect_run_download()
            .times(1)
            .returning(|_, target| {
                std::fs::write(target, b"m4a bytes").unwrap();
                Box::pin(async move { create_mock_std_output("", true) })
            });

        let downloader = YtDlpDownloader::new(mock_runner);
        let dir = tempdir().unwrap();
        let result = downloader
            .fetch("https://www.youtube.com/watch?v=abc", dir.path())
            .await;
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result.err());
    }

    #[tokio::test]
    async fn test_exhausted_retries_surface_last_stderr() {
        let mut mock_runner = MockYtDlpRunner::new();
        mock_runner
            .expect_run_download()
            .times(DOWNLOAD_ATTEMPTS)
            .returning(|_, _| {
                Box::pin(async move { create_mock_std_output("ERROR: video unavailable", false) })
            });

        let downloader = YtDlpDownloader::new(mock_runner);
        let dir = tempdir().unwrap();
        let err = downloader
            .fetch("https://www.youtube.com/watch?v=abc", dir.path())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("3 attempts"));
        assert!(err.to_string().contains("ERROR: video unavailable"));
    }

    #[tokio::test]
    async fn test_success_exit_without_file_is_not_success() {
        let mut mock_runner = MockYtDlpRunner::new();
        mock_runner
            .expect_run_download()
            .times(DOWNLOAD_ATTEMPTS)
            .returning(|_, _| Box::pin(async move { create_mock_std_output("", true) }));

        let downloader = YtDlpDownloader::new(mock_runner);
        let dir = tempdir().unwrap();
        let err = downloader
            .fetch("https://www.youtube.com/watch?v=abc", dir.path())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("produced no file"));
    }
}
