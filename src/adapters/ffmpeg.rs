use crate::domain::chunks::SEGMENT_PATTERN;
use crate::ports::transcoder::TranscoderPort;
use async_trait::async_trait;
use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command as TokioCommand;

// Raw command execution behind a trait so the adapter logic is testable
// without an ffmpeg binary on the machine.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait FfmpegRunner: Send + Sync {
    async fn run_compress(
        &self,
        input: &Path,
        output: &Path,
        bitrate_kbps: u32,
    ) -> io::Result<Output>;

    async fn run_split(
        &self,
        input: &Path,
        output_pattern: &Path,
        chunk_seconds: u32,
    ) -> io::Result<Output>;
}

pub struct RealFfmpegRunner {
    binary: PathBuf,
}

impl RealFfmpegRunner {
    pub fn new(binary: PathBuf) -> Self {
        ensure_executable(&binary);
        Self { binary }
    }
}

#[async_trait]
impl FfmpegRunner for RealFfmpegRunner {
    async fn run_compress(
        &self,
        input: &Path,
        output: &Path,
        bitrate_kbps: u32,
    ) -> io::Result<Output> {
        // 16 kHz mono is the rate the speech model ingests, pinned here so
        // every downstream artifact is already normalized.
        TokioCommand::new(&self.binary)
            .arg("-y")
            .arg("-i")
            .arg(input)
            .arg("-ar")
            .arg("16000")
            .arg("-ac")
            .arg("1")
            .arg("-b:a")
            .arg(format!("{}k", bitrate_kbps))
            .arg(output)
            .output()
            .await
    }

    async fn run_split(
        &self,
        input: &Path,
        output_pattern: &Path,
        chunk_seconds: u32,
    ) -> io::Result<Output> {
        TokioCommand::new(&self.binary)
            .arg("-y")
            .arg("-i")
            .arg(input)
            .arg("-f")
            .arg("segment")
            .arg("-segment_time")
            .arg(chunk_seconds.to_string())
            .arg("-c:a")
            .arg("libmp3lame")
            .arg("-ar")
            .arg("16000")
            .arg("-ac")
            .arg("1")
            .arg(output_pattern)
            .output()
            .await
    }
}

/// A bundled ffmpeg binary may land without execute bits (e.g. unpacked
/// from an archive). Fix that up where the platform needs it; a PATH
/// lookup name or a missing file is left alone.
fn ensure_executable(binary: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = std::fs::metadata(binary) {
            let mut permissions = metadata.permissions();
            if permissions.mode() & 0o111 == 0 {
                permissions.set_mode(0o755);
                if let Err(e) = std::fs::set_permissions(binary, permissions) {
                    eprintln!("Could not mark {:?} executable: {}", binary, e);
                }
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = binary;
    }
}

#[derive(Debug)]
struct FfmpegError(String);

impl std::fmt::Display for FfmpegError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for FfmpegError {}

pub struct FfmpegTranscoder<R> {
    runner: R,
}

impl<R> FfmpegTranscoder<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl<R: FfmpegRunner> TranscoderPort for FfmpegTranscoder<R> {
    async fn compress(
        &self,
        input: &Path,
        output: &Path,
        bitrate_kbps: u32,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let result = self
            .runner
            .run_compress(input, output, bitrate_kbps)
            .await
            .map_err(|e| FfmpegError(format!("ffmpeg compress failed to start: {}", e)))?;

        if !result.status.success() {
            let err_msg = format!(
                "Error compressing {:?} at {}k: {}",
                input,
                bitrate_kbps,
                String::from_utf8_lossy(&result.stderr)
            );
            eprintln!("{}", err_msg);
            return Err(Box::new(FfmpegError(err_msg)));
        }

        // A zero-length output with exit code 0 means silent truncation.
        let output_len = tokio::fs::metadata(output).await.map(|m| m.len()).unwrap_or(0);
        if output_len == 0 {
            let err_msg = format!(
                "ffmpeg reported success but produced no output at {:?}",
                output
            );
            eprintln!("{}", err_msg);
            return Err(Box::new(FfmpegError(err_msg)));
        }

        Ok(())
    }

    async fn split(
        &self,
        input: &Path,
        output_dir: &Path,
        chunk_seconds: u32,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let pattern = output_dir.join(SEGMENT_PATTERN);
        let result = self
            .runner
            .run_split(input, &pattern, chunk_seconds)
            .await
            .map_err(|e| FfmpegError(format!("ffmpeg split failed to start: {}", e)))?;

        if !result.status.success() {
            let err_msg = format!(
                "Error splitting {:?} into {}s segments: {}",
                input,
                chunk_seconds,
                String::from_utf8_lossy(&result.stderr)
            );
            eprintln!("{}", err_msg);
            return Err(Box::new(FfmpegError(err_msg)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;
    use tempfile::tempdir;

    fn create_mock_std_output(stdout_str: &str, stderr_str: &str, success: bool) -> io::Result<Output> {
        Ok(Output {
            status: if success {
                ExitStatus::from_raw(0)
            } else {
                ExitStatus::from_raw(1)
            },
            stdout: stdout_str.as_bytes().to_vec(),
            stderr: stderr_str.as_bytes().to_vec(),
        })
    }

    #[tokio::test]
    async fn test_compress_success() {
        let dir = tempdir().unwrap();
        let output_path = dir.path().join("compressed.mp3");

        let mut mock_runner = MockFfmpegRunner::new();
        mock_runner
            .expect_run_compress()
            .withf(|_, _, bitrate| *bitrate == 48)
            .times(1)
            .returning(|_, output, _| {
                std::fs::write(output, b"encoded audio").unwrap();
                Box::pin(async move { create_mock_std_output("", "", true) })
            });

        let transcoder = FfmpegTranscoder::new(mock_runner);
        let result = transcoder
            .compress(Path::new("in.m4a"), &output_path, 48)
            .await;
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result.err());
    }

    #[tokio::test]
    async fn test_compress_nonzero_exit_surfaces_stderr() {
        let dir = tempdir().unwrap();
        let output_path = dir.path().join("compressed.mp3");

        let mut mock_runner = MockFfmpegRunner::new();
        mock_runner
            .expect_run_compress()
            .times(1)
            .returning(|_, _, _| {
                Box::pin(async move { create_mock_std_output("", "unknown codec", false) })
            });

        let transcoder = FfmpegTranscoder::new(mock_runner);
        let err = transcoder
            .compress(Path::new("in.m4a"), &output_path, 48)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unknown codec"));
    }

    #[tokio::test]
    async fn test_compress_rejects_missing_output() {
        let dir = tempdir().unwrap();
        let output_path = dir.path().join("compressed.mp3");

        let mut mock_runner = MockFfmpegRunner::new();
        mock_runner
            .expect_run_compress()
            .times(1)
            .returning(|_, _, _| Box::pin(async move { create_mock_std_output("", "", true) }));

        let transcoder = FfmpegTranscoder::new(mock_runner);
        let err = transcoder
            .compress(Path::new("in.m4a"), &output_path, 48)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("produced no output"));
    }

    #[tokio::test]
    async fn test_compress_rejects_empty_output() {
        let dir = tempdir().unwrap();
        let output_path = dir.path().join("compressed.mp3");

        let mut mock_runner = MockFfmpegRunner::new();
        mock_runner
            .expect_run_compress()
            .times(1)
            .returning(|_, output, _| {
                std::fs::write(output, b"").unwrap();
                Box::pin(async move { create_mock_std_output("", "", true) })
            });

        let transcoder = FfmpegTranscoder::new(mock_runner);
        assert!(transcoder
            .compress(Path::new("in.m4a"), &output_path, 48)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_split_passes_segment_pattern() {
        let dir = tempdir().unwrap();
        let seg_dir = dir.path().to_path_buf();
        let expected_pattern = seg_dir.join(SEGMENT_PATTERN);

        let mut mock_runner = MockFfmpegRunner::new();
        mock_runner
            .expect_run_split()
            .withf(move |_, pattern, seconds| pattern == expected_pattern.as_path() && *seconds == 300)
            .times(1)
            .returning(|_, _, _| Box::pin(async move { create_mock_std_output("", "", true) }));

        let transcoder = FfmpegTranscoder::new(mock_runner);
        let result = transcoder
            .split(Path::new("compressed.mp3"), &seg_dir, 300)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_split_nonzero_exit_is_error() {
        let dir = tempdir().unwrap();

        let mut mock_runner = MockFfmpegRunner::new();
        mock_runner.expect_run_split().times(1).returning(|_, _, _| {
            Box::pin(async move { create_mock_std_output("", "segment muxer error", false) })
        });

        let transcoder = FfmpegTranscoder::new(mock_runner);
        let err = transcoder
            .split(Path::new("compressed.mp3"), dir.path(), 300)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("segment muxer error"));
    }

    #[tokio::test]
    async fn test_compress_spawn_failure_is_error() {
        let mut mock_runner = MockFfmpegRunner::new();
        mock_runner
            .expect_run_compress()
            .times(1)
            .returning(|_, _, _| {
                Box::pin(async move {
                    Err(io::Error::new(io::ErrorKind::NotFound, "ffmpeg not found"))
                })
            });

        let transcoder = FfmpegTranscoder::new(mock_runner);
        let err = transcoder
            .compress(Path::new("in.m4a"), Path::new("out.mp3"), 48)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to start"));
    }
}
