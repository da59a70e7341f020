use crate::application::pipeline::{ChunkPipeline, PipelineError};
use crate::domain::archive;
use crate::domain::jobs::{sanitize_file_name, Job, JobInput};
use crate::domain::workspace::Workspace;
use crate::ports::downloader::DownloaderPort;
use crate::ports::progress::ProgressSink;
use crate::ports::transcoder::TranscoderPort;
use crate::ports::transcriber::TranscriberPort;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;

#[derive(Debug)]
pub enum JobError {
    NoInput,
    InvalidUpload(String),
    Download(String),
    Pipeline(PipelineError),
    Io(String),
    Package(String),
}

impl std::fmt::Display for JobError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            JobError::NoInput => write!(f, "No audio input provided"),
            JobError::InvalidUpload(e) => write!(f, "Invalid file upload: {}", e),
            JobError::Download(e) => write!(f, "Failed to download audio: {}", e),
            JobError::Pipeline(e) => write!(f, "{}", e),
            JobError::Io(e) => write!(f, "Workspace error: {}", e),
            JobError::Package(e) => write!(f, "Failed to create ZIP file: {}", e),
        }
    }
}

impl Error for JobError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            JobError::Pipeline(e) => Some(e),
            _ => None,
        }
    }
}

/// Owns one job's lifecycle: workspace allocation, input resolution,
/// pipeline invocation per input file, packaging, and teardown.
///
/// The workspace guard guarantees the temporary directory is removed on
/// every exit path, including an unexpected fault propagating out of the
/// pipeline. Only the packaged archive, written outside the workspace,
/// survives the job.
pub struct JobService<D, T, M> {
    downloader: D,
    pipeline: ChunkPipeline<T, M>,
    work_dir: PathBuf,
}

impl<D, T, M> JobService<D, T, M>
where
    D: DownloaderPort,
    T: TranscoderPort,
    M: TranscriberPort,
{
    pub fn new(downloader: D, pipeline: ChunkPipeline<T, M>, work_dir: PathBuf) -> Self {
        Self {
            downloader,
            pipeline,
            work_dir,
        }
    }

    /// Run one job to completion and return the packaged archive path.
    pub async fn run(&self, job: Job, progress: &dyn ProgressSink) -> Result<PathBuf, JobError> {
        let workspace = Workspace::create(&self.work_dir, &job.id)
            .map_err(|e| JobError::Io(e.to_string()))?;

        let result = self.execute(&job, &workspace, progress).await;

        match &result {
            Ok(_) => progress.status("Transcription completed successfully"),
            Err(e) => progress.status(&format!("Transcription failed: {}", e)),
        }
        result
    }

    async fn execute(
        &self,
        job: &Job,
        workspace: &Workspace,
        progress: &dyn ProgressSink,
    ) -> Result<PathBuf, JobError> {
        let inputs = self.resolve_inputs(&job.input, workspace, progress).await?;
        if inputs.is_empty() {
            return Err(JobError::NoInput);
        }

        let output_dir = workspace.join("transcripts");
        fs::create_dir_all(&output_dir)
            .await
            .map_err(|e| JobError::Io(e.to_string()))?;

        for raw in &inputs {
            let stem = raw
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("audio")
                .to_string();
            progress.status(&format!("Transcribing {}...", stem));

            let transcript = output_dir.join(format!("{}.txt", stem));
            let report = self
                .pipeline
                .run(raw, workspace.path(), &transcript, progress)
                .await
                .map_err(JobError::Pipeline)?;

            if report.transcribed_chunks < report.total_segments {
                progress.status(&format!(
                    "Warning: {} of {} chunks missing from {}.txt",
                    report.total_segments - report.transcribed_chunks,
                    report.total_segments,
                    stem
                ));
            }
        }

        let archive_path = self.work_dir.join(format!("transcripts_{}.zip", job.id));
        let src = output_dir.clone();
        let dst = archive_path.clone();
        tokio::task::spawn_blocking(move || archive::create_zip(&src, &dst))
            .await
            .map_err(|e| JobError::Package(e.to_string()))?
            .map_err(|e| JobError::Package(e.to_string()))?;

        Ok(archive_path)
    }

    async fn resolve_inputs(
        &self,
        input: &JobInput,
        workspace: &Workspace,
        progress: &dyn ProgressSink,
    ) -> Result<Vec<PathBuf>, JobError> {
        match input {
            JobInput::YoutubeUrl(url) => {
                progress.status("Downloading audio...");
                let path = self
                    .downloader
                    .fetch(url, workspace.path())
                    .await
                    .map_err(|e| JobError::Download(e.to_string()))?;
                Ok(vec![path])
            }
            JobInput::Uploads(files) => {
                if files.is_empty() {
                    return Err(JobError::NoInput);
                }
                let mut saved = Vec::with_capacity(files.len());
                for (index, file) in files.iter().enumerate() {
                    file.validate().map_err(JobError::InvalidUpload)?;
                    // Index prefix keeps same-named uploads apart
                    let name = format!("{:02}_{}", index, sanitize_file_name(&file.file_name));
                    let path = workspace.join(&name);
                    fs::write(&path, &file.bytes)
                        .await
                        .map_err(|e| JobError::Io(e.to_string()))?;
                    saved.push(path);
                }
                Ok(saved)
            }
        }
    }
}
