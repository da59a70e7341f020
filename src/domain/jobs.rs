use std::path::Path;
use uuid::Uuid;

/// Audio containers accepted for direct upload.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["mp3", "wav", "m4a", "opus"];

/// One user-triggered transcription request.
#[derive(Debug)]
pub struct Job {
    pub id: String,
    pub input: JobInput,
}

impl Job {
    pub fn new(input: JobInput) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            input,
        }
    }
}

#[derive(Debug)]
pub enum JobInput {
    YoutubeUrl(String),
    Uploads(Vec<UploadedFile>),
}

/// An uploaded audio file, held as bytes until the job coordinator writes
/// it into the job workspace.
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Lowercased extension, if it is one of the supported containers.
    pub fn audio_extension(&self) -> Option<String> {
        let ext = Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())?
            .to_lowercase();
        if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
            Some(ext)
        } else {
            None
        }
    }

    /// Rejects empty payloads and unsupported containers before any
    /// pipeline state is created.
    pub fn validate(&self) -> Result<(), String> {
        if self.bytes.is_empty() {
            return Err(format!("Empty upload: {}", self.file_name));
        }
        if self.audio_extension().is_none() {
            return Err(format!(
                "Unsupported audio format: {} (expected one of {:?})",
                self.file_name, SUPPORTED_EXTENSIONS
            ));
        }
        Ok(())
    }
}

/// Reduce a client-supplied filename to its final path component so an
/// upload can never escape the job workspace.
pub fn sanitize_file_name(name: &str) -> String {
    let file_name = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");
    let trimmed = file_name.trim();
    if trimmed.is_empty() {
        String::from("upload")
    } else {
        trimmed.to_string()
    }
}
