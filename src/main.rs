use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use caruso::adapters::{
    FfmpegTranscoder, LogProgress, RealFfmpegRunner, RealYtDlpRunner, WhisperEngine,
    YtDlpDownloader,
};
use caruso::application::coordinator::{JobError, JobService};
use caruso::application::pipeline::ChunkPipeline;
use caruso::config::Config;
use caruso::domain::jobs::{Job, JobInput, UploadedFile};
use dotenv::dotenv;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;

type Service = JobService<
    YtDlpDownloader<RealYtDlpRunner>,
    FfmpegTranscoder<RealFfmpegRunner>,
    WhisperEngine,
>;

#[derive(Clone)]
struct AppState {
    service: Arc<Service>,
    job_slots: Arc<Semaphore>,
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt::init();

    let config = Config::from_env();

    if let Err(e) = std::fs::create_dir_all(&config.work_dir) {
        eprintln!("Failed to create work dir {:?}: {}", config.work_dir, e);
        std::process::exit(1);
    }

    // Load the model once; it is shared by every job.
    let engine = match WhisperEngine::load(&config.whisper_model_path) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    println!("Loaded whisper model from {:?}", config.whisper_model_path);

    let transcoder = FfmpegTranscoder::new(RealFfmpegRunner::new(config.ffmpeg_path.clone()));
    let downloader = YtDlpDownloader::new(RealYtDlpRunner::new(config.ytdlp_path.clone()));
    let pipeline =
        ChunkPipeline::new(transcoder, engine, config.bitrate_kbps, config.chunk_seconds);
    let service = Arc::new(JobService::new(
        downloader,
        pipeline,
        config.work_dir.clone(),
    ));

    let state = AppState {
        service,
        job_slots: Arc::new(Semaphore::new(config.max_concurrent_jobs)),
    };

    let app = Router::new()
        .route("/", get(index))
        .route("/transcribe/upload", post(transcribe_upload))
        .route("/transcribe/youtube", post(transcribe_youtube))
        .layer(DefaultBodyLimit::disable())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", config.addr, config.port))
        .await
        .expect("Failed to bind TCP listener");
    println!("Listening at {}:{}", config.addr, config.port);
    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}

#[derive(Debug, Deserialize)]
struct YoutubeRequest {
    url: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

// Handler that accepts a multipart form upload of one or more audio files
// and responds with the packaged transcription archive.
async fn transcribe_upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut files = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let file_name = if let Some(file_name) = field.file_name() {
            file_name.to_owned()
        } else {
            continue;
        };
        match field.bytes().await {
            Ok(bytes) => files.push(UploadedFile {
                file_name,
                bytes: bytes.to_vec(),
            }),
            Err(e) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read upload: {}", e),
                )
            }
        }
    }

    run_job(&state, JobInput::Uploads(files), "all_transcriptions.zip").await
}

async fn transcribe_youtube(
    State(state): State<AppState>,
    Form(request): Form<YoutubeRequest>,
) -> Response {
    run_job(
        &state,
        JobInput::YoutubeUrl(request.url),
        "transcription_output.zip",
    )
    .await
}

async fn run_job(state: &AppState, input: JobInput, download_name: &str) -> Response {
    let _slot = match state.job_slots.clone().acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => {
            return error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                String::from("Server is shutting down"),
            )
        }
    };

    let job = Job::new(input);
    let progress = LogProgress::new(job.id.clone());

    match state.service.run(job, &progress).await {
        Ok(zip_path) => {
            let bytes = match tokio::fs::read(&zip_path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    return error_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Failed to read archive: {}", e),
                    )
                }
            };
            // The archive has been handed over; nothing of the job remains.
            let _ = tokio::fs::remove_file(&zip_path).await;

            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, String::from("application/zip")),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", download_name),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            let status = match &e {
                JobError::NoInput | JobError::InvalidUpload(_) | JobError::Download(_) => {
                    StatusCode::BAD_REQUEST
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            error_response(status, e.to_string())
        }
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorBody { error: message })).into_response()
}

async fn index() -> Html<&'static str> {
    Html(
        r#"
        <!doctype html>
        <html>
            <head>
                <title>Caruso - Audio Transcription</title>
            </head>
            <body>
                <h1>Transcribe audio files</h1>
                <p>Supported formats: MP3, WAV, M4A, OPUS.</p>
                <form action="/transcribe/upload" method="post" enctype="multipart/form-data">
                    <div>
                        <label>
                            Audio files:
                            <input type="file" name="file" multiple>
                        </label>
                    </div>
                    <div>
                        <input type="submit" value="Upload and Transcribe">
                    </div>
                </form>
                <h2>Transcribe a YouTube video</h2>
                <form action="/transcribe/youtube" method="post">
                    <div>
                        <label>
                            Video URL:
                            <input type="text" name="url" size="60">
                        </label>
                    </div>
                    <div>
                        <input type="submit" value="Download and Transcribe">
                    </div>
                </form>
            </body>
        </html>
        "#,
    )
}
