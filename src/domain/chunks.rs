use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};

/// ffmpeg output pattern for the segmenter. Zero-padded ordinals keep
/// lexicographic order equal to numeric order.
pub const SEGMENT_PATTERN: &str = "chunk_%03d.mp3";

/// Enumerate segment files in ascending ordinal order. Only files matching
/// the segmenter naming convention are considered; anything else in the
/// directory (e.g. normalized per-chunk artifacts) is ignored.
pub fn ordered_segments(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let re = Regex::new(r"^chunk_\d{3}\.mp3$").unwrap();
    let mut segments: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| re.is_match(name))
                .unwrap_or(false)
        })
        .collect();
    segments.sort();
    Ok(segments)
}

/// Header line identifying one transcript chunk and the nominal minute
/// range it covers. The range is derived arithmetically from the chunk
/// duration, so the last chunk's label may overshoot its true length
/// (0-5, 5-10, 10-15 for a 12-minute input at 300s chunking).
pub fn chunk_header(index: usize, chunk_seconds: u32) -> String {
    let minutes = chunk_seconds as f64 / 60.0;
    let start = index as f64 * minutes;
    let end = (index + 1) as f64 * minutes;
    format!(
        "--- Chunk {} ({}-{} min) ---",
        index,
        fmt_minutes(start),
        fmt_minutes(end)
    )
}

fn fmt_minutes(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as u64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_chunk_header_default_five_minute_labels() {
        assert_eq!(chunk_header(0, 300), "--- Chunk 0 (0-5 min) ---");
        assert_eq!(chunk_header(1, 300), "--- Chunk 1 (5-10 min) ---");
        assert_eq!(chunk_header(2, 300), "--- Chunk 2 (10-15 min) ---");
    }

    #[test]
    fn test_chunk_header_follows_configured_duration() {
        assert_eq!(chunk_header(0, 600), "--- Chunk 0 (0-10 min) ---");
        assert_eq!(chunk_header(3, 60), "--- Chunk 3 (3-4 min) ---");
        // Non-whole-minute durations keep the fractional label
        assert_eq!(chunk_header(0, 90), "--- Chunk 0 (0-1.5 min) ---");
    }

    #[test]
    fn test_ordered_segments_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        for name in [
            "chunk_002.mp3",
            "chunk_000.mp3",
            "chunk_010.mp3",
            "chunk_001.mp3",
            "chunk_000.norm.mp3",
            "compressed.mp3",
            "notes.txt",
        ] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let segments = ordered_segments(dir.path()).unwrap();
        let names: Vec<String> = segments
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["chunk_000.mp3", "chunk_001.mp3", "chunk_002.mp3", "chunk_010.mp3"]
        );
    }

    #[test]
    fn test_ordered_segments_empty_dir() {
        let dir = tempdir().unwrap();
        assert!(ordered_segments(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_ordered_segments_missing_dir_is_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(ordered_segments(&missing).is_err());
    }
}
