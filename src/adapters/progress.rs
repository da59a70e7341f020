use crate::ports::progress::ProgressSink;

/// Presentation sink that prints job status to stdout, prefixed with the
/// job id so interleaved jobs stay readable.
pub struct LogProgress {
    job_id: String,
}

impl LogProgress {
    pub fn new(job_id: String) -> Self {
        Self { job_id }
    }
}

impl ProgressSink for LogProgress {
    fn report(&self, processed: usize, total: usize) {
        let percent = if total == 0 {
            0.0
        } else {
            processed as f64 / total as f64 * 100.0
        };
        println!(
            "[job {}] progress: {}/{} chunks ({:.0}%)",
            self.job_id, processed, total, percent
        );
    }

    fn status(&self, message: &str) {
        println!("[job {}] {}", self.job_id, message);
    }
}
