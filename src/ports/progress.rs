/// One-way, best-effort notification channel towards the presentation
/// layer. No backpressure, no acknowledgment; implementations must not
/// fail the job.
#[cfg_attr(test, mockall::automock)]
pub trait ProgressSink: Send + Sync {
    /// Report that `processed` of `total` segments have been attempted.
    fn report(&self, processed: usize, total: usize);

    /// Free-form status line (stage transitions, warnings, final outcome).
    fn status(&self, message: &str);
}
