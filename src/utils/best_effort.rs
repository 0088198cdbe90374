use std::future::Future;

use crate::error::Result;

/// Runs a non-critical side effect. Failures are logged and swallowed so the
/// primary operation's outcome is never tied to them.
pub async fn run_best_effort<F>(label: &str, task: F)
where
    F: Future<Output = Result<()>>,
{
    if let Err(err) = task.await {
        tracing::warn!(task = label, error = ?err, "best-effort task failed");
    }
}
