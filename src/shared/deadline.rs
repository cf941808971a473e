//! Per-operation deadlines
//!
//! Every lifecycle or aggregation call made on behalf of a request runs under
//! a deadline. When it expires the in-flight future is dropped, which aborts
//! the pending database call and returns its connection to the pool.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::errors::DomainError;

/// Run `operation` with a time limit.
///
/// # Example
/// ```ignore
/// let sub = with_deadline(
///     Duration::from_secs(5),
///     "get_subscription",
///     subscriptions.get(id),
/// ).await?;
/// ```
pub async fn with_deadline<F, T>(
    timeout: Duration,
    operation_name: &'static str,
    operation: F,
) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                operation = operation_name,
                timeout_ms = timeout.as_millis() as u64,
                "Operation deadline exceeded"
            );
            Err(DomainError::Timeout(operation_name))
        }
    }
}
