//! Timeout wrapper for page-level async operations (spec §5 `timeout.page`).

use anyhow::Result;
use std::future::Future;
use std::time::Duration;

/// Wraps `operation` with `tokio::time::timeout`, producing a distinct error
/// message for the timeout case vs. the operation's own failure.
pub async fn with_page_timeout<F, T>(operation: F, timeout_ms: u64, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(Duration::from_millis(timeout_ms), operation).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "{operation_name} timed out after {timeout_ms}ms"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn times_out_slow_operation() {
        let result = with_page_timeout(
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(())
            },
            5,
            "load",
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn passes_through_fast_operation() {
        let result = with_page_timeout(async { Ok(42) }, 1000, "load").await;
        assert_eq!(result.unwrap(), 42);
    }
}
