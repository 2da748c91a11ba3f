//! Fail-open utilities for detached side effects
//!
//! Audit logging, feedback recording, and other side effects of a primary
//! mutation are explicitly best-effort: they must never roll back, block, or
//! fail the primary operation. Wrap them in these helpers so a failure is
//! logged and swallowed.
//!
//! DO NOT use fail-open for:
//! - Plan execution (business logic)
//! - Hard validators (correctness)
//! - Store reads backing a response (state)

use std::future::Future;
use tracing::warn;

use crate::Result;

/// Execute a side effect that should fail open
///
/// Logs the error via `tracing::warn!` on failure and returns `None`.
///
/// Appropriate for:
/// - Audit trail entries
/// - Feedback-loop interaction records
/// - Metrics/telemetry
pub async fn fail_open<F, Fut, T>(operation_name: &str, f: F) -> Option<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match f().await {
        Ok(val) => Some(val),
        Err(e) => {
            warn!(operation = operation_name, error = %e, "side effect failed (fail-open)");
            None
        }
    }
}

/// Like [`fail_open`] but with linear-backoff retries
///
/// Retries the operation up to `max_retries` times; the backoff duration is
/// `100ms * attempt`. Used for the interaction memory store, where transient
/// write failures are common enough to be worth one or two retries.
pub async fn fail_open_with_retries<F, Fut, T>(
    operation_name: &str,
    mut f: F,
    max_retries: usize,
) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    for attempt in 1..=max_retries {
        match f().await {
            Ok(val) => return Some(val),
            Err(e) => {
                if attempt == max_retries {
                    warn!(
                        operation = operation_name,
                        retries = max_retries,
                        error = %e,
                        "side effect failed after retries (fail-open)"
                    );
                    return None;
                }
                warn!(
                    operation = operation_name,
                    attempt,
                    max_retries,
                    error = %e,
                    "side effect failed, retrying"
                );
                let delay_ms = 100 * attempt as u64;
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AtelierError;

    async fn append_audit_row(outcome: Result<&'static str>) -> Result<&'static str> {
        outcome
    }

    #[tokio::test]
    async fn test_audit_write_lands_when_store_is_up() {
        let landed =
            fail_open("modification_audit", || append_audit_row(Ok("revised"))).await;
        assert_eq!(landed, Some("revised"));
    }

    #[tokio::test]
    async fn test_failed_audit_write_never_surfaces() {
        let landed = fail_open("modification_audit", || {
            append_audit_row(Err(AtelierError::Store(
                "modification table unavailable".to_string(),
            )))
        })
        .await;
        assert!(landed.is_none());
    }

    #[tokio::test]
    async fn test_feedback_write_lands_on_second_attempt() {
        let mut writes = 0u32;
        let landed = fail_open_with_retries(
            "feedback_memory",
            || {
                writes += 1;
                let write = writes;
                async move {
                    match write {
                        1 => Err(AtelierError::Store("feedback store busy".to_string())),
                        n => Ok(n),
                    }
                }
            },
            3,
        )
        .await;
        assert_eq!(landed, Some(2));
    }

    #[tokio::test]
    async fn test_feedback_write_gives_up_at_the_bound() {
        let mut writes = 0u32;
        let landed = fail_open_with_retries(
            "feedback_memory",
            || {
                writes += 1;
                async move {
                    Err::<u32, _>(AtelierError::Store("feedback store down".to_string()))
                }
            },
            2,
        )
        .await;
        assert!(landed.is_none());
        // Bounded: exactly max_retries attempts, never more
        assert_eq!(writes, 2);
    }
}
