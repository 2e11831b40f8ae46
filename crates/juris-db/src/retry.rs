//! Bounded re-execution of single-statement writes that lost an
//! optimistic transaction race.
//!
//! A losing writer gets a retryable write conflict rather than the unique
//! index verdict. Nothing from the failed attempt was committed, so the
//! statement is run again until the index decides.

use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::error::DbError;

/// Attempts per write, including the first one.
pub(crate) const MAX_WRITE_ATTEMPTS: u32 = 8;

const BASE_BACKOFF_MS: u64 = 5;

/// Run `op` until it yields something other than [`DbError::Conflict`] or
/// the attempt budget is spent. The last conflict is returned in the
/// latter case.
pub(crate) async fn on_conflict<T, F, Fut>(entity: &str, mut op: F) -> Result<T, DbError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(DbError::Conflict(msg)) if attempt < MAX_WRITE_ATTEMPTS => {
                let jitter = rand::rng().random_range(0..BASE_BACKOFF_MS);
                let delay = BASE_BACKOFF_MS * u64::from(attempt) + jitter;
                debug!(entity, attempt, delay_ms = delay, reason = %msg, "Write conflict, retrying");
                tokio::time::sleep(Duration::from_millis(delay)).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test]
    async fn conflicts_are_retried_until_a_verdict() {
        let calls = AtomicU32::new(0);
        let result = on_conflict("user", || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(DbError::Conflict("write conflict".into()))
            } else {
                Err::<(), _>(DbError::Duplicate {
                    entity: "user".into(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(DbError::Duplicate { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn attempts_are_bounded() {
        let calls = AtomicU32::new(0);
        let result = on_conflict("user", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(DbError::Conflict("write conflict".into()))
        })
        .await;

        assert!(matches!(result, Err(DbError::Conflict(_))));
        assert_eq!(calls.load(Ordering::SeqCst), MAX_WRITE_ATTEMPTS);
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result = on_conflict("user", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(DbError::Query("syntax".into()))
        })
        .await;

        assert!(matches!(result, Err(DbError::Query(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
