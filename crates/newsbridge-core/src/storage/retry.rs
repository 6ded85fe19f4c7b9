//! Retry helper for transient SQLite failures.
//!
//! With WAL and a separate CLI process sharing the file, writes can hit
//! SQLITE_BUSY/SQLITE_LOCKED despite the busy timeout. Those are worth
//! one short backoff loop; everything else surfaces immediately.

use std::future::Future;
use std::time::Duration;

const MAX_RETRIES: u32 = 3;
const BASE_DELAY_MS: u64 = 200;

fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.to_string());
            matches!(code.as_deref(), Some("5") | Some("6") | Some("1032"))
        }
        _ => false,
    }
}

/// Run a write, retrying transient lock errors with doubling backoff.
pub async fn write_with_retry<F, Fut, T>(operation: F) -> std::result::Result<T, sqlx::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = std::result::Result<T, sqlx::Error>>,
{
    let mut attempts = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if is_transient(&e) && attempts < MAX_RETRIES => {
                attempts += 1;
                let delay = Duration::from_millis(BASE_DELAY_MS * 2u64.pow(attempts - 1));
                tracing::debug!(
                    error = %e,
                    attempt = attempts,
                    delay_ms = delay.as_millis(),
                    "Transient database error, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
