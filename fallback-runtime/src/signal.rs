//! Per-attempt cancellation signals.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Cancellation signal for one attempt.
///
/// A descriptor `timeout` mints a **fresh** token scoped to that timeout,
/// not derived from the caller's token, so a retry is not pre-doomed by a
/// timeout or abort that already fired against the primary. Without a
/// timeout, the caller's signal passes through unchanged.
pub fn attempt_token(caller: &CancellationToken, timeout: Option<Duration>) -> CancellationToken {
    match timeout {
        Some(duration) => {
            let token = CancellationToken::new();
            let timer = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                timer.cancel();
            });
            token
        }
        None => caller.clone(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
