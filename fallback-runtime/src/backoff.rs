//! Delay scheduling between attempts.
//!
//! Pure computation plus one suspension helper. Each retry's delay is
//! independent: nothing accumulates across retries unless the caller encodes
//! that in successive descriptors.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::FailoverError;
use crate::rules::RetryDescriptor;

/// The delay to apply before the attempt described by `descriptor`, given
/// how many attempts were already made against that model identity within
/// this request.
///
/// With a backoff factor the delay grows as
/// `delay * factor ^ prior_attempts`, so the first attempt at an identity
/// waits the base delay and repeat attempts wait progressively longer.
pub fn retry_delay(descriptor: &RetryDescriptor, prior_attempts: u32) -> Option<Duration> {
    let base = descriptor.delay?;
    let delay = match descriptor.backoff_factor {
        Some(factor) => base.mul_f64(factor.powi(prior_attempts as i32)),
        None => base,
    };
    Some(delay)
}

/// Suspend until `delay` elapses, or surface cancellation if the caller's
/// signal fires first. An externally cancelled request must stop retrying.
pub async fn wait_before_retry(
    delay: Duration,
    cancel: &CancellationToken,
) -> Result<(), FailoverError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(FailoverError::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::stub_model;

    #[test]
    fn no_delay_configured_means_no_suspension() {
        let descriptor = RetryDescriptor::new(stub_model("openai", "gpt-4o"));
        assert_eq!(retry_delay(&descriptor, 0), None);
        assert_eq!(retry_delay(&descriptor, 5), None);
    }

    #[test]
    fn flat_delay_without_factor() {
        let descriptor = RetryDescriptor::new(stub_model("openai", "gpt-4o"))
            .delay(Duration::from_millis(500));
        assert_eq!(retry_delay(&descriptor, 0), Some(Duration::from_millis(500)));
        assert_eq!(retry_delay(&descriptor, 3), Some(Duration::from_millis(500)));
    }

    #[test]
    fn factor_scales_with_prior_attempts() {
        let descriptor = RetryDescriptor::new(stub_model("openai", "gpt-4o"))
            .delay(Duration::from_millis(100))
            .backoff_factor(2.0);
        assert_eq!(retry_delay(&descriptor, 0), Some(Duration::from_millis(100)));
        assert_eq!(retry_delay(&descriptor, 1), Some(Duration::from_millis(200)));
        assert_eq!(retry_delay(&descriptor, 2), Some(Duration::from_millis(400)));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_elapses_under_paused_time() {
        let started = tokio::time::Instant::now();
        let cancel = CancellationToken::new();
        wait_before_retry(Duration::from_millis(250), &cancel)
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(250));
    }

    #[tokio::test]
    async fn cancelled_signal_interrupts_the_wait() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = wait_before_retry(Duration::from_secs(3600), &cancel).await;
        assert!(matches!(result, Err(FailoverError::Cancelled)));
    }
}
