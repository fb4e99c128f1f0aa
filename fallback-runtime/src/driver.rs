//! Internal attempt state machine shared by the non-streaming and streaming
//! orchestrators: record an outcome, consult the resolver, prepare the next
//! attempt (hooks, delay, fresh signal, merged options), or report why the
//! loop must stop.

use std::sync::Arc;

use fallback_provider::GenerateRequest;
use fallback_provider::GenerateResponse;
use fallback_provider::ModelError;
use fallback_provider::ModelHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::backoff::retry_delay;
use crate::backoff::wait_before_retry;
use crate::config::HookFn;
use crate::error::FailoverError;
use crate::ledger::Attempt;
use crate::ledger::AttemptLedger;
use crate::rules::FallbackEntry;
use crate::rules::RetryContext;
use crate::rules::resolve_next;
use crate::signal::attempt_token;

pub(crate) struct AttemptDriver {
    entries: Vec<FallbackEntry>,
    on_error: Option<Arc<HookFn>>,
    on_retry: Option<Arc<HookFn>>,
    /// The caller's original request; every attempt merges overrides on top
    /// of this, never on top of a previous attempt's merged options.
    base: GenerateRequest,
    pub(crate) caller_cancel: CancellationToken,
    pub(crate) ledger: AttemptLedger,
    /// Model for the current attempt.
    pub(crate) model: ModelHandle,
    /// Merged options for the current attempt.
    pub(crate) request: GenerateRequest,
    /// Whether any retry happened during this logical request.
    pub(crate) retried: bool,
}

impl AttemptDriver {
    pub(crate) fn new(
        entries: Vec<FallbackEntry>,
        on_error: Option<Arc<HookFn>>,
        on_retry: Option<Arc<HookFn>>,
        model: ModelHandle,
        request: GenerateRequest,
    ) -> Self {
        Self {
            entries,
            on_error,
            on_retry,
            base: request.clone(),
            caller_cancel: request.cancel.clone(),
            ledger: AttemptLedger::new(),
            model,
            request,
            retried: false,
        }
    }

    pub(crate) fn cancelled(&self) -> bool {
        self.caller_cancel.is_cancelled()
    }

    /// Record a thrown error and fire the `on_error` hook.
    pub(crate) fn record_error(&mut self, error: ModelError) {
        debug!(model = %self.model.identity(), %error, "model attempt failed");
        self.ledger.push(Attempt::Errored {
            model: self.model.clone(),
            error,
        });
        self.fire_on_error();
    }

    /// Record a successful result so rules can flag it. No hook fires here;
    /// a flagged result is not an error.
    pub(crate) fn record_flagged(&mut self, response: GenerateResponse) {
        self.ledger.push(Attempt::Completed {
            model: self.model.clone(),
            response,
        });
    }

    /// Consult the resolver and, when it yields a next model, prepare the
    /// next attempt: fire `on_retry`, apply the delay, mint the attempt
    /// signal, and merge option overrides onto the base request.
    ///
    /// Returns `Ok(true)` when a next attempt is ready, `Ok(false)` when
    /// resolution failed and the caller must surface the terminal outcome.
    pub(crate) async fn advance(&mut self) -> Result<bool, FailoverError> {
        let Some(descriptor) = resolve_next(&self.entries, &self.ledger).await else {
            return Ok(false);
        };

        self.fire_on_retry();
        let target = descriptor.model.identity();
        debug!(from = %self.model.identity(), to = %target, "retrying with next model");

        let prior_attempts = self.ledger.count_for(&target.key());
        if let Some(delay) = retry_delay(&descriptor, prior_attempts) {
            wait_before_retry(delay, &self.caller_cancel).await?;
        }

        let mut next = self.base.clone();
        descriptor.overrides.apply(&mut next);
        next.cancel = attempt_token(&self.caller_cancel, descriptor.timeout);

        self.request = next;
        self.model = descriptor.model;
        self.retried = true;
        Ok(true)
    }

    /// Terminal error for the non-streaming path: a first-attempt failure
    /// with no matching rule propagates the original error untouched; any
    /// later failure aggregates the full history.
    pub(crate) fn terminal_error(&self, original: ModelError) -> FailoverError {
        if self.ledger.len() <= 1 {
            FailoverError::Model(original)
        } else {
            FailoverError::Exhausted {
                failures: self.ledger.failures(),
            }
        }
    }

    /// Terminal error for the streaming path, where exhaustion is forwarded
    /// as an error event rather than a rejected future.
    pub(crate) fn terminal_stream_error(&self, original: ModelError) -> ModelError {
        if self.ledger.len() <= 1 {
            return original;
        }
        let failures = self.ledger.failures();
        let summary: Vec<String> = failures.iter().map(|failure| failure.to_string()).collect();
        ModelError::new(format!(
            "all models exhausted after {} attempts: {}",
            failures.len(),
            summary.join("; ")
        ))
    }

    fn fire_on_error(&self) {
        if let Some(hook) = &self.on_error {
            self.fire(hook);
        }
    }

    fn fire_on_retry(&self) {
        if let Some(hook) = &self.on_retry {
            self.fire(hook);
        }
    }

    fn fire(&self, hook: &Arc<HookFn>) {
        if let Some(current) = self.ledger.last() {
            let ctx = RetryContext {
                current: current.clone(),
                attempts: self.ledger.attempts().to_vec(),
            };
            hook(&ctx);
        }
    }
}
