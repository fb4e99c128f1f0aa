//! Next-model resolution: the ordered fallback list and the protocol that
//! picks which model (if any) handles the next attempt.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use fallback_provider::ModelHandle;
use fallback_provider::RequestOverrides;
use futures::future::BoxFuture;

use crate::ledger::Attempt;
use crate::ledger::AttemptLedger;

/// A retry decision: which model to use next and with what per-attempt
/// parameters.
#[derive(Clone)]
pub struct RetryDescriptor {
    pub model: ModelHandle,
    /// How many total attempts this model identity may receive within one
    /// logical request before the entry stops matching.
    pub max_attempts: u32,
    /// Suspension before the next attempt.
    pub delay: Option<Duration>,
    /// Multiplier applied to `delay` per prior attempt against the same
    /// model identity.
    pub backoff_factor: Option<f64>,
    /// When set, the attempt runs under a fresh cancellation signal scoped
    /// to this timeout instead of the caller's signal.
    pub timeout: Option<Duration>,
    /// Shallow option overrides applied to the base request.
    pub overrides: RequestOverrides,
}

impl RetryDescriptor {
    pub fn new(model: ModelHandle) -> Self {
        Self {
            model,
            max_attempts: 1,
            delay: None,
            backoff_factor: None,
            timeout: None,
            overrides: RequestOverrides::default(),
        }
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = Some(factor);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn overrides(mut self, overrides: RequestOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

impl fmt::Debug for RetryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryDescriptor")
            .field("model", &self.model.identity())
            .field("max_attempts", &self.max_attempts)
            .field("delay", &self.delay)
            .field("backoff_factor", &self.backoff_factor)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Snapshot handed to a retry rule: the attempt being evaluated plus the
/// full history for this logical request. This is the only input a rule may
/// use to decide.
#[derive(Debug, Clone)]
pub struct RetryContext {
    pub current: Attempt,
    pub attempts: Vec<Attempt>,
}

type RuleFn = dyn Fn(RetryContext) -> BoxFuture<'static, Option<RetryDescriptor>> + Send + Sync;

/// One entry in the ordered fallback list.
#[derive(Clone)]
pub enum FallbackEntry {
    /// Bare model: shorthand for "retry this model once on error".
    Model(ModelHandle),
    /// Fixed decision, eligible on errors only.
    Descriptor(RetryDescriptor),
    /// Caller-supplied rule, consulted for both errors and flagged results.
    Rule(Arc<RuleFn>),
}

impl FallbackEntry {
    pub fn model(model: ModelHandle) -> Self {
        Self::Model(model)
    }

    pub fn descriptor(descriptor: RetryDescriptor) -> Self {
        Self::Descriptor(descriptor)
    }

    /// Wrap an async rule function. The rule receives an owned
    /// [`RetryContext`] so its future does not borrow the ledger.
    pub fn rule<F, Fut>(rule: F) -> Self
    where
        F: Fn(RetryContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<RetryDescriptor>> + Send + 'static,
    {
        Self::Rule(Arc::new(move |ctx| Box::pin(rule(ctx))))
    }

    pub fn is_rule(&self) -> bool {
        matches!(self, Self::Rule(_))
    }
}

impl fmt::Debug for FallbackEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model(model) => f.debug_tuple("Model").field(&model.identity()).finish(),
            Self::Descriptor(descriptor) => {
                f.debug_tuple("Descriptor").field(descriptor).finish()
            }
            Self::Rule(_) => f.write_str("Rule(..)"),
        }
    }
}

/// Decide which model (if any) handles the next attempt.
///
/// Entries are evaluated in declaration order. When the current attempt is a
/// **result** (the call succeeded but a rule may deem the outcome
/// undesirable), only rule entries are eligible: a bare model in the list is
/// an implicit "retry on error" shortcut with no way to express "retry on
/// this result". When the current attempt is an **error**, all entries are
/// eligible, with models and static descriptors treated as
/// `max_attempts = 1` shortcuts.
///
/// The first entry that yields a descriptor becomes the candidate; it is
/// accepted only if the ledger holds fewer prior attempts against its model
/// identity than `max_attempts`, otherwise scanning continues so a later
/// entry can still match.
pub async fn resolve_next(
    entries: &[FallbackEntry],
    ledger: &AttemptLedger,
) -> Option<RetryDescriptor> {
    let current = ledger.last()?;
    let result_attempt = matches!(current, Attempt::Completed { .. });

    for entry in entries {
        let candidate = match entry {
            FallbackEntry::Rule(rule) => {
                let ctx = RetryContext {
                    current: current.clone(),
                    attempts: ledger.attempts().to_vec(),
                };
                rule(ctx).await
            }
            _ if result_attempt => continue,
            FallbackEntry::Model(model) => Some(RetryDescriptor::new(model.clone())),
            FallbackEntry::Descriptor(descriptor) => Some(descriptor.clone()),
        };
        let Some(descriptor) = candidate else {
            continue;
        };
        let key = descriptor.model.identity().key();
        if ledger.count_for(&key) < descriptor.max_attempts {
            return Some(descriptor);
        }
        // Budget for this identity is spent; a later entry may still match.
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
