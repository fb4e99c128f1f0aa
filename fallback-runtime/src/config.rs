use std::fmt;
use std::sync::Arc;

use fallback_provider::ModelHandle;

use crate::rules::FallbackEntry;
use crate::rules::RetryContext;
use crate::sticky::StickyReset;

/// Per-request kill switch: when it evaluates to `true`, the entire retry
/// loop collapses to a single primary-only attempt.
#[derive(Clone)]
pub enum Disabled {
    Flag(bool),
    /// Evaluated once per logical request.
    Predicate(Arc<dyn Fn() -> bool + Send + Sync>),
}

impl Disabled {
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(predicate))
    }

    pub fn evaluate(&self) -> bool {
        match self {
            Self::Flag(flag) => *flag,
            Self::Predicate(predicate) => predicate(),
        }
    }
}

impl Default for Disabled {
    fn default() -> Self {
        Self::Flag(false)
    }
}

impl From<bool> for Disabled {
    fn from(flag: bool) -> Self {
        Self::Flag(flag)
    }
}

impl fmt::Debug for Disabled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(flag) => f.debug_tuple("Flag").field(flag).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Side-effect hook invoked with the retry context. Hooks run synchronously;
/// `on_error` always fires strictly before the corresponding `on_retry`.
pub type HookFn = dyn Fn(&RetryContext) + Send + Sync;

/// Caller-facing configuration for a failover wrapper.
pub struct FailoverConfig {
    /// The primary model every logical request starts from (unless a sticky
    /// window substitutes a previous winner).
    pub model: ModelHandle,
    /// Ordered fallback list: plain models, static descriptors, and rules.
    pub retries: Vec<FallbackEntry>,
    pub disabled: Disabled,
    pub reset: StickyReset,
    pub on_error: Option<Arc<HookFn>>,
    pub on_retry: Option<Arc<HookFn>>,
}

impl FailoverConfig {
    pub fn new(model: ModelHandle) -> Self {
        Self {
            model,
            retries: Vec::new(),
            disabled: Disabled::default(),
            reset: StickyReset::default(),
            on_error: None,
            on_retry: None,
        }
    }

    pub fn retries(mut self, retries: Vec<FallbackEntry>) -> Self {
        self.retries = retries;
        self
    }

    pub fn disabled(mut self, disabled: impl Into<Disabled>) -> Self {
        self.disabled = disabled.into();
        self
    }

    pub fn reset(mut self, reset: StickyReset) -> Self {
        self.reset = reset;
        self
    }

    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&RetryContext) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    pub fn on_retry<F>(mut self, hook: F) -> Self
    where
        F: Fn(&RetryContext) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(hook));
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::stub_model;
    use std::sync::atomic::AtomicU32;
    use std::sync::atomic::Ordering;

    #[test]
    fn flag_evaluates_directly() {
        assert!(!Disabled::default().evaluate());
        assert!(Disabled::from(true).evaluate());
    }

    #[test]
    fn predicate_is_evaluated_each_time() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let disabled = Disabled::predicate(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });
        assert!(disabled.evaluate());
        assert!(disabled.evaluate());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn config_defaults_are_inert() {
        let config = FailoverConfig::new(stub_model("openai", "gpt-4o"));
        assert!(config.retries.is_empty());
        assert!(!config.disabled.evaluate());
        assert_eq!(config.reset, StickyReset::AfterRequest);
        assert!(config.on_error.is_none());
        assert!(config.on_retry.is_none());
    }
}
