//! The public failover wrapper and its non-streaming attempt loop.

use std::sync::Arc;

use fallback_provider::GenerateRequest;
use fallback_provider::GenerateResponse;
use fallback_provider::ModelHandle;
use tracing::debug;

use crate::config::Disabled;
use crate::config::FailoverConfig;
use crate::config::HookFn;
use crate::driver::AttemptDriver;
use crate::error::FailoverError;
use crate::rules::FallbackEntry;
use crate::sticky::StickyManager;

/// Wraps a primary model with a fallback-and-retry policy.
///
/// One `FailoverModel` serves many concurrent logical requests; each request
/// owns its own attempt ledger, while the sticky window is shared and
/// updated atomically per request.
pub struct FailoverModel {
    pub(crate) primary: ModelHandle,
    pub(crate) entries: Vec<FallbackEntry>,
    pub(crate) disabled: Disabled,
    pub(crate) on_error: Option<Arc<HookFn>>,
    pub(crate) on_retry: Option<Arc<HookFn>>,
    pub(crate) sticky: Arc<StickyManager>,
}

impl FailoverModel {
    pub fn new(config: FailoverConfig) -> Self {
        Self {
            primary: config.model,
            entries: config.retries,
            disabled: config.disabled,
            on_error: config.on_error,
            on_retry: config.on_retry,
            sticky: Arc::new(StickyManager::new(config.reset)),
        }
    }

    pub fn primary(&self) -> &ModelHandle {
        &self.primary
    }

    /// Drive one non-streaming logical request to completion.
    pub async fn generate(
        &self,
        request: GenerateRequest,
    ) -> Result<GenerateResponse, FailoverError> {
        if self.disabled.evaluate() {
            debug!("failover disabled, single primary attempt");
            return self
                .primary
                .generate(request)
                .await
                .map_err(FailoverError::Model);
        }

        let has_rules = self.entries.iter().any(FallbackEntry::is_rule);
        let mut driver = self.driver(request).await;
        loop {
            if driver.cancelled() {
                return Err(FailoverError::Cancelled);
            }
            match driver.model.generate(driver.request.clone()).await {
                Ok(response) => {
                    // Only a rule can deem a successful result retry-worthy;
                    // with no rules in the list the result stands as-is.
                    if has_rules {
                        driver.record_flagged(response.clone());
                        if driver.advance().await? {
                            continue;
                        }
                    }
                    self.finish(&driver).await;
                    return Ok(response);
                }
                Err(error) => {
                    driver.record_error(error.clone());
                    if driver.advance().await? {
                        continue;
                    }
                    return Err(driver.terminal_error(error));
                }
            }
        }
    }

    /// Start a logical request: the sticky manager decides whether it begins
    /// at the primary or at a previous winner.
    pub(crate) async fn driver(&self, request: GenerateRequest) -> AttemptDriver {
        let model = self.sticky.begin_request(&self.primary).await;
        AttemptDriver::new(
            self.entries.clone(),
            self.on_error.clone(),
            self.on_retry.clone(),
            model,
            request,
        )
    }

    /// A request that needed a retry to succeed arms the sticky window for
    /// its winner; a first-try success never touches sticky state.
    pub(crate) async fn finish(&self, driver: &AttemptDriver) {
        if driver.retried && driver.model.identity() != self.primary.identity() {
            self.sticky.record_winner(&driver.model).await;
        }
    }
}
