use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ModelError;
use crate::request::GenerateRequest;
use crate::response::GenerateResponse;
use crate::stream::BoxEventStream;
use crate::stream::StreamEvent;

/// Identity of a model: provider name plus model id.
///
/// Attempt budgets are counted against this identity, not against object
/// identity, so two separately constructed handles to the same
/// provider/model pair are treated as one model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelIdentity {
    pub provider: String,
    pub model_id: String,
}

impl ModelIdentity {
    pub fn new(provider: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model_id: model_id.into(),
        }
    }

    /// Deterministic key used for attempt accounting.
    pub fn key(&self) -> String {
        format!("{}:{}", self.provider, self.model_id)
    }
}

impl fmt::Display for ModelIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.model_id)
    }
}

/// The model collaborator the failover engine selects among.
///
/// Implementations own all transport and payload concerns; the engine only
/// calls [`generate`](LanguageModel::generate) and
/// [`stream`](LanguageModel::stream) and records their outcomes.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Provider name, e.g. `"anthropic"`.
    fn provider(&self) -> &str;

    /// Model identifier, e.g. `"claude-sonnet-4-5"`.
    fn model_id(&self) -> &str;

    fn identity(&self) -> ModelIdentity {
        ModelIdentity::new(self.provider(), self.model_id())
    }

    /// Single-shot invocation.
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ModelError>;

    /// Incremental invocation. Implementations may fail here (setup-time
    /// failure) or emit [`StreamEvent::Error`] mid-sequence.
    ///
    /// The default adapts [`generate`](LanguageModel::generate) into a
    /// three-event sequence for models without native streaming support.
    async fn stream(&self, request: GenerateRequest) -> Result<BoxEventStream, ModelError> {
        let response = self.generate(request).await?;
        let events = vec![
            StreamEvent::Start,
            StreamEvent::Delta {
                text: response.text,
            },
            StreamEvent::Finish {
                finish_reason: response.finish_reason,
                usage: response.usage,
            },
        ];
        Ok(Box::pin(futures::stream::iter(events)))
    }
}

/// Shared handle to a caller-supplied model.
pub type ModelHandle = Arc<dyn LanguageModel>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
