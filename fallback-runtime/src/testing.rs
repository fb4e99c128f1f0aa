//! Minimal model stub for unit tests inside this crate. The integration
//! suites under `tests/` carry a richer scripted double.

use std::sync::Arc;

use fallback_provider::FinishReason;
use fallback_provider::GenerateRequest;
use fallback_provider::GenerateResponse;
use fallback_provider::LanguageModel;
use fallback_provider::ModelError;
use fallback_provider::ModelHandle;

pub struct StubModel {
    provider: String,
    model_id: String,
}

#[async_trait::async_trait]
impl LanguageModel for StubModel {
    fn provider(&self) -> &str {
        &self.provider
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate(&self, _request: GenerateRequest) -> Result<GenerateResponse, ModelError> {
        Ok(GenerateResponse::new("ok", FinishReason::Stop))
    }
}

pub fn stub_model(provider: &str, model_id: &str) -> ModelHandle {
    Arc::new(StubModel {
        provider: provider.to_string(),
        model_id: model_id.to_string(),
    })
}
