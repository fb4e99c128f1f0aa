//! Scripted model double shared by the integration suites.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use fallback_provider::BoxEventStream;
use fallback_provider::FinishReason;
use fallback_provider::GenerateRequest;
use fallback_provider::GenerateResponse;
use fallback_provider::LanguageModel;
use fallback_provider::ModelError;
use fallback_provider::StreamEvent;

pub enum GenerateOutcome {
    Reply(GenerateResponse),
    Fail(ModelError),
}

pub enum StreamOutcome {
    Events(Vec<StreamEvent>),
    SetupError(ModelError),
}

/// A model whose outcomes are scripted per call. With an empty script every
/// invocation succeeds with the text `"ok"` (or a Start/Delta/Finish
/// sequence carrying `"ok"` when streaming).
pub struct FakeModel {
    provider: String,
    model_id: String,
    generate_script: Mutex<VecDeque<GenerateOutcome>>,
    stream_script: Mutex<VecDeque<StreamOutcome>>,
    generate_calls: AtomicU32,
    stream_calls: AtomicU32,
    seen_requests: Mutex<Vec<GenerateRequest>>,
}

impl FakeModel {
    pub fn new(provider: &str, model_id: &str) -> Arc<Self> {
        Arc::new(Self {
            provider: provider.to_string(),
            model_id: model_id.to_string(),
            generate_script: Mutex::new(VecDeque::new()),
            stream_script: Mutex::new(VecDeque::new()),
            generate_calls: AtomicU32::new(0),
            stream_calls: AtomicU32::new(0),
            seen_requests: Mutex::new(Vec::new()),
        })
    }

    pub fn push_text(&self, text: &str) {
        self.generate_script
            .lock()
            .unwrap()
            .push_back(GenerateOutcome::Reply(GenerateResponse::new(
                text,
                FinishReason::Stop,
            )));
    }

    pub fn push_flagged(&self) {
        self.generate_script
            .lock()
            .unwrap()
            .push_back(GenerateOutcome::Reply(GenerateResponse::new(
                "",
                FinishReason::ContentFilter,
            )));
    }

    pub fn push_error(&self, error: ModelError) {
        self.generate_script
            .lock()
            .unwrap()
            .push_back(GenerateOutcome::Fail(error));
    }

    pub fn push_events(&self, events: Vec<StreamEvent>) {
        self.stream_script
            .lock()
            .unwrap()
            .push_back(StreamOutcome::Events(events));
    }

    pub fn push_setup_error(&self, error: ModelError) {
        self.stream_script
            .lock()
            .unwrap()
            .push_back(StreamOutcome::SetupError(error));
    }

    pub fn generate_calls(&self) -> u32 {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn stream_calls(&self) -> u32 {
        self.stream_calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.seen_requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LanguageModel for FakeModel {
    fn provider(&self) -> &str {
        &self.provider
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ModelError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_requests.lock().unwrap().push(request);
        match self.generate_script.lock().unwrap().pop_front() {
            Some(GenerateOutcome::Reply(response)) => Ok(response),
            Some(GenerateOutcome::Fail(error)) => Err(error),
            None => Ok(GenerateResponse::new("ok", FinishReason::Stop)),
        }
    }

    async fn stream(&self, request: GenerateRequest) -> Result<BoxEventStream, ModelError> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_requests.lock().unwrap().push(request);
        let outcome = self.stream_script.lock().unwrap().pop_front();
        match outcome {
            Some(StreamOutcome::Events(events)) => Ok(Box::pin(futures::stream::iter(events))),
            Some(StreamOutcome::SetupError(error)) => Err(error),
            None => Ok(Box::pin(futures::stream::iter(vec![
                StreamEvent::Start,
                StreamEvent::Delta {
                    text: "ok".to_string(),
                },
                StreamEvent::Finish {
                    finish_reason: FinishReason::Stop,
                    usage: None,
                },
            ]))),
        }
    }
}
