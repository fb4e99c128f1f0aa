use std::pin::Pin;

use futures::Stream;

use crate::error::ModelError;
use crate::response::FinishReason;
use crate::response::TokenUsage;

/// One event in a model's incremental response sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// The model has accepted the request and will start emitting output.
    Start,
    /// A chunk of user-visible text.
    Delta { text: String },
    /// The sequence completed normally.
    Finish {
        finish_reason: FinishReason,
        usage: Option<TokenUsage>,
    },
    /// The sequence failed. Whether this ends the consumer-facing sequence
    /// depends on whether any content was forwarded before it arrived.
    Error(ModelError),
}

impl StreamEvent {
    /// Whether this event carries user-visible payload. Once a content event
    /// has been forwarded, a later stream error can no longer be retried
    /// without the consumer observing duplicated output.
    pub fn is_content(&self) -> bool {
        matches!(self, Self::Delta { .. })
    }
}

/// An owned, boxed event sequence as returned by a model implementation.
pub type BoxEventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
