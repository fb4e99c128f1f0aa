//! Boundary contract between the failover engine and the model
//! collaborators it selects among.
//!
//! This is a **data-and-trait** crate: no HTTP calls, no retry loop, no IO.
//! It defines the [`LanguageModel`] trait plus the request, response, and
//! stream-event types the engine carries around. The orchestration itself
//! lives in `fallback-runtime`.

pub mod error;
pub mod model;
pub mod request;
pub mod response;
pub mod stream;

pub use error::{ModelError, Result};
pub use model::{LanguageModel, ModelHandle, ModelIdentity};
pub use request::{GenerateRequest, RequestOverrides};
pub use response::{FinishReason, GenerateResponse, TokenUsage};
pub use stream::{BoxEventStream, StreamEvent};
