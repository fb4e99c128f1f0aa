use std::fmt;

use fallback_provider::GenerateResponse;
use fallback_provider::ModelError;
use fallback_provider::ModelIdentity;

/// One recorded failure inside an exhaustion report: either an error thrown
/// by a model, or a successful result a retry rule flagged as undesirable.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptFailure {
    Error {
        model: ModelIdentity,
        error: ModelError,
    },
    Flagged {
        model: ModelIdentity,
        response: GenerateResponse,
    },
}

impl AttemptFailure {
    pub fn model(&self) -> &ModelIdentity {
        match self {
            Self::Error { model, .. } | Self::Flagged { model, .. } => model,
        }
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error { model, error } => write!(f, "{model}: {error}"),
            Self::Flagged { model, response } => {
                write!(f, "{model}: flagged result ({:?})", response.finish_reason)
            }
        }
    }
}

/// Errors surfaced by the failover engine.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FailoverError {
    /// The very first attempt failed and no rule matched. The underlying
    /// model error is passed through unchanged so callers see exactly what
    /// the model produced.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// At least one retry already happened and no rule yields a usable next
    /// model. `failures` lists every error and flagged result encountered,
    /// in chronological order.
    #[error("all models exhausted after {} attempts", failures.len())]
    Exhausted { failures: Vec<AttemptFailure> },

    /// The caller's cancellation signal fired between attempts.
    #[error("request cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, FailoverError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use fallback_provider::FinishReason;

    #[test]
    fn model_variant_is_transparent() {
        let err: FailoverError = ModelError::new("upstream says no").into();
        assert_eq!(err.to_string(), "upstream says no");
    }

    #[test]
    fn exhausted_counts_attempts() {
        let err = FailoverError::Exhausted {
            failures: vec![
                AttemptFailure::Error {
                    model: ModelIdentity::new("openai", "gpt-4o"),
                    error: ModelError::new("boom"),
                },
                AttemptFailure::Flagged {
                    model: ModelIdentity::new("anthropic", "claude"),
                    response: GenerateResponse::new("", FinishReason::ContentFilter),
                },
            ],
        };
        assert_eq!(err.to_string(), "all models exhausted after 2 attempts");
    }
}
