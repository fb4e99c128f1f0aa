use std::fmt;

use fallback_provider::GenerateResponse;
use fallback_provider::ModelError;
use fallback_provider::ModelHandle;
use fallback_provider::ModelIdentity;

use crate::error::AttemptFailure;

/// Outcome of a single model invocation, recorded the moment the invocation
/// resolves or rejects. Immutable once recorded.
#[derive(Clone)]
pub enum Attempt {
    Errored {
        model: ModelHandle,
        error: ModelError,
    },
    Completed {
        model: ModelHandle,
        response: GenerateResponse,
    },
}

impl Attempt {
    pub fn model(&self) -> &ModelHandle {
        match self {
            Self::Errored { model, .. } | Self::Completed { model, .. } => model,
        }
    }

    pub fn identity(&self) -> ModelIdentity {
        self.model().identity()
    }

    pub fn error(&self) -> Option<&ModelError> {
        match self {
            Self::Errored { error, .. } => Some(error),
            Self::Completed { .. } => None,
        }
    }

    pub fn response(&self) -> Option<&GenerateResponse> {
        match self {
            Self::Completed { response, .. } => Some(response),
            Self::Errored { .. } => None,
        }
    }

    fn failure(&self) -> AttemptFailure {
        match self {
            Self::Errored { model, error } => AttemptFailure::Error {
                model: model.identity(),
                error: error.clone(),
            },
            Self::Completed { model, response } => AttemptFailure::Flagged {
                model: model.identity(),
                response: response.clone(),
            },
        }
    }
}

impl fmt::Debug for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Errored { model, error } => f
                .debug_struct("Errored")
                .field("model", &model.identity())
                .field("error", error)
                .finish(),
            Self::Completed { model, response } => f
                .debug_struct("Completed")
                .field("model", &model.identity())
                .field("response", response)
                .finish(),
        }
    }
}

/// Append-only record of every invocation made during one logical request.
///
/// Attempts are in chronological order; the last element is the attempt
/// currently being evaluated by the resolver. Owned exclusively by the one
/// request that created it.
#[derive(Debug, Clone, Default)]
pub struct AttemptLedger {
    attempts: Vec<Attempt>,
}

impl AttemptLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, attempt: Attempt) {
        self.attempts.push(attempt);
    }

    /// How many attempts have already been made against the given identity
    /// key, independent of handle identity.
    pub fn count_for(&self, key: &str) -> u32 {
        self.attempts
            .iter()
            .filter(|attempt| attempt.identity().key() == key)
            .count() as u32
    }

    pub fn last(&self) -> Option<&Attempt> {
        self.attempts.last()
    }

    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    /// Every recorded attempt as an ordered failure list, for the
    /// exhaustion aggregate.
    pub fn failures(&self) -> Vec<AttemptFailure> {
        self.attempts.iter().map(Attempt::failure).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
