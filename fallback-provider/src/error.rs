use std::time::Duration;

/// A failure reported by a model implementation.
///
/// The failover engine treats this value as opaque: whether an error is worth
/// retrying is decided entirely by caller-supplied rules, never by inspecting
/// the error here. The optional fields exist so rules *can* inspect it: the
/// HTTP-ish status a transport layer saw, and a server-provided retry delay
/// already parsed out of a `Retry-After` header.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ModelError {
    pub message: String,
    /// Status code reported by the transport, when one exists.
    pub status: Option<u16>,
    /// Server-suggested delay before retrying, when one was provided.
    pub retry_after: Option<Duration>,
}

impl ModelError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            retry_after: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_retry_after(mut self, delay: Duration) -> Self {
        self.retry_after = Some(delay);
        self
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_message_only() {
        let err = ModelError::new("rate limited")
            .with_status(429)
            .with_retry_after(Duration::from_secs(30));
        assert_eq!(err.to_string(), "rate limited");
        assert_eq!(err.status, Some(429));
        assert_eq!(err.retry_after, Some(Duration::from_secs(30)));
    }

    #[test]
    fn plain_error_has_no_hints() {
        let err = ModelError::new("boom");
        assert_eq!(err.status, None);
        assert_eq!(err.retry_after, None);
    }
}
