use std::collections::HashMap;

use tokio_util::sync::CancellationToken;

/// Call options for one model invocation.
///
/// The failover engine never interprets these fields; it only carries them to
/// the model and applies shallow per-field overrides from a retry decision.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub prompt: String,
    pub system: Option<String>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_tokens: Option<u32>,
    /// Sequences that stop generation.
    pub stop: Vec<String>,
    /// Extra HTTP headers to include in the provider request.
    pub headers: HashMap<String, String>,
    /// Provider-specific options, passed through untouched.
    pub provider_options: serde_json::Map<String, serde_json::Value>,
    /// Cancellation signal for this request. The engine may substitute a
    /// fresh, timeout-scoped token on a retry attempt.
    pub cancel: CancellationToken,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }
}

/// Shallow per-field overrides applied to a [`GenerateRequest`] before a
/// retry attempt. A `Some` field replaces the base value wholesale, except
/// `provider_options`, which is merged per top-level key.
#[derive(Debug, Clone, Default)]
pub struct RequestOverrides {
    pub prompt: Option<String>,
    pub system: Option<String>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_tokens: Option<u32>,
    pub stop: Option<Vec<String>>,
    pub headers: Option<HashMap<String, String>>,
    pub provider_options: Option<serde_json::Map<String, serde_json::Value>>,
}

impl RequestOverrides {
    pub fn is_empty(&self) -> bool {
        self.prompt.is_none()
            && self.system.is_none()
            && self.temperature.is_none()
            && self.top_p.is_none()
            && self.max_tokens.is_none()
            && self.stop.is_none()
            && self.headers.is_none()
            && self.provider_options.is_none()
    }

    /// Apply these overrides on top of `request`.
    pub fn apply(&self, request: &mut GenerateRequest) {
        if let Some(prompt) = &self.prompt {
            request.prompt = prompt.clone();
        }
        if let Some(system) = &self.system {
            request.system = Some(system.clone());
        }
        if let Some(temperature) = self.temperature {
            request.temperature = Some(temperature);
        }
        if let Some(top_p) = self.top_p {
            request.top_p = Some(top_p);
        }
        if let Some(max_tokens) = self.max_tokens {
            request.max_tokens = Some(max_tokens);
        }
        if let Some(stop) = &self.stop {
            request.stop = stop.clone();
        }
        if let Some(headers) = &self.headers {
            request.headers = headers.clone();
        }
        if let Some(options) = &self.provider_options {
            for (key, value) in options {
                request
                    .provider_options
                    .insert(key.clone(), value.clone());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_overrides_leave_request_untouched() {
        let mut request = GenerateRequest::new("hello");
        request.temperature = Some(0.7);
        let before = request.clone();

        let overrides = RequestOverrides::default();
        assert!(overrides.is_empty());
        overrides.apply(&mut request);

        assert_eq!(request.prompt, before.prompt);
        assert_eq!(request.temperature, before.temperature);
    }

    #[test]
    fn some_fields_replace_base_values() {
        let mut request = GenerateRequest::new("hello");
        request.temperature = Some(0.7);
        request.max_tokens = Some(256);

        let overrides = RequestOverrides {
            temperature: Some(0.0),
            system: Some("be brief".to_string()),
            ..RequestOverrides::default()
        };
        overrides.apply(&mut request);

        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.system.as_deref(), Some("be brief"));
        // Untouched fields survive.
        assert_eq!(request.max_tokens, Some(256));
        assert_eq!(request.prompt, "hello");
    }

    #[test]
    fn provider_options_merge_per_key() {
        let mut request = GenerateRequest::new("hello");
        request
            .provider_options
            .insert("cache".to_string(), json!(true));
        request
            .provider_options
            .insert("tier".to_string(), json!("standard"));

        let mut merged = serde_json::Map::new();
        merged.insert("tier".to_string(), json!("priority"));
        let overrides = RequestOverrides {
            provider_options: Some(merged),
            ..RequestOverrides::default()
        };
        overrides.apply(&mut request);

        assert_eq!(request.provider_options["cache"], json!(true));
        assert_eq!(request.provider_options["tier"], json!("priority"));
    }
}
