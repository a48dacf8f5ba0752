//! Mock TTS provider for testing
//!
//! Provides a configurable mock provider that can simulate failures, retries,
//! and successful synthesis. Successful calls echo the request text back as
//! the "audio" payload so callers can check ordering end to end.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Result, TtsError};
use crate::provider::{SpeechRequest, SpeechResponse, TtsProvider};

/// A mock provider for testing retry and skip behavior
pub struct MockProvider {
    /// Number of times to fail before succeeding (0 = always succeed)
    fail_count: AtomicUsize,
    /// Current call count
    call_count: AtomicUsize,
    /// Error to return on failure (None = always succeed)
    fail_with: Mutex<Option<TtsError>>,
    /// Fail every request whose text contains this marker
    fail_matching: Option<String>,
    /// Every request received, in order
    requests: Mutex<Vec<SpeechRequest>>,
    /// Provider name for display
    name: &'static str,
}

impl MockProvider {
    fn build(fail_count: usize, error: Option<TtsError>, fail_matching: Option<String>) -> Self {
        Self {
            fail_count: AtomicUsize::new(fail_count),
            call_count: AtomicUsize::new(0),
            fail_with: Mutex::new(error),
            fail_matching,
            requests: Mutex::new(Vec::new()),
            name: "mock",
        }
    }

    /// Create a provider that fails `n` times with the given error, then succeeds
    pub fn fails_then_succeeds(n: usize, error: TtsError) -> Self {
        Self::build(n, Some(error), None)
    }

    /// Create a provider that always fails with the given error
    pub fn always_fails(error: TtsError) -> Self {
        Self::build(usize::MAX, Some(error), None)
    }

    /// Create a provider that always succeeds
    pub fn always_succeeds() -> Self {
        Self::build(0, None, None)
    }

    /// Create a provider that fails only for texts containing `marker`
    pub fn fails_when_text_contains(marker: &str, error: TtsError) -> Self {
        Self::build(0, Some(error), Some(marker.to_string()))
    }

    /// Get the number of times synthesize() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Texts of every request received so far, in call order
    pub fn texts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.text.clone())
            .collect()
    }

    fn scripted_error(&self) -> TtsError {
        let error = self.fail_with.lock().unwrap();
        match error.as_ref() {
            Some(err) => clone_error(err),
            None => TtsError::CliError("mock failure".to_string()),
        }
    }
}

#[async_trait]
impl TtsProvider for MockProvider {
    async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechResponse> {
        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if let Some(marker) = &self.fail_matching {
            if request.text.contains(marker.as_str()) {
                return Err(self.scripted_error());
            }
        } else if call_num < self.fail_count.load(Ordering::SeqCst) {
            return Err(self.scripted_error());
        }

        Ok(SpeechResponse {
            audio: format!("[{}]", request.text).into_bytes(),
            format: request.format,
        })
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn is_available(&self) -> Result<()> {
        Ok(())
    }
}

/// Clone a TtsError (needed because TtsError doesn't implement Clone)
fn clone_error(err: &TtsError) -> TtsError {
    match err {
        TtsError::MissingApiKey { provider, env_var } => TtsError::MissingApiKey {
            provider: provider.clone(),
            env_var: env_var.clone(),
        },
        TtsError::ProviderUnavailable(s) => TtsError::ProviderUnavailable(s.clone()),
        TtsError::RateLimited { retry_after } => TtsError::RateLimited {
            retry_after: *retry_after,
        },
        TtsError::ServerOverloaded { message } => TtsError::ServerOverloaded {
            message: message.clone(),
        },
        TtsError::ApiError {
            message,
            status_code,
        } => TtsError::ApiError {
            message: message.clone(),
            status_code: *status_code,
        },
        TtsError::EmptyAudio { voice } => TtsError::EmptyAudio {
            voice: voice.clone(),
        },
        TtsError::CliError(s) => TtsError::CliError(s.clone()),
        TtsError::ConfigError(s) => TtsError::ConfigError(s.clone()),
        // For Io and Toml errors, we create a generic error since they can't be cloned
        TtsError::Io(_) => TtsError::ConfigError("IO error (mock)".to_string()),
        TtsError::TomlParse(_) => TtsError::ConfigError("TOML parse error (mock)".to_string()),
        TtsError::TomlSerialize(_) => {
            TtsError::ConfigError("TOML serialize error (mock)".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str) -> SpeechRequest {
        SpeechRequest::new(text, "en-US-JennyNeural")
    }

    #[tokio::test]
    async fn test_always_succeeds() {
        let provider = MockProvider::always_succeeds();

        let result = provider.synthesize(request("hello")).await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap().audio, b"[hello]".to_vec());
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.texts(), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn test_always_fails() {
        let provider = MockProvider::always_fails(TtsError::ServerOverloaded {
            message: "overloaded".to_string(),
        });

        for _ in 0..3 {
            let result = provider.synthesize(request("test")).await;
            assert!(result.is_err());
        }
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_fails_then_succeeds() {
        let provider = MockProvider::fails_then_succeeds(
            2,
            TtsError::RateLimited {
                retry_after: Some(1),
            },
        );

        assert!(provider.synthesize(request("a")).await.is_err());
        assert!(provider.synthesize(request("a")).await.is_err());

        let result = provider.synthesize(request("a")).await;
        assert!(result.is_ok());
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_fails_when_text_contains() {
        let provider = MockProvider::fails_when_text_contains(
            "poison",
            TtsError::ApiError {
                message: "bad input".to_string(),
                status_code: Some(400),
            },
        );

        assert!(provider.synthesize(request("fine words")).await.is_ok());
        let err = provider.synthesize(request("a poison pill")).await.unwrap_err();
        assert!(matches!(err, TtsError::ApiError { status_code: Some(400), .. }));
        assert!(provider.synthesize(request("more words")).await.is_ok());
        assert_eq!(provider.call_count(), 3);
    }
}
