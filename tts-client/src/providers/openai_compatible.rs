//! OpenAI-compatible speech API provider
//!
//! Used for providers that implement the OpenAI `/audio/speech` endpoint:
//! - OpenAI
//! - Self-hosted servers (Kokoro-FastAPI, openedai-speech, ...)

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::RETRY_AFTER;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TtsError};
use crate::provider::{AudioFormat, SpeechRequest, SpeechResponse, TtsProvider};

/// Provider for OpenAI-compatible speech APIs
pub struct OpenAICompatibleProvider {
    model: String,
    base_url: String,
    api_key: Option<String>,
    name: &'static str,
    client: Client,
}

impl OpenAICompatibleProvider {
    /// Create a new OpenAI-compatible provider
    pub fn new(
        model: &str,
        base_url: &str,
        api_key: Option<String>,
        name: &'static str,
    ) -> Result<Self> {
        let client = Client::new();

        Ok(Self {
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            name,
            client,
        })
    }

    /// Create an OpenAI provider
    pub fn openai(model: &str, api_key: String) -> Result<Self> {
        Self::new(model, "https://api.openai.com/v1", Some(api_key), "OpenAI")
    }

    fn speech_url(&self) -> String {
        format!("{}/audio/speech", self.base_url)
    }
}

// OpenAI API request/response types

#[derive(Debug, Serialize)]
struct CreateSpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Pull the human-readable message out of an error body, if it is JSON
fn error_message(body: String) -> String {
    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(error_response) => error_response.error.message,
        Err(_) => body,
    }
}

#[async_trait]
impl TtsProvider for OpenAICompatibleProvider {
    async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechResponse> {
        let body = CreateSpeechRequest {
            model: &self.model,
            input: &request.text,
            voice: &request.voice,
            response_format: request.format.extension(),
        };

        let mut http_request = self.client.post(self.speech_url()).json(&body);
        if let Some(api_key) = &self.api_key {
            http_request = http_request.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = http_request.send().await.map_err(|e| TtsError::ApiError {
            message: format!("Request failed: {}", e),
            status_code: None,
        })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let message = error_message(response.text().await.unwrap_or_default());

            return Err(match status.as_u16() {
                429 => TtsError::RateLimited { retry_after },
                503 => TtsError::ServerOverloaded { message },
                code => TtsError::ApiError {
                    message,
                    status_code: Some(code),
                },
            });
        }

        let audio = response.bytes().await.map_err(|e| TtsError::ApiError {
            message: format!("Failed to read audio body: {}", e),
            status_code: None,
        })?;

        if audio.is_empty() {
            return Err(TtsError::EmptyAudio {
                voice: request.voice,
            });
        }

        Ok(SpeechResponse {
            audio: audio.to_vec(),
            format: request.format,
        })
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn is_available(&self) -> Result<()> {
        // Credentials were resolved in the constructor
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let provider =
            OpenAICompatibleProvider::new("tts-1", "http://localhost:8880/v1/", None, "local")
                .unwrap();
        assert_eq!(provider.speech_url(), "http://localhost:8880/v1/audio/speech");
    }

    #[test]
    fn test_openai_constructor() {
        let provider = OpenAICompatibleProvider::openai("tts-1", "sk-test".to_string()).unwrap();
        assert_eq!(provider.name(), "OpenAI");
        assert_eq!(provider.speech_url(), "https://api.openai.com/v1/audio/speech");
        assert_eq!(provider.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_request_body() {
        let body = CreateSpeechRequest {
            model: "tts-1",
            input: "Hello there",
            voice: "nova",
            response_format: AudioFormat::Mp3.extension(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "tts-1");
        assert_eq!(json["input"], "Hello there");
        assert_eq!(json["voice"], "nova");
        assert_eq!(json["response_format"], "mp3");
    }

    #[test]
    fn test_error_message_extraction() {
        let json = r#"{"error": {"message": "Invalid voice"}}"#.to_string();
        assert_eq!(error_message(json), "Invalid voice");
        assert_eq!(error_message("plain text".to_string()), "plain text");
    }
}
