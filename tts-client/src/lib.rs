//! Text-to-speech client library for the pdf2mp3 workspace
//!
//! Provides a unified interface over speech synthesis backends:
//! - edge-tts CLI (subprocess, Microsoft Edge online voices)
//! - OpenAI speech API
//! - Any OpenAI-compatible speech server (self-hosted)

pub mod config;
pub mod error;
pub mod provider;
pub mod providers;

pub use config::{Config, ProviderConfig};
pub use error::{Result, TtsError};
pub use provider::{AudioFormat, SpeechRequest, SpeechResponse, TtsProvider};
pub use providers::{MockProvider, ProviderKind, get_provider};
