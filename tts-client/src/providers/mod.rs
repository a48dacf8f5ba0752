//! TTS provider implementations

mod edge_cli;
pub mod mock;
mod openai_compatible;

pub use edge_cli::EdgeTtsProvider;
pub use mock::MockProvider;
pub use openai_compatible::OpenAICompatibleProvider;

use crate::config::ProviderConfig;
use crate::error::{Result, TtsError};
use crate::provider::TtsProvider;

/// Default OpenAI speech model
const DEFAULT_OPENAI_MODEL: &str = "tts-1";

/// Supported provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    EdgeTts,
    OpenAi,
    OpenAiCompatible,
}

impl ProviderKind {
    /// Parse provider kind from string
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "edge-tts" | "edge_tts" | "edge" => Ok(Self::EdgeTts),
            "openai" => Ok(Self::OpenAi),
            "openai-compatible" | "openai_compatible" | "compatible" => Ok(Self::OpenAiCompatible),
            _ => Err(TtsError::ConfigError(format!("Unknown provider: {}", s))),
        }
    }

    /// Get the environment variable name for this provider's API key
    pub fn env_var(&self) -> Option<&'static str> {
        match self {
            Self::EdgeTts => None,
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::OpenAiCompatible => Some("TTS_API_KEY"),
        }
    }
}

/// Create a provider instance by name with optional config
pub fn get_provider(
    name: &str,
    provider_config: Option<&ProviderConfig>,
) -> Result<Box<dyn TtsProvider>> {
    let kind = ProviderKind::from_str(name)?;
    let model = provider_config
        .and_then(|c| c.model.clone())
        .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());

    match kind {
        ProviderKind::EdgeTts => {
            let cli_path = provider_config.and_then(|c| c.cli_path.clone());
            Ok(Box::new(EdgeTtsProvider::new(cli_path)?))
        }
        ProviderKind::OpenAi => {
            let env_var = kind.env_var().unwrap_or_default();
            let api_key = get_api_key(provider_config, env_var, "OpenAI")?;
            let provider = match provider_config.and_then(|c| c.base_url.as_deref()) {
                Some(base_url) => {
                    OpenAICompatibleProvider::new(&model, base_url, Some(api_key), "OpenAI")?
                }
                None => OpenAICompatibleProvider::openai(&model, api_key)?,
            };
            Ok(Box::new(provider))
        }
        ProviderKind::OpenAiCompatible => {
            let base_url = provider_config
                .and_then(|c| c.base_url.as_deref())
                .ok_or_else(|| {
                    TtsError::ConfigError(
                        "openai-compatible provider requires base_url in tts.toml".into(),
                    )
                })?;
            // Self-hosted servers usually run without auth
            let api_key = get_api_key(
                provider_config,
                kind.env_var().unwrap_or_default(),
                "OpenAI-compatible",
            )
            .ok();
            Ok(Box::new(OpenAICompatibleProvider::new(
                &model,
                base_url,
                api_key,
                "OpenAI-compatible",
            )?))
        }
    }
}

/// Get API key from config or environment variable
fn get_api_key(
    config: Option<&ProviderConfig>,
    env_var: &str,
    provider_name: &str,
) -> Result<String> {
    if let Some(key) = config.and_then(|c| c.api_key.clone()) {
        return Ok(key);
    }

    std::env::var(env_var).map_err(|_| TtsError::MissingApiKey {
        provider: provider_name.to_string(),
        env_var: env_var.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_from_str() {
        assert_eq!(ProviderKind::from_str("edge-tts").unwrap(), ProviderKind::EdgeTts);
        assert_eq!(ProviderKind::from_str("Edge").unwrap(), ProviderKind::EdgeTts);
        assert_eq!(ProviderKind::from_str("openai").unwrap(), ProviderKind::OpenAi);
        assert_eq!(
            ProviderKind::from_str("openai-compatible").unwrap(),
            ProviderKind::OpenAiCompatible
        );
        assert!(ProviderKind::from_str("polly").is_err());
    }

    #[test]
    fn test_env_vars() {
        assert_eq!(ProviderKind::EdgeTts.env_var(), None);
        assert_eq!(ProviderKind::OpenAi.env_var(), Some("OPENAI_API_KEY"));
    }

    #[test]
    fn test_api_key_prefers_config() {
        let config = ProviderConfig {
            api_key: Some("from-config".to_string()),
            ..Default::default()
        };
        let key = get_api_key(Some(&config), "PDF2MP3_TEST_UNSET_KEY", "Test").unwrap();
        assert_eq!(key, "from-config");
    }

    #[test]
    fn test_missing_api_key() {
        let err = get_api_key(None, "PDF2MP3_TEST_UNSET_KEY", "Test").unwrap_err();
        assert!(matches!(err, TtsError::MissingApiKey { .. }));
        assert!(err.to_string().contains("PDF2MP3_TEST_UNSET_KEY"));
    }

    #[test]
    fn test_openai_key_comes_from_kind_env_var() {
        if std::env::var("OPENAI_API_KEY").is_ok() {
            return;
        }
        let err = get_provider("openai", None).err().unwrap();
        assert!(matches!(err, TtsError::MissingApiKey { .. }));
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_compatible_requires_base_url() {
        let err = get_provider("openai-compatible", None).err().unwrap();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn test_compatible_with_base_url() {
        let config = ProviderConfig {
            base_url: Some("http://localhost:8880/v1".to_string()),
            ..Default::default()
        };
        let provider = get_provider("openai-compatible", Some(&config)).unwrap();
        assert_eq!(provider.name(), "OpenAI-compatible");
    }
}
