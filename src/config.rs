//! Agent configuration
//!
//! All tunables are collected into one value constructed at process start and
//! passed by reference into the components that need them. Core logic never
//! reads the environment on its own.

use std::path::PathBuf;

use crate::error::{MarqueeError, Result};

/// Hard ceiling on estimated context tokens
pub const MAX_CONTEXT_TOKENS: usize = 30_000;

/// Estimated-token level at which older turns are compressed
pub const COMPRESSION_THRESHOLD: usize = 25_000;

/// Maximum turns kept in the short-term buffer
pub const MAX_BUFFER_TURNS: usize = 50;

/// Turns kept verbatim when compression runs
pub const COMPRESSION_KEEP_RECENT: usize = 10;

/// Process-wide agent configuration
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Active LLM provider: "gemini" or "ollama"
    pub provider: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub ollama_base_url: String,
    pub ollama_model: String,
    pub films_db_path: PathBuf,
    pub memory_db_path: PathBuf,
    pub event_log_path: Option<PathBuf>,
    pub compression_threshold: usize,
    pub max_context_tokens: usize,
    pub max_buffer_turns: usize,
    /// Bounded wait applied to every backend HTTP call
    pub request_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("marquee");
        Self {
            provider: "gemini".to_string(),
            gemini_api_key: None,
            gemini_model: "gemini-1.5-flash".to_string(),
            ollama_base_url: "http://localhost:11434".to_string(),
            ollama_model: "llama3.1".to_string(),
            films_db_path: data_dir.join("films.db"),
            memory_db_path: data_dir.join("memory.db"),
            event_log_path: Some(data_dir.join("agent.jsonl")),
            compression_threshold: COMPRESSION_THRESHOLD,
            max_context_tokens: MAX_CONTEXT_TOKENS,
            max_buffer_turns: MAX_BUFFER_TURNS,
            request_timeout_secs: 120,
        }
    }
}

impl AgentConfig {
    /// Build configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(provider) = std::env::var("MARQUEE_PROVIDER") {
            config.provider = provider.to_lowercase();
        }
        config.gemini_api_key = std::env::var("GEMINI_API_KEY").ok();
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            config.gemini_model = model;
        }
        if let Ok(url) = std::env::var("OLLAMA_BASE_URL") {
            config.ollama_base_url = url;
        }
        if let Ok(model) = std::env::var("OLLAMA_MODEL") {
            config.ollama_model = model;
        }
        config
    }

    /// Validate that the selected provider can actually be constructed.
    ///
    /// Called once at startup; a failure here is fatal.
    pub fn validate(&self) -> Result<()> {
        match self.provider.as_str() {
            "gemini" => {
                if self.gemini_api_key.as_deref().unwrap_or("").is_empty() {
                    return Err(MarqueeError::Config(
                        "GEMINI_API_KEY not set but provider is 'gemini'. \
                         Set the key or switch to MARQUEE_PROVIDER=ollama."
                            .to_string(),
                    ));
                }
            }
            "ollama" => {}
            other => {
                return Err(MarqueeError::Config(format!(
                    "Unknown provider '{other}'. Supported: gemini, ollama"
                )));
            }
        }
        Ok(())
    }

    /// In-memory stores, no event log. Used by tests.
    pub fn for_testing() -> Self {
        Self {
            provider: "ollama".to_string(),
            films_db_path: PathBuf::from(":memory:"),
            memory_db_path: PathBuf::from(":memory:"),
            event_log_path: None,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemini_requires_api_key() {
        let config = AgentConfig {
            provider: "gemini".to_string(),
            gemini_api_key: None,
            ..AgentConfig::for_testing()
        };
        let err = config.validate().unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn ollama_needs_no_credentials() {
        let config = AgentConfig::for_testing();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_provider_rejected() {
        let config = AgentConfig {
            provider: "openai".to_string(),
            ..AgentConfig::for_testing()
        };
        assert!(config.validate().is_err());
    }
}
