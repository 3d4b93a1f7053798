//! LLM backend adapters
//!
//! One uniform, object-safe interface over heterogeneous chat APIs. Backends
//! are selected by configuration at construction time and can be hot-swapped
//! mid-session by exporting history in the generic shape and importing it
//! into the replacement.

pub mod gemini;
pub mod ollama;
pub mod parse;

use crate::config::AgentConfig;
use crate::error::{MarqueeError, Result};
use crate::types::{BackendIdentity, GenericTurn, ToolCall, ToolDescriptor};

pub use gemini::GeminiBackend;
pub use ollama::OllamaBackend;

/// An opaque model response. Each backend knows how to interpret its own
/// wire body; callers go through the extract methods.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    body: serde_json::Value,
}

impl ChatResponse {
    pub fn new(body: serde_json::Value) -> Self {
        Self { body }
    }

    pub fn body(&self) -> &serde_json::Value {
        &self.body
    }
}

/// One executed tool call fed back to the model
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub name: String,
    pub response: serde_json::Value,
}

/// Uniform capability set every backend implements
pub trait ChatBackend: Send {
    /// Establish a fresh session with the given tool declarations and system
    /// instruction, discarding any existing history.
    fn initialize_session(&mut self, tools: &[ToolDescriptor], system_instruction: &str) -> Result<()>;

    /// Send a user message (with optional context prefix) and return the raw
    /// response.
    fn send_message(&mut self, message: &str, context: &str) -> Result<ChatResponse>;

    /// Feed executed tool results back for a final synthesis pass.
    fn send_tool_results(&mut self, results: &[ToolResult]) -> Result<ChatResponse>;

    /// Tool calls the model requested, native structured calls first with a
    /// best-effort fallback parse of JSON embedded in prose. Empty when the
    /// model answered directly.
    fn extract_tool_calls(&self, response: &ChatResponse) -> Vec<ToolCall>;

    /// Plain-text answer, if any.
    fn extract_text(&self, response: &ChatResponse) -> Option<String>;

    fn identity(&self) -> BackendIdentity;

    /// History in the backend-agnostic shape, suitable for importing into a
    /// different backend.
    fn export_history(&self) -> Vec<GenericTurn>;

    /// Re-establish session state from a generic history, remapping roles
    /// into this backend's own vocabulary.
    fn import_history(&mut self, history: &[GenericTurn]);
}

/// Construct a backend by provider name. Selection is a configuration choice,
/// never runtime type inspection.
pub fn create_backend(
    provider: &str,
    model: Option<&str>,
    config: &AgentConfig,
) -> Result<Box<dyn ChatBackend>> {
    match provider.to_lowercase().as_str() {
        "gemini" => {
            let api_key = config
                .gemini_api_key
                .clone()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| {
                    MarqueeError::Config("GEMINI_API_KEY is required for the gemini provider".to_string())
                })?;
            let model = model.unwrap_or(&config.gemini_model).to_string();
            Ok(Box::new(GeminiBackend::new(
                api_key,
                model,
                config.request_timeout_secs,
            )?))
        }
        "ollama" => {
            let model = model.unwrap_or(&config.ollama_model).to_string();
            Ok(Box::new(OllamaBackend::new(
                config.ollama_base_url.clone(),
                model,
                config.request_timeout_secs,
            )?))
        }
        other => Err(MarqueeError::Backend(format!("Unknown provider: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_provider_is_backend_error() {
        let config = AgentConfig::for_testing();
        let err = create_backend("mistral", None, &config).err().unwrap();
        assert!(matches!(err, MarqueeError::Backend(_)));
    }

    #[test]
    fn gemini_without_key_is_config_error() {
        let config = AgentConfig::for_testing();
        let err = create_backend("gemini", None, &config).err().unwrap();
        assert!(matches!(err, MarqueeError::Config(_)));
    }

    #[test]
    fn model_override_applies() {
        let config = AgentConfig::for_testing();
        let backend = create_backend("ollama", Some("mistral:7b"), &config).unwrap();
        assert_eq!(backend.identity().model, "mistral:7b");
    }
}
