//! Ollama (local) backend
//!
//! Talks to `/api/chat` with client-side `messages`. Models without native
//! tool support get a JSON-mode instruction appended instead, and tool
//! requests are recovered by the free-text fallback parser.

use serde_json::{json, Value};
use std::time::Duration;

use tracing::debug;

use crate::error::{MarqueeError, Result};
use crate::types::{BackendIdentity, GenericTurn, Role, ToolCall, ToolDescriptor};

use super::{parse, ChatBackend, ChatResponse, ToolResult};

const JSON_MODE_NOTE: &str = "\n\nSYSTEM: This model does not support native tools. If you need to \
search or use a tool, output valid JSON: {\"tool\": \"tool_name\", \"args\": {...}}.";

pub struct OllamaBackend {
    client: reqwest::blocking::Client,
    base_url: String,
    model: String,
    /// Tool declarations in Ollama's function shape
    tools: Vec<Value>,
    /// Client-side conversation state, system message first when present
    messages: Vec<Value>,
}

impl OllamaBackend {
    pub fn new(base_url: String, model: String, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url,
            model,
            tools: Vec::new(),
            messages: Vec::new(),
        })
    }

    fn request(&self, with_tools: bool) -> Result<Value> {
        let mut body = json!({
            "model": self.model,
            "messages": self.messages,
            "stream": false,
        });
        if with_tools && !self.tools.is_empty() {
            body["tools"] = json!(self.tools);
        }

        let url = format!("{}/api/chat", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| MarqueeError::from_request("ollama chat", e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(MarqueeError::Backend(format!(
                "Ollama API error ({status}): {detail}"
            )));
        }
        response
            .json()
            .map_err(|e| MarqueeError::from_request("ollama response body", e))
    }

    fn chat(&mut self) -> Result<ChatResponse> {
        let body = match self.request(true) {
            Ok(body) => body,
            // Tool-less models reject the request outright; retry in JSON mode
            Err(MarqueeError::Backend(msg)) if msg.contains("does not support tools") => {
                debug!(model = %self.model, "model lacks native tools, retrying in JSON mode");
                if let Some(last) = self
                    .messages
                    .iter_mut()
                    .rev()
                    .find(|m| m["role"] == json!("user"))
                {
                    let content = last["content"].as_str().unwrap_or_default().to_string();
                    if !content.ends_with(JSON_MODE_NOTE) {
                        last["content"] = json!(format!("{content}{JSON_MODE_NOTE}"));
                    }
                }
                self.request(false)?
            }
            Err(e) => return Err(e),
        };

        if let Some(message) = body.get("message") {
            self.messages.push(message.clone());
        }
        Ok(ChatResponse::new(body))
    }
}

impl ChatBackend for OllamaBackend {
    fn initialize_session(&mut self, tools: &[ToolDescriptor], system_instruction: &str) -> Result<()> {
        self.messages.clear();
        if !system_instruction.is_empty() {
            self.messages
                .push(json!({ "role": "system", "content": system_instruction }));
        }
        self.tools = tools
            .iter()
            .map(|tool| {
                let schema = tool.to_schema();
                json!({
                    "type": "function",
                    "function": {
                        "name": schema["name"],
                        "description": schema["description"],
                        "parameters": schema["parameters"],
                    }
                })
            })
            .collect();
        Ok(())
    }

    fn send_message(&mut self, message: &str, context: &str) -> Result<ChatResponse> {
        let full_message = if context.is_empty() {
            message.to_string()
        } else {
            format!("{context}\n\n{message}")
        };
        self.messages
            .push(json!({ "role": "user", "content": full_message }));
        self.chat()
    }

    fn send_tool_results(&mut self, results: &[ToolResult]) -> Result<ChatResponse> {
        for result in results {
            self.messages.push(json!({
                "role": "tool",
                "content": result.response.to_string(),
            }));
        }
        self.chat()
    }

    fn extract_tool_calls(&self, response: &ChatResponse) -> Vec<ToolCall> {
        let message = &response.body()["message"];
        if let Some(tool_calls) = message["tool_calls"].as_array() {
            let calls: Vec<ToolCall> = tool_calls
                .iter()
                .filter_map(|tc| {
                    let function = tc.get("function")?;
                    let name = function["name"].as_str()?.to_string();
                    let args = function["arguments"].as_object().cloned().unwrap_or_default();
                    Some(ToolCall { name, args })
                })
                .collect();
            if !calls.is_empty() {
                return calls;
            }
        }
        match message["content"].as_str() {
            Some(content) if !content.is_empty() => parse::scan_embedded_tool_calls(content),
            _ => Vec::new(),
        }
    }

    fn extract_text(&self, response: &ChatResponse) -> Option<String> {
        response.body()["message"]["content"]
            .as_str()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    fn identity(&self) -> BackendIdentity {
        BackendIdentity {
            provider: "Ollama (Local)".to_string(),
            model: self.model.clone(),
        }
    }

    fn export_history(&self) -> Vec<GenericTurn> {
        self.messages
            .iter()
            .filter(|m| m["role"] != json!("system"))
            .map(|m| {
                let role = match m["role"].as_str() {
                    Some("assistant") => Role::Assistant,
                    Some("tool") => Role::Tool,
                    _ => Role::User,
                };
                GenericTurn {
                    role,
                    content: m["content"].as_str().unwrap_or_default().to_string(),
                    tool_name: m["tool_name"].as_str().map(str::to_string),
                }
            })
            .collect()
    }

    fn import_history(&mut self, history: &[GenericTurn]) {
        // Keep the system instruction from initialization, replace the rest
        let system = self
            .messages
            .first()
            .filter(|m| m["role"] == json!("system"))
            .cloned();
        self.messages = system.into_iter().collect();
        for turn in history {
            let mut message = json!({
                "role": turn.role.as_str(),
                "content": turn.content,
            });
            if let Some(tool_name) = &turn.tool_name {
                message["tool_name"] = json!(tool_name);
            }
            self.messages.push(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> OllamaBackend {
        OllamaBackend::new("http://localhost:11434".to_string(), "llama3.1".to_string(), 30).unwrap()
    }

    #[test]
    fn extracts_native_tool_calls() {
        let backend = backend();
        let response = ChatResponse::new(json!({
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [
                    { "function": { "name": "search_by_actor", "arguments": { "actor_name": "Hanks" } } }
                ]
            }
        }));
        let calls = backend.extract_tool_calls(&response);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "search_by_actor");
        assert_eq!(calls[0].args["actor_name"], json!("Hanks"));
    }

    #[test]
    fn falls_back_to_content_json() {
        let backend = backend();
        let response = ChatResponse::new(json!({
            "message": {
                "role": "assistant",
                "content": "{\"tool\": \"search_by_rating\", \"args\": {\"min_rating\": 8}}"
            }
        }));
        let calls = backend.extract_tool_calls(&response);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "search_by_rating");
    }

    #[test]
    fn empty_content_yields_no_text() {
        let backend = backend();
        let response = ChatResponse::new(json!({ "message": { "content": "" } }));
        assert_eq!(backend.extract_text(&response), None);
    }

    #[test]
    fn import_preserves_system_message() {
        let mut backend = backend();
        backend
            .initialize_session(&[], "You are a film assistant.")
            .unwrap();
        backend.import_history(&[GenericTurn {
            role: Role::User,
            content: "hi".to_string(),
            tool_name: None,
        }]);
        assert_eq!(backend.messages.len(), 2);
        assert_eq!(backend.messages[0]["role"], json!("system"));
        assert_eq!(backend.messages[1]["role"], json!("user"));

        // Export hides the system message and round-trips the rest
        let exported = backend.export_history();
        assert_eq!(exported.len(), 1);
        assert_eq!(exported[0].role, Role::User);
        assert_eq!(exported[0].content, "hi");
    }

    #[test]
    fn tool_turns_round_trip_with_names() {
        let mut backend = backend();
        let history = vec![GenericTurn {
            role: Role::Tool,
            content: "{\"success\":true}".to_string(),
            tool_name: Some("search_by_title".to_string()),
        }];
        backend.import_history(&history);
        assert_eq!(backend.export_history(), history);
    }
}
