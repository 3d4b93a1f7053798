//! Google Gemini backend
//!
//! Talks to the stateless `generateContent` REST endpoint, so the full
//! conversation is kept client-side as `contents` with Gemini's native role
//! vocabulary (`user` / `model` / `function`).

use serde_json::{json, Value};
use std::time::Duration;

use crate::error::{MarqueeError, Result};
use crate::types::{BackendIdentity, GenericTurn, Role, ToolCall, ToolDescriptor};

use super::{parse, ChatBackend, ChatResponse, ToolResult};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiBackend {
    client: reqwest::blocking::Client,
    api_key: String,
    model: String,
    base_url: String,
    system_instruction: Option<String>,
    /// Tool declarations in Gemini's functionDeclarations shape
    tool_declarations: Vec<Value>,
    /// Client-side conversation state in Gemini's native shape
    contents: Vec<Value>,
}

impl GeminiBackend {
    pub fn new(api_key: String, model: String, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            system_instruction: None,
            tool_declarations: Vec::new(),
            contents: Vec::new(),
        })
    }

    fn generate(&mut self) -> Result<ChatResponse> {
        let mut body = json!({
            "contents": self.contents,
            "generationConfig": {
                "temperature": 0.7,
                "topP": 0.95,
                "topK": 40,
                "maxOutputTokens": 2048,
            },
        });
        if !self.tool_declarations.is_empty() {
            body["tools"] = json!([{ "functionDeclarations": self.tool_declarations }]);
        }
        if let Some(system) = &self.system_instruction {
            body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| MarqueeError::from_request("gemini generateContent", e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(MarqueeError::Backend(format!(
                "Gemini API error ({status}): {detail}"
            )));
        }

        let body: Value = response
            .json()
            .map_err(|e| MarqueeError::from_request("gemini response body", e))?;

        // Fold the model's reply into client-side history, functionCall parts
        // included, so the follow-up request carries the full exchange.
        if let Some(content) = body.pointer("/candidates/0/content") {
            self.contents.push(content.clone());
        }
        Ok(ChatResponse::new(body))
    }

    fn response_parts<'a>(&self, response: &'a ChatResponse) -> &'a [Value] {
        response
            .body()
            .pointer("/candidates/0/content/parts")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl ChatBackend for GeminiBackend {
    fn initialize_session(&mut self, tools: &[ToolDescriptor], system_instruction: &str) -> Result<()> {
        self.tool_declarations = tools.iter().map(ToolDescriptor::to_schema).collect();
        self.system_instruction = if system_instruction.is_empty() {
            None
        } else {
            Some(system_instruction.to_string())
        };
        self.contents.clear();
        Ok(())
    }

    fn send_message(&mut self, message: &str, context: &str) -> Result<ChatResponse> {
        let full_message = if context.is_empty() {
            message.to_string()
        } else {
            format!("{context}\n\n{message}")
        };
        self.contents
            .push(json!({ "role": "user", "parts": [{ "text": full_message }] }));
        self.generate()
    }

    fn send_tool_results(&mut self, results: &[ToolResult]) -> Result<ChatResponse> {
        let parts: Vec<Value> = results
            .iter()
            .map(|r| {
                json!({
                    "functionResponse": {
                        "name": r.name,
                        "response": { "result": r.response },
                    }
                })
            })
            .collect();
        self.contents.push(json!({ "role": "function", "parts": parts }));
        self.generate()
    }

    fn extract_tool_calls(&self, response: &ChatResponse) -> Vec<ToolCall> {
        let mut calls = Vec::new();
        for part in self.response_parts(response) {
            if let Some(fc) = part.get("functionCall") {
                let name = fc["name"].as_str().unwrap_or_default().to_string();
                let args = fc["args"].as_object().cloned().unwrap_or_default();
                if !name.is_empty() {
                    calls.push(ToolCall { name, args });
                }
            }
        }
        if !calls.is_empty() {
            return calls;
        }
        // Some replies describe the call as JSON in prose instead
        match self.extract_text(response) {
            Some(text) => parse::scan_embedded_tool_calls(&text),
            None => Vec::new(),
        }
    }

    fn extract_text(&self, response: &ChatResponse) -> Option<String> {
        self.response_parts(response)
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .find(|text| !text.is_empty())
            .map(str::to_string)
    }

    fn identity(&self) -> BackendIdentity {
        BackendIdentity {
            provider: "Google Gemini".to_string(),
            model: self.model.clone(),
        }
    }

    fn export_history(&self) -> Vec<GenericTurn> {
        self.contents
            .iter()
            .map(|content| {
                let role = match content["role"].as_str() {
                    Some("model") => Role::Assistant,
                    Some("function") => Role::Tool,
                    _ => Role::User,
                };
                let parts = content["parts"].as_array().cloned().unwrap_or_default();
                let mut text_parts = Vec::new();
                let mut tool_name = None;
                for part in &parts {
                    if let Some(text) = part.get("text").and_then(Value::as_str) {
                        text_parts.push(text.to_string());
                    } else if let Some(fr) = part.get("functionResponse") {
                        tool_name = fr["name"].as_str().map(str::to_string);
                        text_parts.push(fr["response"].to_string());
                    } else if let Some(fc) = part.get("functionCall") {
                        text_parts.push(fc.to_string());
                    }
                }
                GenericTurn {
                    role,
                    content: text_parts.join("\n"),
                    tool_name,
                }
            })
            .collect()
    }

    fn import_history(&mut self, history: &[GenericTurn]) {
        self.contents = history
            .iter()
            .map(|turn| {
                let role = match turn.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                    Role::Tool => "function",
                };
                json!({ "role": role, "parts": [{ "text": turn.content }] })
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> GeminiBackend {
        GeminiBackend::new("test-key".to_string(), "gemini-1.5-flash".to_string(), 30).unwrap()
    }

    fn function_call_response() -> ChatResponse {
        ChatResponse::new(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "functionCall": { "name": "search_by_title", "args": { "title": "inception" } } },
                        { "functionCall": { "name": "search_by_rating", "args": { "min_rating": 8.0 } } },
                    ]
                }
            }]
        }))
    }

    #[test]
    fn extracts_native_function_calls_in_order() {
        let backend = backend();
        let calls = backend.extract_tool_calls(&function_call_response());
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].name, "search_by_title");
        assert_eq!(calls[1].name, "search_by_rating");
    }

    #[test]
    fn falls_back_to_prose_json() {
        let backend = backend();
        let response = ChatResponse::new(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{ "text": "```json\n{\"tool\": \"filter_by_genre\", \"args\": {\"genre\": \"Drama\"}}\n```" }]
                }
            }]
        }));
        let calls = backend.extract_tool_calls(&response);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "filter_by_genre");
    }

    #[test]
    fn text_extraction_skips_non_text_parts() {
        let backend = backend();
        assert_eq!(backend.extract_text(&function_call_response()), None);

        let response = ChatResponse::new(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Here you go." }] }
            }]
        }));
        assert_eq!(backend.extract_text(&response).as_deref(), Some("Here you go."));
    }

    #[test]
    fn history_round_trips_through_generic_shape() {
        let mut backend = backend();
        let history = vec![
            GenericTurn {
                role: Role::User,
                content: "hello".to_string(),
                tool_name: None,
            },
            GenericTurn {
                role: Role::Assistant,
                content: "hi there".to_string(),
                tool_name: None,
            },
        ];
        backend.import_history(&history);
        // Native storage uses Gemini's role names
        assert_eq!(backend.contents[1]["role"], json!("model"));

        let exported = backend.export_history();
        assert_eq!(exported.len(), 2);
        assert_eq!(exported[0].role, Role::User);
        assert_eq!(exported[0].content, "hello");
        assert_eq!(exported[1].role, Role::Assistant);
        assert_eq!(exported[1].content, "hi there");
    }
}
