//! Fallback tool-call parsing
//!
//! Not every model emits native structured calls; some describe the call as
//! JSON inside prose. This scanner looks for fenced ```json blocks first,
//! then raw brace-delimited objects, accepting only objects that carry both
//! `tool` and `args` keys. Malformed candidates are skipped silently.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::types::ToolCall;

static FENCED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```json\s*(\{.*?\})\s*```").unwrap());

/// Scan free text for embedded tool requests
pub fn scan_embedded_tool_calls(text: &str) -> Vec<ToolCall> {
    let mut calls = Vec::new();

    for capture in FENCED_JSON.captures_iter(text) {
        if let Ok(value) = serde_json::from_str::<Value>(&capture[1]) {
            if let Some(call) = tool_call_from_value(&value) {
                calls.push(call);
            }
        }
    }
    if !calls.is_empty() {
        return calls;
    }

    // No fenced blocks matched; scan for bare JSON objects
    let mut pos = 0;
    while let Some(offset) = text[pos..].find('{') {
        let start = pos + offset;
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) => {
                if let Some(call) = tool_call_from_value(&value) {
                    calls.push(call);
                }
                pos = start + stream.byte_offset().max(1);
            }
            _ => pos = start + 1,
        }
    }

    calls
}

fn tool_call_from_value(value: &Value) -> Option<ToolCall> {
    let obj = value.as_object()?;
    let name = obj.get("tool")?.as_str()?;
    let args = obj.get("args")?.as_object()?;
    Some(ToolCall {
        name: name.to_string(),
        args: args.clone(),
    })
}
