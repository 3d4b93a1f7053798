//! Core types for Marquee

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A film in the catalog, enriched with its genre and actor lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Film {
    pub id: i64,
    pub title: String,
    pub year: i32,
    pub rating: f64,
    pub description: String,
    /// Genres attached via the join table
    pub genres: Vec<String>,
    /// Actors attached via the join table, ordered by name
    pub actors: Vec<String>,
}

/// Who produced a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "tool" => Ok(Role::Tool),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single turn in the short-term conversation buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    /// Set only for `Role::Tool` turns
    pub tool_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_name: None,
            created_at: Utc::now(),
        }
    }

    pub fn tool(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_name: Some(name.into()),
            created_at: Utc::now(),
        }
    }
}

/// Backend-agnostic view of a turn, used to move history between providers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericTurn {
    pub role: Role,
    pub content: String,
    pub tool_name: Option<String>,
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub args: serde_json::Map<String, serde_json::Value>,
}

/// Outcome of a single tool execution: exactly one per call, never partial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ToolOutcome {
    Success { payload: serde_json::Value },
    Failure { error: String },
}

impl ToolOutcome {
    pub fn success(payload: serde_json::Value) -> Self {
        ToolOutcome::Success { payload }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        ToolOutcome::Failure {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success { .. })
    }

    /// Wire representation handed back to the model
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ToolOutcome::Success { payload } => {
                let mut obj = serde_json::Map::new();
                obj.insert("success".into(), serde_json::Value::Bool(true));
                if let serde_json::Value::Object(fields) = payload {
                    for (k, v) in fields {
                        obj.insert(k.clone(), v.clone());
                    }
                }
                serde_json::Value::Object(obj)
            }
            ToolOutcome::Failure { error } => serde_json::json!({
                "success": false,
                "error": error,
            }),
        }
    }
}

/// A dispatched tool call together with its outcome
#[derive(Debug, Clone, Serialize)]
pub struct ToolInvocation {
    pub name: String,
    pub args: serde_json::Map<String, serde_json::Value>,
    pub outcome: ToolOutcome,
}

/// Schema for a single tool parameter
#[derive(Debug, Clone, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    /// JSON schema type: "string", "number", ...
    pub json_type: &'static str,
    pub description: String,
    pub required: bool,
}

impl ParamSpec {
    pub fn required(name: &'static str, json_type: &'static str, description: impl Into<String>) -> Self {
        Self {
            name,
            json_type,
            description: description.into(),
            required: true,
        }
    }

    pub fn optional(name: &'static str, json_type: &'static str, description: impl Into<String>) -> Self {
        Self {
            name,
            json_type,
            description: description.into(),
            required: false,
        }
    }
}

/// Self-describing tool declaration handed to LLM backends
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParamSpec>,
}

impl ToolDescriptor {
    /// JSON-schema-shaped declaration: `{name, description, parameters}`
    pub fn to_schema(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for param in &self.parameters {
            properties.insert(
                param.name.to_string(),
                serde_json::json!({
                    "type": param.json_type,
                    "description": param.description,
                }),
            );
            if param.required {
                required.push(serde_json::Value::String(param.name.to_string()));
            }
        }
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "parameters": {
                "type": "object",
                "properties": properties,
                "required": required,
            },
        })
    }
}

/// A durable user preference fact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preference {
    pub preference_type: String,
    pub preference_value: String,
    pub confidence: f64,
    pub updated_at: DateTime<Utc>,
}

/// Identity of the active LLM backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendIdentity {
    pub provider: String,
    pub model: String,
}

impl fmt::Display for BackendIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.provider, self.model)
    }
}
