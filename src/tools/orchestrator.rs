//! Tool dispatch and result rendering
//!
//! Executes requested tool calls strictly in order, isolating failures per
//! call, and renders the combined results into a textual digest the model
//! (or, as a fallback, the user) can consume.

use serde_json::Value;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::warn;

use crate::telemetry::EventLog;
use crate::types::{ToolCall, ToolDescriptor, ToolInvocation, ToolOutcome};

use super::Tool;

/// Caps the rendered digest, not the tool results themselves
const RENDER_FILM_CAP: usize = 10;

/// Owns the tool registry and dispatches model-requested invocations
pub struct ToolOrchestrator {
    tools: HashMap<&'static str, Box<dyn Tool>>,
    /// Registration order, for stable declarations
    order: Vec<&'static str>,
}

impl ToolOrchestrator {
    pub fn new(tools: Vec<Box<dyn Tool>>) -> Self {
        let mut map = HashMap::new();
        let mut order = Vec::new();
        for tool in tools {
            order.push(tool.name());
            map.insert(tool.name(), tool);
        }
        Self { tools: map, order }
    }

    /// Declarations for session initialization, in registration order
    pub fn declarations(&self) -> Vec<ToolDescriptor> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.descriptor())
            .collect()
    }

    /// Dispatch a single call. Unknown names and execution errors both come
    /// back as failure outcomes; this never raises.
    pub fn dispatch(&self, call: &ToolCall, events: &EventLog) -> ToolInvocation {
        let Some(tool) = self.tools.get(call.name.as_str()) else {
            let error = format!("Unknown tool: {}", call.name);
            warn!(tool = %call.name, "requested tool not found");
            events.error("tool_not_found", &error, None);
            return ToolInvocation {
                name: call.name.clone(),
                args: call.args.clone(),
                outcome: ToolOutcome::failure(error),
            };
        };

        let outcome = match catch_unwind(AssertUnwindSafe(|| tool.execute(&call.args))) {
            Ok(outcome) => outcome,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<String>()
                    .cloned()
                    .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
                    .unwrap_or_else(|| "unknown panic".to_string());
                let error = format!("Tool execution error: {message}");
                events.error("tool_execution_error", &error, Some(&call.name));
                ToolOutcome::failure(error)
            }
        };

        events.tool_call(&call.name, &call.args, &outcome);
        ToolInvocation {
            name: call.name.clone(),
            args: call.args.clone(),
            outcome,
        }
    }

    /// Dispatch calls strictly in input order. One failure never aborts the
    /// remainder.
    pub fn dispatch_all(&self, calls: &[ToolCall], events: &EventLog) -> Vec<ToolInvocation> {
        calls.iter().map(|call| self.dispatch(call, events)).collect()
    }

    /// Natural-language digest of the results, one paragraph per call.
    ///
    /// This is also the user-visible fallback when the backend returns no text
    /// of its own after seeing the tool results.
    pub fn render_for_model(&self, invocations: &[ToolInvocation]) -> String {
        if invocations.is_empty() {
            return "No tool results available.".to_string();
        }

        let mut parts = Vec::new();
        for invocation in invocations {
            match &invocation.outcome {
                ToolOutcome::Failure { error } => {
                    parts.push(format!("Tool '{}' failed: {error}.", invocation.name));
                }
                ToolOutcome::Success { payload } => {
                    if payload.get("films").map_or(false, Value::is_array) {
                        parts.push(render_film_results(&invocation.name, payload));
                    } else {
                        let dump = serde_json::to_string_pretty(payload)
                            .unwrap_or_else(|_| payload.to_string());
                        parts.push(format!("Tool '{}' returned: {dump}", invocation.name));
                    }
                }
            }
        }
        parts.join("\n\n")
    }
}

fn search_label(tool_name: &str, payload: &Value) -> String {
    match tool_name {
        "search_by_title" => "title search".to_string(),
        "filter_by_genre" => format!(
            "genre '{}'",
            payload["genre"].as_str().unwrap_or("unknown")
        ),
        "search_by_rating" => format!(
            "rating {}",
            payload["rating_range"].as_str().unwrap_or("unknown")
        ),
        "search_by_actor" => format!(
            "actor '{}'",
            payload["actor"].as_str().unwrap_or("unknown")
        ),
        other => format!("'{other}'"),
    }
}

fn render_film_results(tool_name: &str, payload: &Value) -> String {
    let label = search_label(tool_name, payload);
    let films = payload["films"].as_array().cloned().unwrap_or_default();
    let count = payload["count"].as_u64().unwrap_or(films.len() as u64);

    if count == 0 {
        return format!("No films found for {label}.");
    }

    let mut lines = vec![format!("Found {count} film(s) for {label}:")];
    for (i, film) in films.iter().take(RENDER_FILM_CAP).enumerate() {
        let title = film["title"].as_str().unwrap_or("Unknown");
        let year = film["year"].as_i64().unwrap_or(0);
        let rating = film["rating"].as_f64().unwrap_or(0.0);
        let genres: Vec<&str> = film["genres"]
            .as_array()
            .map(|g| g.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let actors: Vec<&str> = film["actors"]
            .as_array()
            .map(|a| a.iter().filter_map(Value::as_str).take(3).collect())
            .unwrap_or_default();
        lines.push(format!(
            "{}. {title} ({year}) - Rating: {rating}/10\n   Genres: {}\n   Starring: {}",
            i + 1,
            genres.join(", "),
            actors.join(", "),
        ));
    }
    lines.join("\n")
}
