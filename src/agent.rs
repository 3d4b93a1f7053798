//! Session orchestration
//!
//! The agent composes the catalog tools, both memory tiers, the compressor,
//! and the active LLM backend into the end-to-end query cycle, including
//! mid-session backend hot-swap with rollback.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use std::sync::Arc;

use tracing::{debug, info};

use crate::catalog::CatalogStore;
use crate::config::AgentConfig;
use crate::error::Result;
use crate::memory::{compress_if_needed, ConversationBuffer, ProfileStore};
use crate::provider::{ChatBackend, ChatResponse, ToolResult};
use crate::telemetry::EventLog;
use crate::tools::{create_film_tools, ToolOrchestrator};
use crate::types::{BackendIdentity, Role, ToolCall};

const SYSTEM_INSTRUCTION: &str = "You are an intelligent film assistant. You help users discover and learn about films.

You have access to tools to search for films by:
- Title (partial matches supported)
- Genre
- Rating range
- Actor name

You can call multiple tools in sequence to answer complex queries. For example:
- \"Show me action movies with high ratings\" -> filter_by_genre + search_by_rating
- \"Find sci-fi films starring Tom Hanks\" -> filter_by_genre + search_by_actor

Always be helpful, conversational, and personalize responses based on user preferences when available.
When presenting film results, highlight the most relevant information and make recommendations.";

const FALLBACK_ANSWER: &str = "I'm not sure how to help with that.";

static NAME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    ["my name is (\\w+)", "i'm (\\w+)", "i am (\\w+)", "call me (\\w+)"]
        .iter()
        .map(|p| Regex::new(p).expect("valid name pattern"))
        .collect()
});

/// Genre vocabulary for preference extraction: (canonical name, trigger words)
const GENRE_KEYWORDS: &[(&str, &[&str])] = &[
    ("sci-fi", &["sci-fi", "science fiction", "scifi"]),
    ("action", &["action"]),
    ("drama", &["drama"]),
    ("comedy", &["comedy", "funny"]),
    ("thriller", &["thriller", "suspense"]),
    ("horror", &["horror", "scary"]),
    ("romance", &["romance", "romantic"]),
    ("animation", &["animation", "animated"]),
];

/// The film assistant session
pub struct Agent {
    config: AgentConfig,
    profile: ProfileStore,
    buffer: ConversationBuffer,
    orchestrator: ToolOrchestrator,
    backend: Box<dyn ChatBackend>,
    events: EventLog,
    /// None until a session starts
    user_id: Option<i64>,
}

impl Agent {
    /// Wire up an agent over already-open stores and a constructed backend.
    /// Initializes the backend session with the tool declarations.
    pub fn new(
        config: AgentConfig,
        catalog: Arc<CatalogStore>,
        profile: ProfileStore,
        mut backend: Box<dyn ChatBackend>,
        events: EventLog,
    ) -> Result<Self> {
        let orchestrator = ToolOrchestrator::new(create_film_tools(catalog));
        backend.initialize_session(&orchestrator.declarations(), SYSTEM_INSTRUCTION)?;
        let buffer = ConversationBuffer::new(config.max_buffer_turns);
        Ok(Self {
            config,
            profile,
            buffer,
            orchestrator,
            backend,
            events,
            user_id: None,
        })
    }

    /// Bind a user (resolving or creating the profile) and return a greeting
    pub fn start_session(&mut self, user_name: Option<&str>) -> Result<String> {
        let user_id = self.profile.get_or_create_user(user_name)?;
        if let Some(name) = user_name {
            self.profile.set_user_name(user_id, name)?;
        }
        self.user_id = Some(user_id);
        self.events
            .memory_op("session_start", json!({ "user_id": user_id, "user_name": user_name }));
        info!(user_id, "session started");

        Ok(match user_name {
            Some(name) => format!(
                "Hello {name}! I'm your film assistant. How can I help you discover great films today?"
            ),
            None => "Hello! I'm your film assistant. How can I help you discover great films today?"
                .to_string(),
        })
    }

    /// Process one query end to end. Never raises: any failure in the cycle
    /// is reported as a user-visible string and the session stays usable.
    pub fn process_query(&mut self, query: &str) -> String {
        match self.try_process_query(query) {
            Ok(answer) => answer,
            Err(e) => {
                self.events
                    .error("query_processing_error", &e.to_string(), Some(query));
                format!("I encountered an error: {e}")
            }
        }
    }

    fn try_process_query(&mut self, query: &str) -> Result<String> {
        let user_id = match self.user_id {
            Some(id) => id,
            None => {
                // Anonymous session on first contact
                self.start_session(None)?;
                self.user_id.unwrap_or_default()
            }
        };

        self.events.user_query(user_id, query);
        self.extract_user_name(user_id, query)?;

        self.buffer.push_user(query);
        self.profile.save_turn(user_id, Role::User, query, None)?;

        let user_context = self.profile.user_context(user_id)?;
        let summary = compress_if_needed(
            &mut self.buffer,
            &user_context,
            self.config.compression_threshold,
        );
        if !summary.is_empty() {
            debug!(summary = %summary, "compressed conversation context");
            self.events
                .memory_op("context_compressed", json!({ "summary": summary }));
        }

        let context = self.build_context(&user_context);
        let response = self.backend.send_message(query, &context)?;

        let tool_calls = self.backend.extract_tool_calls(&response);
        let answer = if tool_calls.is_empty() {
            self.backend
                .extract_text(&response)
                .unwrap_or_else(|| FALLBACK_ANSWER.to_string())
        } else {
            self.handle_tool_calls(user_id, &tool_calls)?
        };

        self.buffer.push_assistant(&answer);
        self.profile
            .save_turn(user_id, Role::Assistant, &answer, None)?;
        self.extract_preferences(user_id, query)?;
        self.events.agent_response(user_id, &answer);
        Ok(answer)
    }

    /// Dispatch requested tools in order, feed the results back, and take the
    /// model's synthesis, falling back to the rendered digest.
    fn handle_tool_calls(&mut self, user_id: i64, calls: &[ToolCall]) -> Result<String> {
        let invocations = self.orchestrator.dispatch_all(calls, &self.events);

        for invocation in &invocations {
            let content = invocation.outcome.to_json().to_string();
            self.buffer.push_tool(&invocation.name, &content);
            self.profile
                .save_turn(user_id, Role::Tool, &content, Some(&invocation.name))?;
        }

        let results: Vec<ToolResult> = invocations
            .iter()
            .map(|inv| ToolResult {
                name: inv.name.clone(),
                response: inv.outcome.to_json(),
            })
            .collect();
        let response: ChatResponse = self.backend.send_tool_results(&results)?;

        Ok(self
            .backend
            .extract_text(&response)
            .unwrap_or_else(|| self.orchestrator.render_for_model(&invocations)))
    }

    /// Swap the active backend, committing only if construction, session
    /// initialization, and history import all succeed. On failure the prior
    /// backend stays active and a descriptive string is returned.
    pub fn switch_provider(&mut self, provider: &str, model: Option<&str>) -> String {
        let history = self.backend.export_history();

        let mut new_backend = match crate::provider::create_backend(provider, model, &self.config) {
            Ok(backend) => backend,
            Err(e) => return format!("Failed to initialize {provider}: {e}"),
        };
        if let Err(e) =
            new_backend.initialize_session(&self.orchestrator.declarations(), SYSTEM_INSTRUCTION)
        {
            return format!("Failed to initialize {provider}: {e}");
        }
        new_backend.import_history(&history);

        self.backend = new_backend;
        let identity = self.backend.identity();
        info!(provider = %identity.provider, model = %identity.model, "switched backend");
        format!("Successfully switched to {provider} ({})", identity.model)
    }

    pub fn identity(&self) -> BackendIdentity {
        self.backend.identity()
    }

    /// Long-term store backing this session
    pub fn profile(&self) -> &ProfileStore {
        &self.profile
    }

    /// Bound user, if a session has started
    pub fn user_id(&self) -> Option<i64> {
        self.user_id
    }

    /// Last-10-turn digest of the current conversation
    pub fn conversation_summary(&self) -> String {
        self.buffer.context_summary()
    }

    /// Drop the short-term conversation state; the transcript remains
    pub fn clear_conversation(&mut self) {
        self.buffer.clear();
        self.events.memory_op("buffer_cleared", json!({}));
    }

    fn build_context(&self, user_context: &str) -> String {
        if user_context.is_empty() || user_context == "No user context available." {
            String::new()
        } else {
            format!("=== User Profile ===\n{user_context}")
        }
    }

    /// Pick up a stated name ("my name is X", "call me X", ...) and persist it
    fn extract_user_name(&mut self, user_id: i64, query: &str) -> Result<()> {
        let lowered = query.to_lowercase();
        for pattern in NAME_PATTERNS.iter() {
            if let Some(captures) = pattern.captures(&lowered) {
                let raw = &captures[1];
                let name = capitalize(raw);
                self.profile.set_user_name(user_id, &name)?;
                self.events
                    .memory_op("user_name_extracted", json!({ "name": name }));
                break;
            }
        }
        Ok(())
    }

    /// Keyword/co-occurrence preference heuristic
    fn extract_preferences(&mut self, user_id: i64, query: &str) -> Result<()> {
        let lowered = query.to_lowercase();
        let liking = ["love", "like", "favorite"]
            .iter()
            .any(|w| lowered.contains(w));

        if liking {
            for (genre, keywords) in GENRE_KEYWORDS {
                if keywords.iter().any(|k| lowered.contains(k)) {
                    self.profile
                        .add_preference(user_id, "favorite_genre", genre, 0.8)?;
                    self.events.memory_op(
                        "preference_extracted",
                        json!({ "type": "favorite_genre", "value": genre }),
                    );
                }
            }
        }

        if lowered.contains("high rating") || lowered.contains("best") || lowered.contains("top rated")
        {
            self.profile
                .add_preference(user_id, "rating_preference", "high_rating", 0.7)?;
        }
        Ok(())
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
