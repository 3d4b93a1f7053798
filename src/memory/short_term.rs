//! Short-term conversation buffer
//!
//! Ordered, bounded log of turns. Every append trims to the last `max_turns`;
//! the compressor runs upstream of that bound, so silent discard here is the
//! last resort rather than the normal path.

use crate::types::{ConversationTurn, GenericTurn, Role};

/// Rough chars-per-token divisor; a stand-in for a real tokenizer
const CHARS_PER_TOKEN: usize = 4;

/// Sliding-window conversation history
#[derive(Debug)]
pub struct ConversationBuffer {
    max_turns: usize,
    turns: Vec<ConversationTurn>,
}

impl ConversationBuffer {
    pub fn new(max_turns: usize) -> Self {
        Self {
            max_turns,
            turns: Vec::new(),
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(ConversationTurn::new(Role::User, content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(ConversationTurn::new(Role::Assistant, content));
    }

    pub fn push_tool(&mut self, tool_name: impl Into<String>, content: impl Into<String>) {
        self.push(ConversationTurn::tool(tool_name, content));
    }

    fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
        self.trim();
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The most recent `count` turns, oldest first
    pub fn recent(&self, count: usize) -> &[ConversationTurn] {
        let start = self.turns.len().saturating_sub(count);
        &self.turns[start..]
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Crude token estimate: total content chars divided by four
    pub fn estimated_tokens(&self) -> usize {
        let chars: usize = self.turns.iter().map(|t| t.content.len()).sum();
        chars / CHARS_PER_TOKEN
    }

    /// Role-normalized history in the provider-agnostic shape
    pub fn generic_history(&self) -> Vec<GenericTurn> {
        self.turns
            .iter()
            .map(|t| GenericTurn {
                role: t.role,
                content: t.content.clone(),
                tool_name: t.tool_name.clone(),
            })
            .collect()
    }

    /// Replace everything older than the kept tail with a single summary turn.
    /// Used by the compressor.
    pub(crate) fn replace_head_with_summary(&mut self, summary_turn: ConversationTurn, keep_recent: usize) {
        let start = self.turns.len().saturating_sub(keep_recent);
        let mut kept: Vec<ConversationTurn> = self.turns.split_off(start);
        self.turns.clear();
        self.turns.push(summary_turn);
        self.turns.append(&mut kept);
    }

    /// Last-10-turn digest as `role: preview` lines
    pub fn context_summary(&self) -> String {
        if self.turns.is_empty() {
            return "No conversation history.".to_string();
        }
        self.recent(10)
            .iter()
            .map(|t| {
                // Truncate on a char boundary, not a byte offset
                let preview = match t.content.char_indices().nth(100) {
                    Some((idx, _)) => format!("{}...", &t.content[..idx]),
                    None => t.content.clone(),
                };
                format!("{}: {}", t.role, preview)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn trim(&mut self) {
        if self.turns.len() > self.max_turns {
            let excess = self.turns.len() - self.max_turns;
            self.turns.drain(..excess);
        }
    }
}
