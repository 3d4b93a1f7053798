//! Context compression
//!
//! One-shot, lossy collapse of older buffer turns into a single synthesized
//! summary turn. Deterministic: no LLM call is involved. Runs only when the
//! estimated token count crosses the threshold and there is enough material
//! to summarize.

use crate::config::COMPRESSION_KEEP_RECENT;
use crate::types::{ConversationTurn, Role};

use super::short_term::ConversationBuffer;

/// Compress the buffer when its token estimate exceeds `threshold`.
///
/// Keeps the last ten turns verbatim and replaces everything older with one
/// assistant-role summary turn. Returns the summary text, or an empty string
/// when nothing was compressed.
pub fn compress_if_needed(
    buffer: &mut ConversationBuffer,
    user_context: &str,
    threshold: usize,
) -> String {
    if buffer.estimated_tokens() <= threshold {
        return String::new();
    }
    // Not enough material to be worth collapsing
    if buffer.len() <= COMPRESSION_KEEP_RECENT {
        return String::new();
    }

    let cutoff = buffer.len() - COMPRESSION_KEEP_RECENT;
    let summary = build_summary(&buffer.turns()[..cutoff], user_context);

    let summary_turn = ConversationTurn::new(
        Role::Assistant,
        format!("[Previous conversation summary: {summary}]"),
    );
    buffer.replace_head_with_summary(summary_turn, COMPRESSION_KEEP_RECENT);
    summary
}

fn build_summary(turns: &[ConversationTurn], user_context: &str) -> String {
    let mut user_queries: Vec<&str> = Vec::new();
    let mut tool_names: Vec<&str> = Vec::new();

    for turn in turns {
        match turn.role {
            Role::User => {
                if user_queries.len() < 5 && !user_queries.contains(&turn.content.as_str()) {
                    user_queries.push(&turn.content);
                }
            }
            Role::Tool => {
                if let Some(name) = turn.tool_name.as_deref() {
                    if !tool_names.contains(&name) {
                        tool_names.push(name);
                    }
                }
            }
            Role::Assistant => {}
        }
    }

    let mut parts = Vec::new();
    if !user_context.is_empty() {
        parts.push(format!("User info: {user_context}"));
    }
    if !user_queries.is_empty() {
        parts.push(format!("User asked about: {}", user_queries.join(", ")));
    }
    if !tool_names.is_empty() {
        parts.push(format!("Tools used: {}", tool_names.join(", ")));
    }

    if parts.is_empty() {
        "General film discussion".to_string()
    } else {
        parts.join(". ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_buffer(turns: usize) -> ConversationBuffer {
        let mut buffer = ConversationBuffer::new(50);
        for i in 0..turns {
            if i % 2 == 0 {
                buffer.push_user(format!("question {i}"));
            } else {
                buffer.push_assistant(format!("answer {i}"));
            }
        }
        buffer
    }

    #[test]
    fn compresses_to_summary_plus_tail() {
        let mut buffer = filled_buffer(20);
        let summary = compress_if_needed(&mut buffer, "", 1);
        assert!(!summary.is_empty());
        assert_eq!(buffer.len(), 11);
        assert!(buffer.turns()[0]
            .content
            .starts_with("[Previous conversation summary:"));
        assert_eq!(buffer.turns()[0].role, Role::Assistant);
        // The tail survives verbatim
        assert_eq!(buffer.turns()[10].content, "answer 19");
    }

    #[test]
    fn no_op_under_threshold() {
        let mut buffer = filled_buffer(20);
        let summary = compress_if_needed(&mut buffer, "", usize::MAX);
        assert!(summary.is_empty());
        assert_eq!(buffer.len(), 20);
    }

    #[test]
    fn no_op_with_few_turns_regardless_of_threshold() {
        let mut buffer = filled_buffer(10);
        let summary = compress_if_needed(&mut buffer, "", 0);
        assert!(summary.is_empty());
        assert_eq!(buffer.len(), 10);
    }

    #[test]
    fn summary_collects_queries_and_tools() {
        let mut buffer = ConversationBuffer::new(50);
        for _ in 0..6 {
            buffer.push_user("show me sci-fi films");
            buffer.push_tool("filter_by_genre", "{}");
        }
        for i in 0..10 {
            buffer.push_assistant(format!("tail {i}"));
        }
        let summary = compress_if_needed(&mut buffer, "User name: Dana", 1);
        assert!(summary.contains("User info: User name: Dana"));
        // Deduplicated
        assert_eq!(summary.matches("show me sci-fi films").count(), 1);
        assert!(summary.contains("Tools used: filter_by_genre"));
    }

    #[test]
    fn fallback_summary_text() {
        let mut buffer = ConversationBuffer::new(50);
        for i in 0..11 {
            buffer.push_assistant(format!("note {i}"));
        }
        for i in 0..10 {
            buffer.push_assistant(format!("tail {i}"));
        }
        let summary = compress_if_needed(&mut buffer, "", 1);
        assert_eq!(summary, "General film discussion");
    }
}
