//! Property-based tests for marquee
//!
//! Invariants that must hold for all inputs:
//! - The conversation buffer never exceeds its window
//! - Compression is a no-op on small buffers and always leaves 11 turns otherwise
//! - The token estimate is exactly total chars / 4
//!
//! Run with: cargo test --test property_tests

use proptest::prelude::*;

use marquee::memory::{compress_if_needed, ConversationBuffer};

proptest! {
    /// Invariant: len <= max_turns after every mutation, and the survivors are
    /// the most recent appends in original order
    #[test]
    fn buffer_stays_bounded(max_turns in 1usize..64, appends in 0usize..200) {
        let mut buffer = ConversationBuffer::new(max_turns);
        for i in 0..appends {
            buffer.push_user(format!("m{i}"));
            prop_assert!(buffer.len() <= max_turns);
        }
        let expected = appends.min(max_turns);
        prop_assert_eq!(buffer.len(), expected);
        if expected > 0 {
            let first_kept = appends - expected;
            prop_assert_eq!(buffer.turns()[0].content.clone(), format!("m{first_kept}"));
            prop_assert_eq!(
                buffer.turns()[expected - 1].content.clone(),
                format!("m{}", appends - 1)
            );
        }
    }

    /// Invariant: token estimate is total content chars divided by 4
    #[test]
    fn token_estimate_matches_chars(contents in proptest::collection::vec("[a-zA-Z ]{0,80}", 0..30)) {
        let mut buffer = ConversationBuffer::new(100);
        let total: usize = contents.iter().map(String::len).sum();
        for content in &contents {
            buffer.push_user(content.clone());
        }
        prop_assert_eq!(buffer.estimated_tokens(), total / 4);
    }

    /// Invariant: buffers of 10 or fewer turns are never compressed, no matter
    /// the threshold
    #[test]
    fn small_buffers_never_compress(turns in 0usize..=10) {
        let mut buffer = ConversationBuffer::new(50);
        for i in 0..turns {
            buffer.push_user(format!("question {i} with some padding text"));
        }
        let summary = compress_if_needed(&mut buffer, "", 0);
        prop_assert!(summary.is_empty());
        prop_assert_eq!(buffer.len(), turns);
    }

    /// Invariant: an over-threshold buffer with more than 10 turns always
    /// collapses to exactly 11 (summary + retained tail)
    #[test]
    fn compression_always_leaves_eleven(turns in 11usize..50) {
        let mut buffer = ConversationBuffer::new(64);
        for i in 0..turns {
            buffer.push_user(format!("question number {i}"));
        }
        let summary = compress_if_needed(&mut buffer, "", 0);
        prop_assert!(!summary.is_empty());
        prop_assert_eq!(buffer.len(), 11);
        prop_assert!(buffer.turns()[0].content.starts_with("[Previous conversation summary:"));
    }
}
