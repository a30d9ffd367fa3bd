//! Token estimation utilities.
//!
//! Uses a character-based heuristic with a configurable chars-per-token
//! ratio (default 4). This approximation is accurate within ~10% for BPE
//! tokenizers on English text, which is plenty for a soft history budget.

use mentora_core::message::SessionMessage;

/// Estimate the token count for a string. Rounds up.
pub fn estimate_tokens(text: &str, chars_per_token: usize) -> usize {
    if text.is_empty() {
        return 0;
    }
    text.len().div_ceil(chars_per_token)
}

/// Estimate tokens for one history line including the role label and
/// separator overhead.
pub fn estimate_message_tokens(message: &SessionMessage, chars_per_token: usize) -> usize {
    // "<Role>: " prefix plus trailing newline
    let line_len = message.role.label().len() + 2 + message.content.len() + 1;
    line_len.div_ceil(chars_per_token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentora_core::session::SessionId;

    #[test]
    fn empty_string_is_zero() {
        assert_eq!(estimate_tokens("", 4), 0);
    }

    #[test]
    fn four_chars_is_one_token() {
        assert_eq!(estimate_tokens("test", 4), 1);
    }

    #[test]
    fn five_chars_rounds_up() {
        assert_eq!(estimate_tokens("hello", 4), 2);
    }

    #[test]
    fn ratio_is_configurable() {
        let text = "a".repeat(100);
        assert_eq!(estimate_tokens(&text, 4), 25);
        assert_eq!(estimate_tokens(&text, 5), 20);
    }

    #[test]
    fn message_includes_label_overhead() {
        let msg = SessionMessage::learner(SessionId::from("s"), "test");
        // "Learner: test\n" = 14 chars → 4 tokens at ratio 4
        assert_eq!(estimate_message_tokens(&msg, 4), 4);
    }
}
