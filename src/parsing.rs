//! Cleanup of raw LLM replies before they are stored as stage output.
//!
//! Models wrap useful text in reasoning blocks, whole-reply code fences and
//! chatty preambles. Downstream stages and the final document only want the
//! content itself.

use regex::Regex;
use std::sync::LazyLock;

/// Extract `<think>...</think>` blocks from a response (DeepSeek R1 style).
///
/// Returns `(thinking_content, cleaned_text)` where `cleaned_text` has the
/// thinking block removed and is trimmed.
pub fn extract_thinking(text: &str) -> (Option<String>, String) {
    let think_start = "<think>";
    let think_end = "</think>";

    if let Some(start_idx) = text.find(think_start) {
        if let Some(end_idx) = text.find(think_end) {
            if end_idx > start_idx {
                let thinking = text[start_idx + think_start.len()..end_idx]
                    .trim()
                    .to_string();
                let mut cleaned = String::new();
                cleaned.push_str(&text[..start_idx]);
                cleaned.push_str(&text[end_idx + think_end.len()..]);
                let cleaned = cleaned.trim().to_string();
                let thinking = if thinking.is_empty() {
                    None
                } else {
                    Some(thinking)
                };
                return (thinking, cleaned);
            }
        }
    }

    (None, text.to_string())
}

/// Remove a fence that wraps the entire reply (` ```markdown ... ``` `).
///
/// Fences inside the body are left alone; only a reply that *is* a single
/// fenced block gets unwrapped.
pub fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        if let Some(body_end) = rest.rfind("```") {
            let inner = &rest[..body_end];
            // drop the info string (e.g. "markdown") on the opening line
            let inner = match inner.find('\n') {
                Some(nl) if !inner[..nl].contains(' ') => &inner[nl + 1..],
                _ => inner,
            };
            if !inner.contains("```") && rest[body_end + 3..].trim().is_empty() {
                return inner.trim().to_string();
            }
        }
    }
    trimmed.to_string()
}

static PREAMBLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(sure|certainly|of course|okay|absolutely)[!,.]?[^\n]*\n+|^here(?:'s| is| are)[^\n]*:\s*\n+",
    )
    .unwrap()
});

/// Full cleanup applied to every stage reply.
///
/// Strips reasoning blocks, a single chatty opening line
/// ("Sure! Here are the topics:") and a whole-reply code fence.
pub fn clean_response(text: &str) -> String {
    let (_, without_thinking) = extract_thinking(text);
    let unfenced = strip_code_fence(&without_thinking);
    let stripped = PREAMBLE_PATTERN.replace(&unfenced, "");
    strip_code_fence(&stripped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_thinking_present() {
        let text = "Before <think>my reasoning here</think> after";
        let (thinking, cleaned) = extract_thinking(text);
        assert_eq!(thinking, Some("my reasoning here".to_string()));
        assert_eq!(cleaned, "Before  after");
    }

    #[test]
    fn test_extract_thinking_absent() {
        let text = "no thinking tags here";
        let (thinking, cleaned) = extract_thinking(text);
        assert!(thinking.is_none());
        assert_eq!(cleaned, "no thinking tags here");
    }

    #[test]
    fn test_extract_thinking_empty() {
        let (thinking, cleaned) = extract_thinking("<think>  </think>actual content");
        assert!(thinking.is_none());
        assert_eq!(cleaned, "actual content");
    }

    #[test]
    fn test_strip_code_fence_whole_reply() {
        let text = "```markdown\n## Topic 1\nBody\n```";
        assert_eq!(strip_code_fence(text), "## Topic 1\nBody");
    }

    #[test]
    fn test_strip_code_fence_keeps_inner_blocks() {
        let text = "Intro\n```rust\nfn main() {}\n```\nOutro";
        assert_eq!(strip_code_fence(text), text);
    }

    #[test]
    fn test_clean_response_drops_preamble() {
        let text = "Sure! Here are the topics you asked for.\n\n1. Rust in embedded\n2. Async IO";
        assert_eq!(clean_response(text), "1. Rust in embedded\n2. Async IO");

        let text = "Here's the plan:\n1. First";
        assert_eq!(clean_response(text), "1. First");
    }

    #[test]
    fn test_clean_response_leaves_plain_text() {
        let text = "1. Here is a topic about sure things";
        assert_eq!(clean_response(text), text);
    }

    #[test]
    fn test_clean_response_combined() {
        let text = "<think>plan it</think>\n```\nSure, done.\n# Topics\n- a\n```";
        assert_eq!(clean_response(text), "# Topics\n- a");
    }
}
