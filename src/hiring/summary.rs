//! Recruiter-style summary of ranked candidates.

use crate::hiring::types::RankedCandidate;
use crate::openai::{ChatClient, ChatRequest, OpenAiError};
use serde_json::json;

/// Resume characters included per candidate.
pub const RESUME_EXCERPT_CHARS: usize = 1000;
const MAX_TOKENS: u32 = 1000;

fn recruiter_prompt(candidates: &[RankedCandidate]) -> String {
    let listing: Vec<_> = candidates
        .iter()
        .map(|candidate| {
            json!({
                "id": candidate.id,
                "resume": excerpt(&candidate.text, RESUME_EXCERPT_CHARS),
            })
        })
        .collect();

    format!(
        "You are a skilled talent recruiter. You have access to the resumes of the top candidates. \
         Provide a brief summary of each candidate's resume to help your client make an informed \
         decision. Don't skip any candidates; talk about all the candidates you are given.\n\n\
         Candidates:\n{}",
        serde_json::Value::Array(listing)
    )
}

/// First `limit` characters of `text`, respecting char boundaries.
fn excerpt(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Ask the chat service to summarize `candidates` for `query`.
pub async fn summarize_candidates(
    chat: &dyn ChatClient,
    model: &str,
    query: &str,
    candidates: &[RankedCandidate],
) -> Result<String, OpenAiError> {
    let request = ChatRequest::new(model, format!("Who are the top candidates for {query}?"))
        .with_system(recruiter_prompt(candidates))
        .with_max_tokens(MAX_TOKENS);
    chat.complete(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hiring::testing::FakeChat;
    use std::collections::BTreeMap;

    fn candidate(id: &str, text: String) -> RankedCandidate {
        RankedCandidate {
            id: id.into(),
            text,
            score: 1.0,
            category_scores: BTreeMap::new(),
        }
    }

    #[test]
    fn excerpt_counts_characters() {
        assert_eq!(excerpt("héllo", 2), "hé");
        assert_eq!(excerpt("short", 100), "short");
    }

    #[tokio::test]
    async fn resumes_are_capped_in_the_prompt() {
        let chat = FakeChat::replying("Candidate 1 is a strong fit.");
        let long_resume = "x".repeat(RESUME_EXCERPT_CHARS + 500);

        let summary = summarize_candidates(
            &chat,
            "gpt-4o",
            "data engineer",
            &[candidate("1", long_resume)],
        )
        .await
        .expect("summary");

        assert_eq!(summary, "Candidate 1 is a strong fit.");
        let request = chat.last_request().expect("request");
        assert_eq!(request.prompt, "Who are the top candidates for data engineer?");
        assert_eq!(request.max_tokens, Some(MAX_TOKENS));
        let system = request.system.expect("system prompt");
        assert!(system.contains(&"x".repeat(RESUME_EXCERPT_CHARS)));
        assert!(!system.contains(&"x".repeat(RESUME_EXCERPT_CHARS + 1)));
    }
}
