//! Prompt templates for the answer graph.

use crate::domain::models::{VERDICT_FAIL, VERDICT_PASS};

const ANSWER_PREAMBLE: &str = "Based on the following context, answer the question.";
const SUMMARY_PREAMBLE: &str =
    "Summarize the following context for the query, keeping only facts relevant to it.";
const VALIDATION_PREAMBLE: &str =
    "Judge whether the answer below correctly and relevantly addresses the question.";

/// Prompt used to draft an answer from retrieved context.
pub fn answer_prompt(context: &str, question: &str) -> String {
    format!("{ANSWER_PREAMBLE}\n\nContext: {context}\n\nQuestion: {question}\n\nAnswer:")
}

/// Prompt used to condense retrieved passages before answering.
pub fn summary_prompt(context: &str, query: &str) -> String {
    format!("{SUMMARY_PREAMBLE}\n\nQuery: {query}\n\nContext: {context}\n\nSummary:")
}

/// Prompt asking the judge for a single-token verdict.
pub fn validation_prompt(question: &str, answer: &str) -> String {
    format!(
        "{VALIDATION_PREAMBLE}\nRespond with exactly one word: {VERDICT_PASS} or {VERDICT_FAIL}.\n\n\
         Question: {question}\n\nAnswer: {answer}\n\nVerdict:"
    )
}

/// Which template produced a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Answer,
    Summary,
    Validation,
    Other,
}

impl PromptKind {
    pub fn classify(prompt: &str) -> Self {
        if prompt.starts_with(ANSWER_PREAMBLE) {
            Self::Answer
        } else if prompt.starts_with(SUMMARY_PREAMBLE) {
            Self::Summary
        } else if prompt.starts_with(VALIDATION_PREAMBLE) {
            Self::Validation
        } else {
            Self::Other
        }
    }

    /// Context block embedded in an answer or summary prompt.
    pub fn context_of(prompt: &str) -> Option<&str> {
        let terminator = match Self::classify(prompt) {
            Self::Answer => "\n\nQuestion: ",
            Self::Summary => "\n\nSummary:",
            Self::Validation | Self::Other => return None,
        };
        let start = prompt.find("\n\nContext: ")? + "\n\nContext: ".len();
        let end = prompt.rfind(terminator)?;
        prompt.get(start..end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_prompt_layout() {
        let prompt = answer_prompt("ctx", "q?");
        assert_eq!(
            prompt,
            "Based on the following context, answer the question.\n\nContext: ctx\n\nQuestion: q?\n\nAnswer:"
        );
        assert_eq!(PromptKind::classify(&prompt), PromptKind::Answer);
        assert_eq!(PromptKind::context_of(&prompt), Some("ctx"));
    }

    #[test]
    fn test_validation_prompt_names_both_tokens() {
        let prompt = validation_prompt("q?", "a.");
        assert!(prompt.contains("exactly one word: VALID or INVALID"));
        assert_eq!(PromptKind::classify(&prompt), PromptKind::Validation);
        assert_eq!(PromptKind::context_of(&prompt), None);
    }

    #[test]
    fn test_summary_context_extraction() {
        let prompt = summary_prompt("line one\n\nline two", "sql");
        assert_eq!(PromptKind::classify(&prompt), PromptKind::Summary);
        assert_eq!(PromptKind::context_of(&prompt), Some("line one\n\nline two"));
    }

    #[test]
    fn test_unknown_prompt() {
        assert_eq!(PromptKind::classify("hello"), PromptKind::Other);
    }
}
