use std::collections::HashSet;

use crate::matching::TextProcessingContext;

/// The operator's resume, tokenized once per run.
#[derive(Debug, Clone)]
pub struct ResumeProfile {
    raw_text: String,
    normalized_tokens: HashSet<String>,
}

impl ResumeProfile {
    pub fn new(raw_text: impl Into<String>, ctx: &TextProcessingContext) -> Self {
        let raw_text = raw_text.into();
        let normalized_tokens = ctx.terms(&raw_text);
        Self {
            raw_text,
            normalized_tokens,
        }
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn tokens(&self) -> &HashSet<String> {
        &self.normalized_tokens
    }

    pub fn is_empty(&self) -> bool {
        self.normalized_tokens.is_empty()
    }
}
