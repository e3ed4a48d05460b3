//! Lexical resume/description matching.
//!
//! Both texts are lowercased, split on word boundaries, stripped of English
//! stopwords and stemmed. The score is the share of the description's
//! distinct terms that also occur in the resume:
//!
//! `100 * |resume ∩ description| / |description|`
//!
//! The measure is asymmetric: it is how much of the posting the resume
//! covers.

use std::collections::HashSet;

use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};

use crate::error::AppError;
use crate::models::ResumeProfile;

/// English stopword list (NLTK corpus).
pub const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

/// Stopword set, stemmer and tokenizer, built once at startup and passed by
/// reference to everything that tokenizes text.
pub struct TextProcessingContext {
    stopwords: HashSet<String>,
    stemmer: Stemmer,
    word: Regex,
}

impl std::fmt::Debug for TextProcessingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextProcessingContext")
            .field("stopwords", &self.stopwords.len())
            .finish_non_exhaustive()
    }
}

impl TextProcessingContext {
    pub fn new<I, S>(stopwords: I, algorithm: Algorithm) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let word = Regex::new(r"\b\w+\b")
            .map_err(|e| AppError::Config(format!("word tokenizer: {e}")))?;
        Ok(Self {
            stopwords: stopwords
                .into_iter()
                .map(|s| s.into().to_lowercase())
                .collect(),
            stemmer: Stemmer::create(algorithm),
            word,
        })
    }

    pub fn english() -> Result<Self, AppError> {
        Self::new(ENGLISH_STOPWORDS.iter().copied(), Algorithm::English)
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    /// Distinct stemmed, non-stopword terms of `text`.
    pub fn terms(&self, text: &str) -> HashSet<String> {
        let lowered = text.to_lowercase();
        self.word
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|token| !self.is_stopword(token))
            .map(|token| self.stemmer.stem(token).into_owned())
            .collect()
    }
}

/// Percentage of the description's terms covered by the resume, in `[0, 100]`.
/// An empty (or all-stopword) description scores 0.
pub fn score(ctx: &TextProcessingContext, resume: &ResumeProfile, description: &str) -> f64 {
    let description_terms = ctx.terms(description);
    if description_terms.is_empty() {
        return 0.0;
    }
    let common = description_terms
        .iter()
        .filter(|term| resume.tokens().contains(*term))
        .count();
    100.0 * common as f64 / description_terms.len() as f64
}
