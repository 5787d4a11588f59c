//! Tokenizers
//!
//! Both tokenizers work sentence by sentence on the spans produced by the
//! splitter and record byte offsets into the part text.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use relex_core::{Dataset, Part, Result, Sentence, Token};

use crate::Tokenizer;

static WORD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\w+(?:[-']\w+)*|[^\w\s]").expect("valid word pattern"));

/// Split on whitespace only
pub fn whitespace_tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Words (with inner hyphens/apostrophes) and single punctuation marks
pub fn word_tokenize(text: &str) -> Vec<String> {
    WORD_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

fn tokenize_parts<F>(dataset: &mut Dataset, mut tokenize_sentence: F)
where
    F: FnMut(&str, usize) -> Sentence,
{
    for part in dataset.parts_mut() {
        let Part {
            text,
            sentence_spans,
            sentences,
            ..
        } = part;

        *sentences = sentence_spans
            .iter()
            .map(|&(start, end)| match text.get(start..end) {
                Some(sentence) => tokenize_sentence(sentence, start),
                None => Vec::new(),
            })
            .collect();
    }
}

/// Generic fallback tokenizer
#[derive(Debug, Clone, Copy, Default)]
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn tokenize(&self, dataset: &mut Dataset) -> Result<()> {
        tokenize_parts(dataset, |sentence, offset| {
            WORD_PATTERN
                .find_iter(sentence)
                .map(|m| Token::new(m.as_str(), offset + m.start()))
                .collect()
        });
        Ok(())
    }
}

/// Adapts any string tokenizer function to the [`Tokenizer`] trait
///
/// The function only returns words; their offsets are recovered by
/// searching each word in the sentence, left to right.
#[derive(Clone)]
pub struct GenericTokenizer {
    tokenize_fn: Arc<dyn Fn(&str) -> Vec<String> + Send + Sync>,
}

impl GenericTokenizer {
    pub fn new<F>(tokenize_fn: F) -> Self
    where
        F: Fn(&str) -> Vec<String> + Send + Sync + 'static,
    {
        Self {
            tokenize_fn: Arc::new(tokenize_fn),
        }
    }

    fn locate(&self, sentence: &str, offset: usize) -> Sentence {
        let mut tokens = Vec::new();
        let mut cursor = 0;

        for word in (self.tokenize_fn)(sentence) {
            if word.is_empty() {
                continue;
            }
            match sentence[cursor..].find(word.as_str()) {
                Some(found) => {
                    let start = cursor + found;
                    cursor = start + word.len();
                    tokens.push(Token::new(word, offset + start));
                }
                None => {
                    tracing::debug!("Token {:?} not found in sentence, skipped", word);
                }
            }
        }

        tokens
    }
}

impl std::fmt::Debug for GenericTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericTokenizer").finish_non_exhaustive()
    }
}

impl Tokenizer for GenericTokenizer {
    fn tokenize(&self, dataset: &mut Dataset) -> Result<()> {
        tokenize_parts(dataset, |sentence, offset| self.locate(sentence, offset));
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
