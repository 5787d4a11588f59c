//! Rule-based sentence splitter
//!
//! A sentence ends at `.`, `!` or `?` (possibly followed by closing quotes
//! or brackets) when whitespace and a sentence-initial character follow,
//! unless the period closes a known abbreviation or an initial. A blank
//! line always ends a sentence.

use std::collections::HashSet;

use once_cell::sync::Lazy;

use relex_core::{Dataset, Result};

use crate::Splitter;

static ABBREVIATIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "e.g", "i.e", "al", "cf", "vs", "fig", "figs", "eq", "ref", "refs", "dr", "mr", "mrs",
        "ms", "prof", "no", "approx", "ca", "resp", "sp", "spp", "vol", "pp", "st", "jr", "inc",
        "ltd", "co",
    ]
    .into_iter()
    .collect()
});

const TERMINATORS: [char; 3] = ['.', '!', '?'];
const CLOSERS: [char; 7] = ['"', '\'', ')', ']', '\u{201d}', '\u{2019}', '.'];

fn starts_sentence(c: char) -> bool {
    c.is_uppercase() || c.is_ascii_digit() || matches!(c, '"' | '\'' | '(' | '[' | '\u{201c}')
}

#[derive(Debug, Clone, Default)]
pub struct RuleBasedSplitter {
    extra_abbreviations: HashSet<String>,
}

impl RuleBasedSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also treat `abbreviation.` as non-final (given without the period)
    pub fn with_abbreviation(mut self, abbreviation: &str) -> Self {
        self.extra_abbreviations
            .insert(abbreviation.trim_end_matches('.').to_lowercase());
        self
    }

    fn is_abbreviation(&self, preceding: &str) -> bool {
        let word = preceding
            .split_whitespace()
            .last()
            .unwrap_or("")
            .trim_start_matches(&['(', '[', '"'][..]);
        let lower = word.to_lowercase();

        let is_initial = word.chars().count() == 1 && word.chars().all(char::is_alphabetic);
        is_initial
            || ABBREVIATIONS.contains(lower.as_str())
            || self.extra_abbreviations.contains(&lower)
    }

    /// Byte spans of the sentences in `text`, trimmed of surrounding whitespace
    pub fn sentence_spans(&self, text: &str) -> Vec<(usize, usize)> {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let mut spans = Vec::new();
        let mut start = 0;
        let mut i = 0;

        while i < chars.len() {
            let (pos, c) = chars[i];

            if c == '\n' && chars.get(i + 1).map(|&(_, n)| n == '\n').unwrap_or(false) {
                push_trimmed(text, start, pos, &mut spans);
                start = pos;
                i += 2;
                continue;
            }

            if !TERMINATORS.contains(&c) {
                i += 1;
                continue;
            }

            let mut j = i + 1;
            while j < chars.len() && CLOSERS.contains(&chars[j].1) {
                j += 1;
            }

            let followed_by_space = j < chars.len() && chars[j].1.is_whitespace();
            if followed_by_space {
                let mut k = j;
                while k < chars.len() && chars[k].1.is_whitespace() {
                    k += 1;
                }

                let next_starts = k < chars.len() && starts_sentence(chars[k].1);
                let abbreviated = c == '.' && self.is_abbreviation(&text[start..pos]);
                if next_starts && !abbreviated {
                    let end = chars[j].0;
                    push_trimmed(text, start, end, &mut spans);
                    start = chars[k].0;
                    i = k;
                    continue;
                }
            }

            i = j;
        }

        push_trimmed(text, start, text.len(), &mut spans);
        spans
    }
}

fn push_trimmed(text: &str, start: usize, end: usize, spans: &mut Vec<(usize, usize)>) {
    let slice = &text[start..end];
    let leading = slice.len() - slice.trim_start().len();
    let trimmed = slice.trim();
    if !trimmed.is_empty() {
        let s = start + leading;
        spans.push((s, s + trimmed.len()));
    }
}

impl Splitter for RuleBasedSplitter {
    fn split(&self, dataset: &mut Dataset) -> Result<()> {
        for part in dataset.parts_mut() {
            part.sentence_spans = self.sentence_spans(&part.text);
            part.sentences.clear();
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
