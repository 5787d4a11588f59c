//! Rule-based parser
//!
//! A small English language model assigns universal POS tags from a
//! closed-class lexicon plus word-shape rules, then builds a flat
//! dependency tree: the first verb (or auxiliary) of a sentence is the
//! root and every other token attaches to it.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use relex_core::{Dataset, Dependency, Result};

use crate::tokenizer::GenericTokenizer;
use crate::{Parser, Tokenizer};

// ============================================================================
// Language model
// ============================================================================

static MODEL_TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d+(?:[.,]\d+)*|\w+(?:[-']\w+)*|[^\w\s]").expect("valid token pattern")
});

static NUMBER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(?:[.,]\d+)*%?$").expect("valid number pattern"));

static ENGLISH_LEXICON: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut lexicon = HashMap::new();
    let classes: [(&str, &[&str]); 7] = [
        (
            "DET",
            &[
                "a", "an", "the", "this", "that", "these", "those", "each", "every", "some",
                "any", "no", "all", "both",
            ],
        ),
        (
            "ADP",
            &[
                "of", "in", "on", "at", "by", "for", "with", "from", "to", "into", "onto",
                "through", "between", "among", "during", "via", "within", "without", "upon",
                "after", "before", "under", "over", "against",
            ],
        ),
        ("CCONJ", &["and", "or", "but", "nor", "yet"]),
        (
            "SCONJ",
            &["that", "whether", "while", "because", "although", "if", "when", "whereas"],
        ),
        (
            "PRON",
            &[
                "i", "you", "he", "she", "it", "we", "they", "them", "its", "their", "which",
                "who", "whom", "whose",
            ],
        ),
        (
            "AUX",
            &[
                "is", "are", "was", "were", "be", "been", "being", "has", "have", "had", "do",
                "does", "did", "can", "could", "may", "might", "will", "would", "shall",
                "should", "must",
            ],
        ),
        ("PART", &["not", "n't"]),
    ];

    for (tag, words) in classes {
        for word in words {
            // first class wins ("that" stays a determiner)
            lexicon.entry(*word).or_insert(tag);
        }
    }
    lexicon
});

const VERB_SUFFIXES: [&str; 5] = ["ed", "ing", "izes", "ates", "ifies"];

/// Tokenization and tagging rules for one language
#[derive(Debug, Clone)]
pub struct LanguageModel {
    lexicon: &'static HashMap<&'static str, &'static str>,
}

impl LanguageModel {
    pub fn english() -> Self {
        Self {
            lexicon: &ENGLISH_LEXICON,
        }
    }

    /// The model's own tokenization; keeps decimal numbers together
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        MODEL_TOKEN_PATTERN
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Universal POS tag of `word` at position `index` of its sentence
    pub fn tag(&self, word: &str, index: usize) -> &'static str {
        let lower = word.to_lowercase();
        if let Some(tag) = self.lexicon.get(lower.as_str()) {
            return *tag;
        }
        if word.chars().all(|c| !c.is_alphanumeric()) {
            return "PUNCT";
        }
        if NUMBER_PATTERN.is_match(word) {
            return "NUM";
        }

        let has_digit = word.chars().any(|c| c.is_ascii_digit());
        let uppercase = word.chars().filter(|c| c.is_uppercase()).count();
        let capitalized = word.chars().next().map(char::is_uppercase).unwrap_or(false);
        if has_digit || uppercase > 1 || (capitalized && index > 0) {
            return "PROPN";
        }

        let long_enough = lower.chars().count() > 4;
        if long_enough && VERB_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
            return "VERB";
        }
        "NOUN"
    }
}

impl Default for LanguageModel {
    fn default() -> Self {
        Self::english()
    }
}

// ============================================================================
// Parser
// ============================================================================

fn dependency_label(tag: &str, before_root: bool) -> &'static str {
    match tag {
        "DET" => "det",
        "ADP" => "case",
        "CCONJ" => "cc",
        "SCONJ" => "mark",
        "AUX" => "aux",
        "PART" => "advmod",
        "NUM" => "nummod",
        "PUNCT" => "punct",
        "NOUN" | "PROPN" | "PRON" if before_root => "nsubj",
        "NOUN" | "PROPN" | "PRON" => "obj",
        _ => "dep",
    }
}

/// Root of a tagged sentence: first verb, else first auxiliary, else the
/// last non-punctuation token
fn find_root(tags: &[&str]) -> usize {
    tags.iter()
        .position(|t| *t == "VERB")
        .or_else(|| tags.iter().position(|t| *t == "AUX"))
        .or_else(|| tags.iter().rposition(|t| *t != "PUNCT"))
        .unwrap_or(0)
}

/// Default parser of the pipeline
#[derive(Debug, Clone)]
pub struct RuleBasedParser {
    model: Arc<LanguageModel>,
}

impl RuleBasedParser {
    pub fn new(model: LanguageModel) -> Self {
        Self {
            model: Arc::new(model),
        }
    }

    pub fn model(&self) -> &LanguageModel {
        &self.model
    }
}

impl Default for RuleBasedParser {
    fn default() -> Self {
        Self::new(LanguageModel::english())
    }
}

impl Parser for RuleBasedParser {
    fn parse(&self, dataset: &mut Dataset) -> Result<()> {
        for part in dataset.parts_mut() {
            for sentence in part.sentences.iter_mut() {
                if sentence.is_empty() {
                    continue;
                }

                let tags: Vec<&'static str> = sentence
                    .iter()
                    .enumerate()
                    .map(|(i, token)| self.model.tag(&token.word, i))
                    .collect();
                let root = find_root(&tags);

                for (i, token) in sentence.iter_mut().enumerate() {
                    token.pos = Some(tags[i].to_string());
                    token.dependency = Some(if i == root {
                        Dependency {
                            head: None,
                            label: "ROOT".to_string(),
                        }
                    } else {
                        Dependency {
                            head: Some(root),
                            label: dependency_label(tags[i], i < root).to_string(),
                        }
                    });
                }
            }
        }
        Ok(())
    }

    fn bundled_tokenizer(&self) -> Option<Box<dyn Tokenizer>> {
        let model = Arc::clone(&self.model);
        Some(Box::new(GenericTokenizer::new(move |text: &str| {
            model.tokenize(text)
        })))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use relex_core::{Document, Part};

    fn parsed(text: &str) -> Dataset {
        let mut part = Part::new("p0", text);
        part.sentence_spans = vec![(0, text.len())];
        let mut dataset = Dataset::new().with_document(Document::new("d0").with_part(part));

        let parser = RuleBasedParser::default();
        parser
            .bundled_tokenizer()
            .unwrap()
            .tokenize(&mut dataset)
            .unwrap();
        parser.parse(&mut dataset).unwrap();
        dataset
    }

    #[test]
    fn test_model_tokenize_keeps_decimals() {
        let model = LanguageModel::english();
        assert_eq!(
            model.tokenize("Levels rose 2.5-fold."),
            vec!["Levels", "rose", "2.5", "-", "fold", "."]
        );
    }

    #[test]
    fn test_tags() {
        let model = LanguageModel::english();
        assert_eq!(model.tag("The", 0), "DET");
        assert_eq!(model.tag("BRCA1", 0), "PROPN");
        assert_eq!(model.tag("Smith", 3), "PROPN");
        assert_eq!(model.tag("Cells", 0), "NOUN");
        assert_eq!(model.tag("activates", 2), "VERB");
        assert_eq!(model.tag("is", 1), "AUX");
        assert_eq!(model.tag("3,000", 4), "NUM");
        assert_eq!(model.tag(".", 5), "PUNCT");
    }

    #[test]
    fn test_parse_attaches_to_verb_root() {
        let dataset = parsed("The BRCA1 protein activates RAD51.");
        let tokens: Vec<_> = dataset.tokens().collect();

        let root = tokens
            .iter()
            .position(|t| t.dependency.as_ref().unwrap().head.is_none())
            .unwrap();
        assert_eq!(tokens[root].word, "activates");

        let protein = tokens.iter().find(|t| t.word == "protein").unwrap();
        assert_eq!(
            protein.dependency,
            Some(Dependency {
                head: Some(root),
                label: "nsubj".to_string()
            })
        );
        let rad51 = tokens.iter().find(|t| t.word == "RAD51").unwrap();
        assert_eq!(rad51.dependency.as_ref().unwrap().label, "obj");
        assert!(tokens.iter().all(|t| t.pos.is_some()));
    }

    #[test]
    fn test_root_fallbacks() {
        assert_eq!(find_root(&["DET", "NOUN", "AUX", "VERB"]), 3);
        assert_eq!(find_root(&["NOUN", "AUX", "NOUN"]), 1);
        assert_eq!(find_root(&["NOUN", "NOUN", "PUNCT"]), 1);
        assert_eq!(find_root(&["PUNCT"]), 0);
    }

    #[test]
    fn test_parse_without_tokens_is_noop() {
        let part = Part::new("p0", "Not tokenized.");
        let mut dataset = Dataset::new().with_document(Document::new("d0").with_part(part));
        RuleBasedParser::default().parse(&mut dataset).unwrap();
        assert_eq!(dataset.tokens().count(), 0);
    }
}
