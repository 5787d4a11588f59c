//! Dataset model
//!
//! A dataset is a list of documents. Each document is split into parts
//! (title, abstract, paragraphs, ...), and all linguistic annotation lives
//! on the part: sentence spans, tokens, gold entities and relations, and
//! the candidate edges produced for relation extraction.
//!
//! All offsets are byte offsets into `Part::text`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::FeatureMap;

/// Tokens of one sentence
pub type Sentence = Vec<Token>;

/// Collection of documents processed together
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub documents: Vec<Document>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, document: Document) -> Self {
        self.documents.push(document);
        self
    }

    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.documents.iter().flat_map(|d| d.parts.iter())
    }

    pub fn parts_mut(&mut self) -> impl Iterator<Item = &mut Part> {
        self.documents.iter_mut().flat_map(|d| d.parts.iter_mut())
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.parts().flat_map(|p| p.sentences.iter()).flatten()
    }

    pub fn tokens_mut(&mut self) -> impl Iterator<Item = &mut Token> {
        self.parts_mut()
            .flat_map(|p| p.sentences.iter_mut())
            .flatten()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.parts().flat_map(|p| p.edges.iter())
    }

    pub fn edges_mut(&mut self) -> impl Iterator<Item = &mut Edge> {
        self.parts_mut().flat_map(|p| p.edges.iter_mut())
    }

    /// Mark every edge as positive or negative against the gold relations
    /// of its part
    pub fn label_edges(&mut self) {
        for part in self.parts_mut() {
            let Part {
                relations, edges, ..
            } = part;

            for edge in edges.iter_mut() {
                let positive = relations.iter().any(|r| r.matches(edge));
                edge.target = Some(if positive {
                    EdgeTarget::Positive
                } else {
                    EdgeTarget::Negative
                });
            }
        }
    }
}

/// A document made of one or more text parts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Generated when the input has none
    #[serde(default = "generated_id")]
    pub id: String,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Document {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parts: Vec::new(),
        }
    }

    pub fn with_part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }
}

fn generated_id() -> String {
    Uuid::new_v4().to_string()
}

/// A contiguous piece of document text and its annotations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub id: String,
    pub text: String,

    /// Byte spans of the sentences in `text`
    #[serde(default)]
    pub sentence_spans: Vec<(usize, usize)>,

    /// Tokens per sentence, parallel to `sentence_spans`
    #[serde(default)]
    pub sentences: Vec<Sentence>,

    /// Entity mentions
    #[serde(default)]
    pub annotations: Vec<Entity>,

    /// Gold relations between entity mentions
    #[serde(default)]
    pub relations: Vec<Relation>,

    /// Candidate relations
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Part {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            sentence_spans: Vec::new(),
            sentences: Vec::new(),
            annotations: Vec::new(),
            relations: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn with_annotation(mut self, entity: Entity) -> Self {
        self.annotations.push(entity);
        self
    }

    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn sentence_text(&self, sentence_id: usize) -> Option<&str> {
        let (start, end) = *self.sentence_spans.get(sentence_id)?;
        self.text.get(start..end)
    }

    /// Index of the sentence whose span contains `offset`
    pub fn sentence_index_of(&self, offset: usize) -> Option<usize> {
        self.sentence_spans
            .iter()
            .position(|&(start, end)| start <= offset && offset < end)
    }

    /// Entities of class `class_id` that start inside sentence `sentence_id`
    pub fn entities_in_sentence(&self, sentence_id: usize, class_id: &str) -> Vec<&Entity> {
        self.annotations
            .iter()
            .filter(|e| e.class_id == class_id)
            .filter(|e| self.sentence_index_of(e.offset) == Some(sentence_id))
            .collect()
    }
}

/// A token with its features and (once parsed) syntactic information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub word: String,
    pub start: usize,
    pub end: usize,
    #[serde(default)]
    pub features: FeatureMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency: Option<Dependency>,
}

impl Token {
    pub fn new(word: impl Into<String>, start: usize) -> Self {
        let word = word.into();
        let end = start + word.len();
        Self {
            word,
            start,
            end,
            features: FeatureMap::new(),
            pos: None,
            dependency: None,
        }
    }
}

/// Dependency arc pointing from a token to its head
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Index of the head token within the sentence; `None` for the root
    pub head: Option<usize>,
    pub label: String,
}

/// An entity mention
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    pub class_id: String,
    pub offset: usize,
    pub text: String,
}

impl Entity {
    pub fn new(class_id: impl Into<String>, offset: usize, text: impl Into<String>) -> Self {
        Self {
            class_id: class_id.into(),
            offset,
            text: text.into(),
        }
    }

    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }
}

/// A gold relation between two entity mentions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub class_id: String,
    pub entity1: Entity,
    pub entity2: Entity,
}

impl Relation {
    pub fn new(class_id: impl Into<String>, entity1: Entity, entity2: Entity) -> Self {
        Self {
            class_id: class_id.into(),
            entity1,
            entity2,
        }
    }

    /// Relations are undirected: entity order does not matter
    pub fn matches(&self, edge: &Edge) -> bool {
        self.class_id == edge.relation_type
            && ((self.entity1 == edge.entity1 && self.entity2 == edge.entity2)
                || (self.entity1 == edge.entity2 && self.entity2 == edge.entity1))
    }
}

/// Gold label of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeTarget {
    Positive,
    Negative,
}

/// A candidate relation between two entity mentions of one sentence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub entity1: Entity,
    pub entity2: Entity,
    pub relation_type: String,
    pub sentence_id: usize,
    #[serde(default)]
    pub target: Option<EdgeTarget>,
    /// Feature id -> value, ids taken from the feature dictionary
    #[serde(default)]
    pub features: BTreeMap<usize, f64>,
}

impl Edge {
    pub fn new(
        entity1: Entity,
        entity2: Entity,
        relation_type: impl Into<String>,
        sentence_id: usize,
    ) -> Self {
        Self {
            entity1,
            entity2,
            relation_type: relation_type.into(),
            sentence_id,
            target: None,
            features: BTreeMap::new(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
