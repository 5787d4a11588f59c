//! Candidate edge generation

use relex_core::{Dataset, Edge, Result};

use crate::EdgeGenerator;

/// One edge per pair of `class1`/`class2` mentions sharing a sentence
///
/// When both classes are the same, each unordered pair yields a single
/// edge (first mention in annotation order comes first).
#[derive(Debug, Clone)]
pub struct SimpleEdgeGenerator {
    class1: String,
    class2: String,
    relation_type: String,
}

impl SimpleEdgeGenerator {
    pub fn new(
        class1: impl Into<String>,
        class2: impl Into<String>,
        relation_type: impl Into<String>,
    ) -> Self {
        Self {
            class1: class1.into(),
            class2: class2.into(),
            relation_type: relation_type.into(),
        }
    }
}

impl EdgeGenerator for SimpleEdgeGenerator {
    fn generate(&self, dataset: &mut Dataset) -> Result<()> {
        let same_class = self.class1 == self.class2;

        for part in dataset.parts_mut() {
            let mut edges = Vec::new();

            for sentence_id in 0..part.sentence_spans.len() {
                let firsts = part.entities_in_sentence(sentence_id, &self.class1);
                let seconds = part.entities_in_sentence(sentence_id, &self.class2);

                for (i, e1) in firsts.iter().enumerate() {
                    for (j, e2) in seconds.iter().enumerate() {
                        if e1 == e2 || (same_class && j <= i) {
                            continue;
                        }
                        edges.push(Edge::new(
                            (*e1).clone(),
                            (*e2).clone(),
                            self.relation_type.clone(),
                            sentence_id,
                        ));
                    }
                }
            }

            part.edges = edges;
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
