//! Sentence-level named entity count feature

use relex_core::{Dataset, FeatureDictionary, Result};

use crate::FeatureGenerator;

/// Number of `entity_type` mentions in the sentence of each edge
#[derive(Debug, Clone)]
pub struct NamedEntityCountFeatureGenerator {
    entity_type: String,
    feature_name: String,
}

impl NamedEntityCountFeatureGenerator {
    /// `prefix` keeps the features of several instances apart
    pub fn new(entity_type: impl Into<String>, prefix: impl std::fmt::Display) -> Self {
        let entity_type = entity_type.into();
        let feature_name = format!("{prefix}_ne_count_[{entity_type}]");
        Self {
            entity_type,
            feature_name,
        }
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn feature_name(&self) -> &str {
        &self.feature_name
    }
}

impl FeatureGenerator for NamedEntityCountFeatureGenerator {
    fn generate(
        &self,
        dataset: &mut Dataset,
        feature_set: &mut FeatureDictionary,
        train: bool,
    ) -> Result<()> {
        let Some(feature_id) = feature_set.get_or_insert(&self.feature_name, train) else {
            tracing::debug!(
                "Feature {} unknown outside training, skipped",
                self.feature_name
            );
            return Ok(());
        };

        for part in dataset.parts_mut() {
            let counts: Vec<usize> = part
                .edges
                .iter()
                .map(|edge| {
                    part.entities_in_sentence(edge.sentence_id, &self.entity_type)
                        .len()
                })
                .collect();

            for (edge, count) in part.edges.iter_mut().zip(counts) {
                edge.features.insert(feature_id, count as f64);
            }
        }

        Ok(())
    }

    fn name(&self) -> &str {
        &self.feature_name
    }
}

// ============================================================================
// Tests
// ============================================================================
