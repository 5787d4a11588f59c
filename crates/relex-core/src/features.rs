//! Feature values and the shared feature dictionary
//!
//! Token features are stored by name directly on each token. Edge features
//! are vectorized: the feature dictionary maps every feature name to a
//! stable column id, and edges store `id -> value`.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{RelexError, Result};

/// A single feature value attached to a token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FeatureValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<bool> for FeatureValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FeatureValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Feature key -> value mapping carried by every token
pub type FeatureMap = BTreeMap<String, FeatureValue>;

/// Feature name -> column id mapping shared by all edge feature generators
///
/// Ids are dense and assigned in insertion order, so a dictionary built
/// during training can be saved and reused at prediction time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureDictionary {
    ids: HashMap<String, usize>,
}

impl FeatureDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.ids.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Look up the id of a feature, assigning a fresh one when training
    ///
    /// Outside of training unknown names return `None` so that inference
    /// never grows the vocabulary.
    pub fn get_or_insert(&mut self, name: &str, train: bool) -> Option<usize> {
        if let Some(id) = self.get(name) {
            return Some(id);
        }
        if !train {
            return None;
        }

        let id = self.ids.len();
        self.ids.insert(name.to_string(), id);
        Some(id)
    }

    /// Feature names ordered by id
    pub fn names(&self) -> Vec<&str> {
        let mut entries: Vec<(&str, usize)> =
            self.ids.iter().map(|(name, id)| (name.as_str(), *id)).collect();
        entries.sort_by_key(|(_, id)| *id);
        entries.into_iter().map(|(name, _)| name).collect()
    }

    /// Load a dictionary previously written with [`FeatureDictionary::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| RelexError::io(path, e))?;
        let dictionary: Self = serde_json::from_str(&content).map_err(|e| {
            RelexError::ValidationError(format!(
                "invalid feature dictionary {}: {}",
                path.display(),
                e
            ))
        })?;

        dictionary.check_dense().map_err(|message| {
            RelexError::ValidationError(format!(
                "invalid feature dictionary {}: {}",
                path.display(),
                message
            ))
        })?;
        Ok(dictionary)
    }

    /// Ids must be exactly `0..len`, otherwise new ids would collide
    fn check_dense(&self) -> std::result::Result<(), String> {
        let mut seen = vec![false; self.ids.len()];
        for (name, &id) in &self.ids {
            match seen.get_mut(id) {
                Some(slot) if !*slot => *slot = true,
                Some(_) => return Err(format!("id {id} of `{name}` is used twice")),
                None => {
                    return Err(format!(
                        "id {id} of `{name}` is out of range for {} features",
                        self.ids.len()
                    ))
                }
            }
        }
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self).map_err(anyhow::Error::from)?;
        std::fs::write(path, content).map_err(|e| RelexError::io(path, e))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_dense_in_training() {
        let mut dict = FeatureDictionary::new();
        assert_eq!(dict.get_or_insert("1_ne_count_[Protein]", true), Some(0));
        assert_eq!(dict.get_or_insert("2_ne_count_[Location]", true), Some(1));
        assert_eq!(dict.get_or_insert("1_ne_count_[Protein]", true), Some(0));
        assert_eq!(dict.len(), 2);
        assert_eq!(
            dict.names(),
            vec!["1_ne_count_[Protein]", "2_ne_count_[Location]"]
        );
    }

    #[test]
    fn test_prediction_does_not_grow_vocabulary() {
        let mut dict = FeatureDictionary::new();
        dict.get_or_insert("known", true);

        assert_eq!(dict.get_or_insert("known", false), Some(0));
        assert_eq!(dict.get_or_insert("unseen", false), None);
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("features.json");

        let mut dict = FeatureDictionary::new();
        dict.get_or_insert("a", true);
        dict.get_or_insert("b", true);
        dict.save(&path).unwrap();

        let loaded = FeatureDictionary::load(&path).unwrap();
        assert_eq!(loaded, dict);
    }

    #[test]
    fn test_load_rejects_sparse_or_shared_ids() {
        let dir = tempfile::TempDir::new().unwrap();

        let sparse = dir.path().join("sparse.json");
        std::fs::write(&sparse, r#"{"ids":{"a":1}}"#).unwrap();
        let err = FeatureDictionary::load(&sparse).unwrap_err();
        assert!(matches!(err, RelexError::ValidationError(ref m) if m.contains("out of range")));

        let shared = dir.path().join("shared.json");
        std::fs::write(&shared, r#"{"ids":{"a":0,"b":0}}"#).unwrap();
        let err = FeatureDictionary::load(&shared).unwrap_err();
        assert!(matches!(err, RelexError::ValidationError(ref m) if m.contains("used twice")));
    }

    #[test]
    fn test_loaded_dictionary_assigns_fresh_ids() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("features.json");
        std::fs::write(&path, r#"{"ids":{"b":1,"a":0}}"#).unwrap();

        let mut dict = FeatureDictionary::load(&path).unwrap();
        assert_eq!(dict.get_or_insert("c", true), Some(2));
    }

    #[test]
    fn test_feature_value_untagged_json() {
        let mut map = FeatureMap::new();
        map.insert("dics.genes".to_string(), true.into());
        map.insert("pos".to_string(), "NOUN".into());

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"dics.genes":true,"pos":"NOUN"}"#);
    }
}
