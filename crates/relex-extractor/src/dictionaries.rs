//! Dictionary membership features
//!
//! A dictionary is a named word set read from a text file. For every token
//! of a dataset, each dictionary writes a boolean feature
//! `dics.<name>` telling whether the (normalized) token is in the set.

use std::borrow::Cow;
use std::collections::HashSet;
use std::io::BufRead;

use relex_core::config::{DictionaryConfig, StorageConfig, DEFAULT_ACCEPTED_EXTENSIONS};
use relex_core::{ConfigError, Dataset, FeatureDictionary, RelexError, Result, StopWords};

use crate::storage::{file_stem, DictionaryStorage, StorageBackend};
use crate::FeatureGenerator;

/// Splits one dictionary line into candidate words
pub type StringTokenizer = dyn Fn(&str) -> Vec<String>;

/// Token feature generator backed by one dictionary
#[derive(Debug, Clone)]
pub struct DictionaryFeatureGenerator {
    name: String,
    words_set: HashSet<String>,
    key: String,
    case_sensitive: bool,
}

impl DictionaryFeatureGenerator {
    /// `words_set` must already be normalized the way `case_sensitive` says
    pub fn new(name: impl Into<String>, words_set: HashSet<String>, case_sensitive: bool) -> Self {
        let name = name.into();
        let key = format!("dics.{name}");
        Self {
            name,
            words_set,
            key,
            case_sensitive,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Feature key written on every token
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn words_set(&self) -> &HashSet<String> {
        &self.words_set
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words_set
            .contains(normalize(word, self.case_sensitive).as_ref())
    }

    /// Set `dics.<name>` on every token of the dataset
    pub fn generate(&self, dataset: &mut Dataset) {
        for token in dataset.tokens_mut() {
            let present = self.contains(&token.word);
            token.features.insert(self.key.clone(), present.into());
        }
    }
}

impl FeatureGenerator for DictionaryFeatureGenerator {
    fn generate(
        &self,
        dataset: &mut Dataset,
        _feature_set: &mut FeatureDictionary,
        _train: bool,
    ) -> Result<()> {
        DictionaryFeatureGenerator::generate(self, dataset);
        Ok(())
    }

    fn name(&self) -> &str {
        &self.key
    }
}

fn normalize(word: &str, case_sensitive: bool) -> Cow<'_, str> {
    if case_sensitive {
        Cow::Borrowed(word)
    } else {
        Cow::Owned(word.to_lowercase())
    }
}

/// Words of one character or less are dropped
pub fn default_stop_rules(token: &str) -> bool {
    token.chars().count() > 1
}

/// Build a word set from every line of `reader`
///
/// The reader is borrowed: closing it stays with the caller.
pub fn construct_words_set<R: BufRead + ?Sized>(
    reader: &mut R,
    string_tokenizer: &StringTokenizer,
    case_sensitive: bool,
    stop_words: &HashSet<String>,
) -> std::io::Result<HashSet<String>> {
    let mut words = HashSet::new();

    for line in reader.lines() {
        let line = line?;
        words.extend(
            string_tokenizer(&line)
                .into_iter()
                .map(|w| normalize(&w, case_sensitive).into_owned())
                .filter(|w| !stop_words.contains(w) && default_stop_rules(w)),
        );
    }

    Ok(words)
}

/// Where and how to load a folder of dictionaries
#[derive(Debug, Clone)]
pub struct DictionaryLoadOptions {
    pub folder: String,
    pub case_sensitive: bool,
    /// WebHDFS endpoint; `HDFS_URL` is used when unset
    pub hdfs_url: Option<String>,
    /// WebHDFS user; `HDFS_USER` is used when unset
    pub hdfs_user: Option<String>,
    pub stop_words: Option<StopWords>,
    pub accepted_extensions: Vec<String>,
    pub timeout_secs: u64,
}

impl DictionaryLoadOptions {
    pub fn new(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            case_sensitive: false,
            hdfs_url: None,
            hdfs_user: None,
            stop_words: None,
            accepted_extensions: DEFAULT_ACCEPTED_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            timeout_secs: StorageConfig::default().timeout_secs,
        }
    }

    pub fn from_config(dictionaries: &DictionaryConfig, storage: &StorageConfig) -> Result<Self> {
        let folder = dictionaries.folder.as_ref().ok_or_else(|| {
            RelexError::from(ConfigError::MissingRequired("dictionaries.folder".to_string()))
        })?;

        Ok(Self {
            folder: folder.to_string_lossy().into_owned(),
            case_sensitive: dictionaries.case_sensitive,
            hdfs_url: storage.hdfs_url.clone(),
            hdfs_user: storage.hdfs_user.clone(),
            stop_words: dictionaries.stop_words.clone(),
            accepted_extensions: dictionaries.accepted_extensions.clone(),
            timeout_secs: storage.timeout_secs,
        })
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn stop_words(mut self, stop_words: impl Into<StopWords>) -> Self {
        self.stop_words = Some(stop_words.into());
        self
    }

    pub fn hdfs(mut self, url: impl Into<String>, user: Option<String>) -> Self {
        self.hdfs_url = Some(url.into());
        self.hdfs_user = user;
        self
    }
}

/// Load one generator per dictionary file found in `options.folder`
pub fn construct_all_from_folder(
    string_tokenizer: &StringTokenizer,
    options: &DictionaryLoadOptions,
) -> Result<Vec<DictionaryFeatureGenerator>> {
    let storage = StorageBackend::connect(
        options.hdfs_url.as_deref(),
        options.hdfs_user.as_deref(),
        options.timeout_secs,
    )?;

    construct_all_with_options(&storage, string_tokenizer, options)
}

/// [`construct_all_from_folder`] with the storage already chosen; the
/// WebHDFS settings of `options` are ignored
pub fn construct_all_with_options<S: DictionaryStorage + ?Sized>(
    storage: &S,
    string_tokenizer: &StringTokenizer,
    options: &DictionaryLoadOptions,
) -> Result<Vec<DictionaryFeatureGenerator>> {
    let stop_words = options
        .stop_words
        .clone()
        .map(StopWords::into_set)
        .unwrap_or_default();

    construct_all_from_storage(
        storage,
        string_tokenizer,
        &options.folder,
        options.case_sensitive,
        &stop_words,
        &options.accepted_extensions,
    )
}

/// Load one generator per accepted file of `folder` in `storage`
pub fn construct_all_from_storage<S: DictionaryStorage + ?Sized>(
    storage: &S,
    string_tokenizer: &StringTokenizer,
    folder: &str,
    case_sensitive: bool,
    stop_words: &HashSet<String>,
    accepted_extensions: &[String],
) -> Result<Vec<DictionaryFeatureGenerator>> {
    let accept = |filename: &str| {
        accepted_extensions
            .iter()
            .any(|ext| filename.ends_with(ext.as_str()))
    };

    let paths = storage.list(folder, &accept)?;
    let mut generators = Vec::with_capacity(paths.len());

    for path in paths {
        let name = file_stem(&path);
        let words_set = {
            let mut reader = storage.open(&path)?;
            construct_words_set(&mut reader, string_tokenizer, case_sensitive, stop_words)
                .map_err(|e| RelexError::io(&path, e))?
        };

        tracing::debug!(
            "Loaded dictionary {} with {} words from {}",
            name,
            words_set.len(),
            path
        );
        generators.push(DictionaryFeatureGenerator::new(
            name,
            words_set,
            case_sensitive,
        ));
    }

    tracing::info!(
        "Loaded {} dictionaries from {} ({})",
        generators.len(),
        folder,
        storage.name()
    );
    Ok(generators)
}

// ============================================================================
// Tests
// ============================================================================
