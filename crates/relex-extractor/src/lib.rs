//! relex Extractor - Feature engineering for relation extraction
//!
//! Provides dictionary membership features loaded from local or WebHDFS
//! folders, and a fixed-order pipeline that prepares a dataset for
//! relation extraction: split, tokenize, generate edges, label edges,
//! parse, and generate features.
//!
//! Every pipeline step is a trait so callers can swap in their own
//! implementation; rule-based defaults are provided for each role.

use relex_core::{Dataset, FeatureDictionary, Result};

/// Splits part text into sentences
pub trait Splitter: Send + Sync {
    fn split(&self, dataset: &mut Dataset) -> Result<()>;
}

/// Splits sentences into tokens
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, dataset: &mut Dataset) -> Result<()>;
}

/// Adds syntactic information to already tokenized sentences
pub trait Parser: Send + Sync {
    fn parse(&self, dataset: &mut Dataset) -> Result<()>;

    /// Tokenizer shipped with the parser's language model, if any
    ///
    /// Using it keeps token boundaries identical to what the parser
    /// would produce itself.
    fn bundled_tokenizer(&self) -> Option<Box<dyn Tokenizer>> {
        None
    }
}

/// Creates candidate relation edges between entity mentions
pub trait EdgeGenerator: Send + Sync {
    fn generate(&self, dataset: &mut Dataset) -> Result<()>;
}

/// Annotates dataset elements with features
pub trait FeatureGenerator: Send + Sync {
    /// `train` allows the generator to add new names to `feature_set`
    fn generate(
        &self,
        dataset: &mut Dataset,
        feature_set: &mut FeatureDictionary,
        train: bool,
    ) -> Result<()>;

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

pub mod dictionaries;
pub mod edges;
pub mod entity_count;
pub mod parser;
pub mod pipeline;
pub mod splitter;
pub mod storage;
pub mod tokenizer;

pub use dictionaries::{DictionaryFeatureGenerator, DictionaryLoadOptions};
pub use edges::SimpleEdgeGenerator;
pub use entity_count::NamedEntityCountFeatureGenerator;
pub use parser::{LanguageModel, RuleBasedParser};
pub use pipeline::{
    FeatureGenerators, ParserOption, PipelineOptions, RelationExtractionPipeline, SplitterOption,
    TokenizerOption,
};
pub use splitter::RuleBasedSplitter;
pub use storage::{DictionaryStorage, LocalStorage, StorageBackend, WebHdfsStorage};
pub use tokenizer::{GenericTokenizer, WordTokenizer};
