//! Relation extraction pipeline
//!
//! Prepares a dataset by running its collaborators in a fixed order:
//!
//! 1. split parts into sentences
//! 2. tokenize sentences
//! 3. generate candidate edges
//! 4. label edges against the gold relations
//! 5. parse
//! 6. run each feature generator in the order given
//!
//! Parsing runs after splitting, tokenizing and edge generation so that it
//! sees final token boundaries; edges are labeled before any feature is
//! computed.

use std::path::Path;

use relex_core::{ConfigError, Dataset, FeatureDictionary, PipelineConfig, RelexError, Result};

use crate::dictionaries::DictionaryFeatureGenerator;
use crate::edges::SimpleEdgeGenerator;
use crate::entity_count::NamedEntityCountFeatureGenerator;
use crate::parser::RuleBasedParser;
use crate::splitter::RuleBasedSplitter;
use crate::tokenizer::WordTokenizer;
use crate::{EdgeGenerator, FeatureGenerator, Parser, Splitter, Tokenizer};

// ============================================================================
// Options
// ============================================================================

/// Parser selection
#[derive(Default)]
pub enum ParserOption {
    /// [`RuleBasedParser`] with the English language model
    #[default]
    Default,
    Custom(Box<dyn Parser>),
}

/// Splitter selection
#[derive(Default)]
pub enum SplitterOption {
    /// [`RuleBasedSplitter`]
    #[default]
    Default,
    Custom(Box<dyn Splitter>),
}

/// Tokenizer selection
#[derive(Default)]
pub enum TokenizerOption {
    /// The parser's bundled tokenizer, or [`WordTokenizer`] if it has none
    #[default]
    FromParser,
    /// [`WordTokenizer`]
    Generic,
    Custom(Box<dyn Tokenizer>),
}

/// Feature generator selection
#[derive(Default)]
pub enum FeatureGenerators {
    /// Entity counts for `class1` and `class2`
    #[default]
    Default,
    One(Box<dyn FeatureGenerator>),
    Many(Vec<Box<dyn FeatureGenerator>>),
}

impl FeatureGenerators {
    fn resolve(self, class1: &str, class2: &str) -> Vec<Box<dyn FeatureGenerator>> {
        match self {
            Self::One(generator) => vec![generator],
            Self::Many(generators) if !generators.is_empty() => generators,
            Self::Many(_) | Self::Default => default_feature_generators(class1, class2),
        }
    }
}

fn default_feature_generators(class1: &str, class2: &str) -> Vec<Box<dyn FeatureGenerator>> {
    vec![
        Box::new(NamedEntityCountFeatureGenerator::new(class1, 1)),
        Box::new(NamedEntityCountFeatureGenerator::new(class2, 2)),
    ]
}

/// Collaborators of a pipeline; every field falls back to a default
#[derive(Default)]
pub struct PipelineOptions {
    pub parser: ParserOption,
    pub splitter: SplitterOption,
    pub tokenizer: TokenizerOption,
    pub edge_generator: Option<Box<dyn EdgeGenerator>>,
    pub feature_set: Option<FeatureDictionary>,
    pub feature_generators: FeatureGenerators,
}

impl PipelineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parser(mut self, parser: impl Parser + 'static) -> Self {
        self.parser = ParserOption::Custom(Box::new(parser));
        self
    }

    pub fn splitter(mut self, splitter: impl Splitter + 'static) -> Self {
        self.splitter = SplitterOption::Custom(Box::new(splitter));
        self
    }

    pub fn tokenizer(mut self, tokenizer: impl Tokenizer + 'static) -> Self {
        self.tokenizer = TokenizerOption::Custom(Box::new(tokenizer));
        self
    }

    pub fn generic_tokenizer(mut self) -> Self {
        self.tokenizer = TokenizerOption::Generic;
        self
    }

    pub fn edge_generator(mut self, edge_generator: impl EdgeGenerator + 'static) -> Self {
        self.edge_generator = Some(Box::new(edge_generator));
        self
    }

    pub fn feature_set(mut self, feature_set: FeatureDictionary) -> Self {
        self.feature_set = Some(feature_set);
        self
    }

    pub fn feature_generator(mut self, generator: impl FeatureGenerator + 'static) -> Self {
        self.feature_generators = FeatureGenerators::One(Box::new(generator));
        self
    }

    pub fn feature_generators(mut self, generators: Vec<Box<dyn FeatureGenerator>>) -> Self {
        self.feature_generators = FeatureGenerators::Many(generators);
        self
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Fixed-order preparation of a dataset for relation extraction
pub struct RelationExtractionPipeline {
    class1: String,
    class2: String,
    rel_type: String,
    parser: Box<dyn Parser>,
    splitter: Box<dyn Splitter>,
    tokenizer: Box<dyn Tokenizer>,
    edge_generator: Box<dyn EdgeGenerator>,
    feature_set: FeatureDictionary,
    feature_generators: Vec<Box<dyn FeatureGenerator>>,
}

impl RelationExtractionPipeline {
    /// Resolve `options` into concrete collaborators
    pub fn new(
        class1: impl Into<String>,
        class2: impl Into<String>,
        rel_type: impl Into<String>,
        options: PipelineOptions,
    ) -> Self {
        let class1 = class1.into();
        let class2 = class2.into();
        let rel_type = rel_type.into();

        let parser: Box<dyn Parser> = match options.parser {
            ParserOption::Default => Box::new(RuleBasedParser::default()),
            ParserOption::Custom(parser) => parser,
        };

        let splitter: Box<dyn Splitter> = match options.splitter {
            SplitterOption::Default => Box::new(RuleBasedSplitter::new()),
            SplitterOption::Custom(splitter) => splitter,
        };

        let tokenizer: Box<dyn Tokenizer> = match options.tokenizer {
            TokenizerOption::FromParser => parser.bundled_tokenizer().unwrap_or_else(|| {
                tracing::debug!("Parser has no bundled tokenizer, using the word tokenizer");
                Box::new(WordTokenizer)
            }),
            TokenizerOption::Generic => Box::new(WordTokenizer),
            TokenizerOption::Custom(tokenizer) => tokenizer,
        };

        let edge_generator = options.edge_generator.unwrap_or_else(|| {
            Box::new(SimpleEdgeGenerator::new(
                class1.clone(),
                class2.clone(),
                rel_type.clone(),
            ))
        });

        let feature_generators = options.feature_generators.resolve(&class1, &class2);

        Self {
            class1,
            class2,
            rel_type,
            parser,
            splitter,
            tokenizer,
            edge_generator,
            feature_set: options.feature_set.unwrap_or_default(),
            feature_generators,
        }
    }

    /// Build a pipeline from configuration, where collaborators are named
    ///
    /// `dictionaries` are inserted wherever the `dictionaries` generator
    /// name appears.
    pub fn from_config(
        config: &PipelineConfig,
        dictionaries: &[DictionaryFeatureGenerator],
    ) -> Result<Self> {
        let required = |value: &Option<String>, key: &str| {
            value.clone().ok_or_else(|| {
                RelexError::from(ConfigError::MissingRequired(format!("pipeline.{key}")))
            })
        };
        let class1 = required(&config.class1, "class1")?;
        let class2 = required(&config.class2, "class2")?;
        let rel_type = required(&config.rel_type, "rel_type")?;

        let mut options = PipelineOptions::new();

        options.parser = match config.parser.as_str() {
            "default" => ParserOption::Default,
            other => {
                return Err(RelexError::invalid_component(
                    "parser",
                    format!("unknown parser `{other}`"),
                ))
            }
        };

        options.tokenizer = match config.tokenizer.as_str() {
            "from_parser" => TokenizerOption::FromParser,
            "generic" => TokenizerOption::Generic,
            other => {
                return Err(RelexError::invalid_component(
                    "tokenizer",
                    format!("unknown tokenizer `{other}`"),
                ))
            }
        };

        if let Some(names) = config.feature_generators.clone() {
            let mut generators: Vec<Box<dyn FeatureGenerator>> = Vec::new();
            for (index, name) in names.into_vec().iter().enumerate() {
                match name.as_str() {
                    "entity_count_1" => generators.push(Box::new(
                        NamedEntityCountFeatureGenerator::new(class1.as_str(), 1),
                    )),
                    "entity_count_2" => generators.push(Box::new(
                        NamedEntityCountFeatureGenerator::new(class2.as_str(), 2),
                    )),
                    "dictionaries" => {
                        if dictionaries.is_empty() {
                            tracing::warn!(
                                "Feature generator `dictionaries` at index {} has no dictionaries",
                                index
                            );
                        }
                        generators.extend(
                            dictionaries
                                .iter()
                                .cloned()
                                .map(|d| Box::new(d) as Box<dyn FeatureGenerator>),
                        )
                    }
                    other => {
                        return Err(RelexError::invalid_component(
                            "feature generator",
                            format!("unknown name `{other}` at index {index}"),
                        ))
                    }
                }
            }
            if generators.is_empty() {
                return Err(RelexError::invalid_component(
                    "feature generator",
                    "the configured generators resolved to an empty list",
                ));
            }
            options.feature_generators = FeatureGenerators::Many(generators);
        }

        if let Some(path) = &config.feature_set_path {
            if Path::new(path).exists() {
                options.feature_set = Some(FeatureDictionary::load(path)?);
            }
        }

        Ok(Self::new(class1, class2, rel_type, options))
    }

    pub fn class1(&self) -> &str {
        &self.class1
    }

    pub fn class2(&self) -> &str {
        &self.class2
    }

    pub fn rel_type(&self) -> &str {
        &self.rel_type
    }

    pub fn feature_set(&self) -> &FeatureDictionary {
        &self.feature_set
    }

    pub fn into_feature_set(self) -> FeatureDictionary {
        self.feature_set
    }

    pub fn feature_generator_names(&self) -> Vec<&str> {
        self.feature_generators.iter().map(|g| g.name()).collect()
    }

    /// Run every step on `dataset`; the first failing step aborts the run
    pub fn execute(&mut self, dataset: &mut Dataset, train: bool) -> Result<()> {
        tracing::info!(
            "Relation extraction pipeline started: {} documents, {} ({} -> {}), train={}",
            dataset.documents.len(),
            self.rel_type,
            self.class1,
            self.class2,
            train
        );

        self.splitter.split(dataset)?;
        self.tokenizer.tokenize(dataset)?;
        tracing::debug!("Tokenized {} tokens", dataset.tokens().count());

        self.edge_generator.generate(dataset)?;
        dataset.label_edges();
        tracing::debug!("Generated and labeled {} edges", dataset.edges().count());

        self.parser.parse(dataset)?;

        for generator in &self.feature_generators {
            tracing::debug!("Running feature generator {}", generator.name());
            generator.generate(dataset, &mut self.feature_set, train)?;
        }

        tracing::info!(
            "Relation extraction pipeline finished: {} edges, {} features",
            dataset.edges().count(),
            self.feature_set.len()
        );
        Ok(())
    }
}

impl std::fmt::Debug for RelationExtractionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationExtractionPipeline")
            .field("class1", &self.class1)
            .field("class2", &self.class2)
            .field("rel_type", &self.rel_type)
            .field("feature_generators", &self.feature_generator_names())
            .field("feature_set", &self.feature_set.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    use relex_core::{Document, EdgeTarget, Entity, OneOrMany, Part, Relation};

    type Log = Arc<Mutex<Vec<String>>>;

    fn record(log: &Log, step: &str) {
        log.lock().unwrap().push(step.to_string());
    }

    struct RecordingSplitter(Log);
    impl Splitter for RecordingSplitter {
        fn split(&self, dataset: &mut Dataset) -> Result<()> {
            record(&self.0, "split");
            RuleBasedSplitter::new().split(dataset)
        }
    }

    struct RecordingTokenizer(Log);
    impl Tokenizer for RecordingTokenizer {
        fn tokenize(&self, dataset: &mut Dataset) -> Result<()> {
            record(&self.0, "tokenize");
            WordTokenizer.tokenize(dataset)
        }
    }

    struct RecordingEdgeGenerator(Log);
    impl EdgeGenerator for RecordingEdgeGenerator {
        fn generate(&self, dataset: &mut Dataset) -> Result<()> {
            record(&self.0, "edges");
            SimpleEdgeGenerator::new("Protein", "Location", "localizes").generate(dataset)
        }
    }

    struct RecordingParser(Log);
    impl Parser for RecordingParser {
        fn parse(&self, dataset: &mut Dataset) -> Result<()> {
            if dataset.edges().all(|e| e.target.is_some()) {
                record(&self.0, "labeled");
            }
            record(&self.0, "parse");
            Ok(())
        }
    }

    struct RecordingFeatures(Log, &'static str);
    impl FeatureGenerator for RecordingFeatures {
        fn generate(
            &self,
            _dataset: &mut Dataset,
            feature_set: &mut FeatureDictionary,
            train: bool,
        ) -> Result<()> {
            record(&self.0, self.1);
            feature_set.get_or_insert(self.1, train);
            Ok(())
        }
    }

    struct FailingParser;
    impl Parser for FailingParser {
        fn parse(&self, _dataset: &mut Dataset) -> Result<()> {
            Err(anyhow::anyhow!("parser crashed").into())
        }
    }

    fn dataset() -> Dataset {
        let brca1 = Entity::new("Protein", 0, "BRCA1");
        let nucleus = Entity::new("Location", 22, "nucleus");
        let part = Part::new("p0", "BRCA1 is found in the nucleus. TP53 is not.")
            .with_annotation(brca1.clone())
            .with_annotation(nucleus.clone())
            .with_annotation(Entity::new("Protein", 31, "TP53"))
            .with_relation(Relation::new("localizes", brca1, nucleus));
        Dataset::new().with_document(Document::new("d0").with_part(part))
    }

    fn recording_pipeline(log: &Log) -> RelationExtractionPipeline {
        let options = PipelineOptions::new()
            .parser(RecordingParser(log.clone()))
            .splitter(RecordingSplitter(log.clone()))
            .tokenizer(RecordingTokenizer(log.clone()))
            .edge_generator(RecordingEdgeGenerator(log.clone()))
            .feature_generators(vec![
                Box::new(RecordingFeatures(log.clone(), "first")),
                Box::new(RecordingFeatures(log.clone(), "second")),
            ]);
        RelationExtractionPipeline::new("Protein", "Location", "localizes", options)
    }

    #[test]
    fn test_execute_runs_steps_in_order() {
        let log: Log = Arc::default();
        let mut pipeline = recording_pipeline(&log);
        let mut dataset = dataset();

        pipeline.execute(&mut dataset, true).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["split", "tokenize", "edges", "labeled", "parse", "first", "second"]
        );
        assert_eq!(pipeline.feature_set().names(), vec!["first", "second"]);
    }

    #[test]
    fn test_execute_with_defaults() {
        let mut pipeline =
            RelationExtractionPipeline::new("Protein", "Location", "localizes", PipelineOptions::new());
        let mut dataset = dataset();

        pipeline.execute(&mut dataset, true).unwrap();

        let edges: Vec<_> = dataset.edges().collect();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target, Some(EdgeTarget::Positive));
        assert_eq!(edges[0].features.len(), 2);
        assert!(dataset.tokens().all(|t| t.pos.is_some()));
        assert_eq!(
            pipeline.feature_generator_names(),
            vec!["1_ne_count_[Protein]", "2_ne_count_[Location]"]
        );
    }

    #[test]
    fn test_failing_step_propagates() {
        let log: Log = Arc::default();
        let options = PipelineOptions::new()
            .parser(FailingParser)
            .feature_generator(RecordingFeatures(log.clone(), "never"));
        let mut pipeline = RelationExtractionPipeline::new("Protein", "Location", "r", options);

        let err = pipeline.execute(&mut dataset(), true).unwrap_err();

        assert!(err.to_string().contains("parser crashed"));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_single_generator_equals_singleton_list() {
        let log: Log = Arc::default();
        let one = RelationExtractionPipeline::new(
            "Protein",
            "Location",
            "r",
            PipelineOptions::new().feature_generator(RecordingFeatures(log.clone(), "only")),
        );
        let many = RelationExtractionPipeline::new(
            "Protein",
            "Location",
            "r",
            PipelineOptions::new()
                .feature_generators(vec![Box::new(RecordingFeatures(log.clone(), "only"))]),
        );

        assert_eq!(one.feature_generator_names().len(), 1);
        assert_eq!(one.feature_generator_names(), many.feature_generator_names());
    }

    #[test]
    fn test_empty_generator_list_uses_defaults() {
        let pipeline = RelationExtractionPipeline::new(
            "Protein",
            "Location",
            "r",
            PipelineOptions::new().feature_generators(Vec::new()),
        );
        assert_eq!(pipeline.feature_generator_names().len(), 2);
    }

    #[test]
    fn test_parser_without_bundled_tokenizer_falls_back() {
        let log: Log = Arc::default();
        let mut pipeline = RelationExtractionPipeline::new(
            "Protein",
            "Location",
            "localizes",
            PipelineOptions::new().parser(RecordingParser(log.clone())),
        );
        let mut dataset = dataset();

        pipeline.execute(&mut dataset, false).unwrap();

        assert!(dataset.tokens().count() > 0);
        assert!(pipeline.feature_set().is_empty());
    }

    fn config(names: OneOrMany<&str>) -> PipelineConfig {
        let names = match names {
            OneOrMany::One(n) => OneOrMany::One(n.to_string()),
            OneOrMany::Many(ns) => OneOrMany::Many(ns.iter().map(|n| n.to_string()).collect()),
        };
        PipelineConfig {
            class1: Some("Protein".to_string()),
            class2: Some("Location".to_string()),
            rel_type: Some("localizes".to_string()),
            feature_generators: Some(names),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_config_rejects_unknown_generator_with_index() {
        let err = RelationExtractionPipeline::from_config(
            &config(OneOrMany::Many(vec!["entity_count_1", "not_a_generator"])),
            &[],
        )
        .unwrap_err();

        match err {
            RelexError::InvalidComponent { role, message } => {
                assert_eq!(role, "feature generator");
                assert!(message.contains("at index 1"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_config_single_name() {
        let pipeline =
            RelationExtractionPipeline::from_config(&config(OneOrMany::One("entity_count_2")), &[])
                .unwrap();
        assert_eq!(
            pipeline.feature_generator_names(),
            vec!["2_ne_count_[Location]"]
        );
    }

    #[test]
    fn test_from_config_expands_dictionaries() {
        let dictionaries = vec![
            DictionaryFeatureGenerator::new("genes", HashSet::new(), false),
            DictionaryFeatureGenerator::new("cells", HashSet::new(), false),
        ];
        let pipeline = RelationExtractionPipeline::from_config(
            &config(OneOrMany::Many(vec!["dictionaries", "entity_count_1"])),
            &dictionaries,
        )
        .unwrap();

        assert_eq!(
            pipeline.feature_generator_names(),
            vec!["dics.genes", "dics.cells", "1_ne_count_[Protein]"]
        );
    }

    #[test]
    fn test_from_config_dictionaries_without_any_loaded() {
        let only_dictionaries = config(OneOrMany::One("dictionaries"));
        let err = RelationExtractionPipeline::from_config(&only_dictionaries, &[]).unwrap_err();
        assert!(matches!(
            err,
            RelexError::InvalidComponent { role: "feature generator", ref message }
                if message.contains("empty")
        ));

        let pipeline = RelationExtractionPipeline::from_config(
            &config(OneOrMany::Many(vec!["dictionaries", "entity_count_2"])),
            &[],
        )
        .unwrap();
        assert_eq!(
            pipeline.feature_generator_names(),
            vec!["2_ne_count_[Location]"]
        );
    }

    #[test]
    fn test_from_config_rejects_unknown_tokenizer_and_missing_class() {
        let mut bad_tokenizer = config(OneOrMany::One("entity_count_1"));
        bad_tokenizer.tokenizer = "spacy".to_string();
        let err = RelationExtractionPipeline::from_config(&bad_tokenizer, &[]).unwrap_err();
        assert!(matches!(err, RelexError::InvalidComponent { role: "tokenizer", .. }));

        let mut missing = config(OneOrMany::One("entity_count_1"));
        missing.class2 = None;
        let err = RelationExtractionPipeline::from_config(&missing, &[]).unwrap_err();
        assert!(matches!(err, RelexError::ConfigError(ref m) if m.contains("class2")));
    }

    #[test]
    fn test_from_config_loads_feature_set() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("features.json");
        let mut stored = FeatureDictionary::new();
        stored.get_or_insert("1_ne_count_[Protein]", true);
        stored.save(&path).unwrap();

        let mut cfg = config(OneOrMany::One("entity_count_1"));
        cfg.feature_set_path = Some(path);
        let pipeline = RelationExtractionPipeline::from_config(&cfg, &[]).unwrap();

        assert_eq!(pipeline.feature_set(), &stored);
    }
}
