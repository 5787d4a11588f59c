//! End-to-end tests: dictionaries loaded from a folder feeding the
//! relation extraction pipeline

use std::fs;

use relex_core::{Dataset, Document, EdgeTarget, Entity, FeatureDictionary, Part, Relation};
use relex_extractor::dictionaries::construct_all_with_options;
use relex_extractor::tokenizer::word_tokenize;
use relex_extractor::{
    DictionaryLoadOptions, FeatureGenerator, LocalStorage, NamedEntityCountFeatureGenerator,
    PipelineOptions, RelationExtractionPipeline,
};
use tempfile::TempDir;

fn abstract_dataset() -> Dataset {
    let text = "BRCA1 localizes to the nucleus. Mutant RAD51 stays in the cytoplasm.";
    let brca1 = Entity::new("Protein", 0, "BRCA1");
    let nucleus = Entity::new("Location", 23, "nucleus");
    let rad51 = Entity::new("Protein", 39, "RAD51");
    let cytoplasm = Entity::new("Location", 58, "cytoplasm");

    let part = Part::new("PMC1.abstract", text)
        .with_annotation(brca1.clone())
        .with_annotation(nucleus.clone())
        .with_annotation(rad51)
        .with_annotation(cytoplasm)
        .with_relation(Relation::new("localizes", brca1, nucleus));

    Dataset::new().with_document(Document::new("PMC1").with_part(part))
}

fn dictionary_folder() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("genes.dic"), "BRCA1\nRAD51 recombinase\n").unwrap();
    fs::write(dir.path().join("compartments.tsv"), "nucleus\ncytoplasm\n").unwrap();
    fs::write(dir.path().join("README"), "not loaded\n").unwrap();
    dir
}

#[test]
fn test_dictionaries_and_pipeline_together() {
    let dir = dictionary_folder();
    let options =
        DictionaryLoadOptions::new(dir.path().to_string_lossy()).stop_words("recombinase");
    let dictionaries = construct_all_with_options(&LocalStorage, &word_tokenize, &options).unwrap();

    let names: Vec<&str> = dictionaries.iter().map(|d| d.name()).collect();
    assert_eq!(names, vec!["compartments", "genes"]);

    let mut generators: Vec<Box<dyn FeatureGenerator>> = dictionaries
        .into_iter()
        .map(|d| Box::new(d) as Box<dyn FeatureGenerator>)
        .collect();
    generators.push(Box::new(NamedEntityCountFeatureGenerator::new(
        "Protein", 1,
    )));

    let mut pipeline = RelationExtractionPipeline::new(
        "Protein",
        "Location",
        "localizes",
        PipelineOptions::new().feature_generators(generators),
    );

    let mut dataset = abstract_dataset();
    pipeline.execute(&mut dataset, true).unwrap();

    let part = dataset.parts().next().unwrap();
    assert_eq!(part.sentence_spans.len(), 2);

    let brca1 = dataset.tokens().find(|t| t.word == "BRCA1").unwrap();
    assert_eq!(brca1.features["dics.genes"].as_bool(), Some(true));
    assert_eq!(brca1.features["dics.compartments"].as_bool(), Some(false));

    let nucleus = dataset.tokens().find(|t| t.word == "nucleus").unwrap();
    assert_eq!(nucleus.features["dics.compartments"].as_bool(), Some(true));

    let targets: Vec<_> = dataset.edges().map(|e| e.target).collect();
    assert_eq!(
        targets,
        vec![Some(EdgeTarget::Positive), Some(EdgeTarget::Negative)]
    );

    let count_id = pipeline.feature_set().get("1_ne_count_[Protein]").unwrap();
    assert!(dataset
        .edges()
        .all(|e| e.features.get(&count_id) == Some(&1.0)));
}

#[test]
fn test_prediction_reuses_training_vocabulary() {
    let mut training =
        RelationExtractionPipeline::new("Protein", "Location", "localizes", PipelineOptions::new());
    training.execute(&mut abstract_dataset(), true).unwrap();
    let feature_set: FeatureDictionary = training.into_feature_set();
    assert_eq!(feature_set.len(), 2);

    let mut prediction = RelationExtractionPipeline::new(
        "Protein",
        "Location",
        "localizes",
        PipelineOptions::new().feature_set(feature_set.clone()),
    );
    let mut dataset = abstract_dataset();
    prediction.execute(&mut dataset, false).unwrap();

    assert_eq!(prediction.feature_set(), &feature_set);
    assert!(dataset.edges().all(|e| e.features.len() == 2));
}

#[test]
fn test_dataset_survives_json_round_trip_after_execution() {
    let mut pipeline =
        RelationExtractionPipeline::new("Protein", "Location", "localizes", PipelineOptions::new());
    let mut dataset = abstract_dataset();
    pipeline.execute(&mut dataset, true).unwrap();

    let json = serde_json::to_string(&dataset).unwrap();
    let restored: Dataset = serde_json::from_str(&json).unwrap();

    assert_eq!(restored.edges().count(), dataset.edges().count());
    assert_eq!(restored.tokens().count(), dataset.tokens().count());
}
