//! relex CLI - Command-line interface
//!
//! Usage:
//!   relex dictionaries <folder>
//!   relex annotate --input <dataset.json> --output <dataset.json>

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use relex_core::{AppConfig, Dataset, LoggingConfig, OneOrMany};
use relex_extractor::dictionaries::construct_all_from_folder;
use relex_extractor::tokenizer::word_tokenize;
use relex_extractor::{
    DictionaryFeatureGenerator, DictionaryLoadOptions, RelationExtractionPipeline,
};

#[derive(Parser)]
#[command(name = "relex")]
#[command(about = "Dictionary features and relation extraction pipeline")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the dictionaries found in a folder
    Dictionaries {
        /// Local path or WebHDFS path of the dictionary folder
        folder: Option<String>,
        /// Keep the original casing of entries
        #[arg(long)]
        case_sensitive: bool,
        /// Whitespace-separated words to leave out
        #[arg(long)]
        stop_words: Option<String>,
    },
    /// Run the relation extraction pipeline on a dataset
    Annotate {
        /// Dataset JSON to read
        #[arg(long)]
        input: PathBuf,
        /// Where the annotated dataset is written
        #[arg(long)]
        output: PathBuf,
        #[arg(long)]
        class1: Option<String>,
        #[arg(long)]
        class2: Option<String>,
        #[arg(long)]
        rel_type: Option<String>,
        /// Add unseen features to the feature set
        #[arg(long)]
        train: bool,
        /// Feature set JSON, loaded when present and saved after training
        #[arg(long)]
        feature_set: Option<PathBuf>,
        /// Dictionary folder whose dictionaries become feature generators
        #[arg(long)]
        dictionaries: Option<String>,
    },
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "relex={0},relex_core={0},relex_extractor={0}",
            logging.level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.json_format {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    Ok(config)
}

fn load_dictionaries(
    config: &AppConfig,
    folder: Option<String>,
) -> anyhow::Result<Vec<DictionaryFeatureGenerator>> {
    let mut options = match folder {
        Some(folder) => {
            let mut options = DictionaryLoadOptions::new(folder);
            options.case_sensitive = config.dictionaries.case_sensitive;
            options.stop_words = config.dictionaries.stop_words.clone();
            options.accepted_extensions = config.dictionaries.accepted_extensions.clone();
            options.timeout_secs = config.storage.timeout_secs;
            options
        }
        None => DictionaryLoadOptions::from_config(&config.dictionaries, &config.storage)?,
    };
    if options.hdfs_url.is_none() {
        options.hdfs_url = config.storage.hdfs_url.clone();
        options.hdfs_user = config.storage.hdfs_user.clone();
    }

    Ok(construct_all_from_folder(&word_tokenize, &options)?)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Dictionaries {
            folder,
            case_sensitive,
            stop_words,
        } => {
            if case_sensitive {
                config.dictionaries.case_sensitive = true;
            }
            if let Some(stop_words) = stop_words {
                config.dictionaries.stop_words = Some(stop_words.into());
            }

            let dictionaries = load_dictionaries(&config, folder)?;
            for dictionary in &dictionaries {
                println!(
                    "{}\t{}\t{} words",
                    dictionary.name(),
                    dictionary.key(),
                    dictionary.words_set().len()
                );
            }
        }
        Commands::Annotate {
            input,
            output,
            class1,
            class2,
            rel_type,
            train,
            feature_set,
            dictionaries,
        } => {
            let pipeline_config = &mut config.pipeline;
            pipeline_config.class1 = class1.or(pipeline_config.class1.take());
            pipeline_config.class2 = class2.or(pipeline_config.class2.take());
            pipeline_config.rel_type = rel_type.or(pipeline_config.rel_type.take());
            if let Some(path) = feature_set {
                pipeline_config.feature_set_path = Some(path);
            }

            let dictionaries = if dictionaries.is_some() || config.dictionaries.folder.is_some() {
                load_dictionaries(&config, dictionaries)?
            } else {
                Vec::new()
            };
            if !dictionaries.is_empty() && config.pipeline.feature_generators.is_none() {
                config.pipeline.feature_generators = Some(OneOrMany::Many(vec![
                    "entity_count_1".to_string(),
                    "entity_count_2".to_string(),
                    "dictionaries".to_string(),
                ]));
            }

            let content = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read dataset {}", input.display()))?;
            let mut dataset: Dataset = serde_json::from_str(&content)
                .with_context(|| format!("Invalid dataset {}", input.display()))?;

            let mut pipeline =
                RelationExtractionPipeline::from_config(&config.pipeline, &dictionaries)?;
            pipeline.execute(&mut dataset, train)?;

            let content = serde_json::to_string_pretty(&dataset)?;
            std::fs::write(&output, content)
                .with_context(|| format!("Failed to write dataset {}", output.display()))?;
            tracing::info!(
                "Annotated dataset written to {} ({} edges)",
                output.display(),
                dataset.edges().count()
            );

            if train {
                if let Some(path) = &config.pipeline.feature_set_path {
                    pipeline.feature_set().save(path)?;
                    tracing::info!(
                        "Feature set with {} features saved to {}",
                        pipeline.feature_set().len(),
                        path.display()
                    );
                }
            }
        }
    }

    Ok(())
}
