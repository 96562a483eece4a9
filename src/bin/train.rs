//! Command line tool to train and persist the classifier

use std::path::PathBuf;

use anyhow::anyhow;
use fake_news_classifier::{
    config::{ArtifactPaths, Config},
    datasets::{news, Label, LoadableDataset},
    pipelines::text_classification,
    utils::logging,
};
use pico_args::Arguments;

const HELP: &str = "\
Usage: train [OPTIONS]

Reads the REAL and FAKE collections, fits the vectorizer and classifier,
reports held-out metrics, and writes the artifact pair.

Options:
  -h, --help               Print help
  -c, --config PATH        YAML configuration file (or set FAKE_NEWS_CONFIG)
  --real PATH              CSV of REAL articles (defaults to 'True.csv')
  --fake PATH              CSV of FAKE articles (defaults to 'Fake.csv')
  --text-column NAME       Column holding the article text (defaults to 'text')
  --max-features N         Vocabulary size cap (defaults to 5000)
  --test-size FRACTION     Held-out share of the corpus (defaults to 0.2)
  --seed N                 Split seed (defaults to 42)
  -o, --artifact-dir DIR   Directory for the artifact pair
  --no-export              Skip writing the merged corpus CSV
";

#[derive(Debug)]
struct Args {
    config: Option<PathBuf>,
    real: Option<PathBuf>,
    fake: Option<PathBuf>,
    text_column: Option<String>,
    max_features: Option<usize>,
    test_size: Option<f64>,
    seed: Option<u64>,
    artifact_dir: Option<PathBuf>,
    no_export: bool,
}

impl Args {
    fn parse() -> anyhow::Result<Option<Self>> {
        let mut pargs = Arguments::from_env();

        // Help has a higher priority and should be handled separately.
        if pargs.contains(["-h", "--help"]) {
            return Ok(None);
        }

        let args = Args {
            config: pargs.opt_value_from_str(["-c", "--config"])?,
            real: pargs.opt_value_from_str("--real")?,
            fake: pargs.opt_value_from_str("--fake")?,
            text_column: pargs.opt_value_from_str("--text-column")?,
            max_features: pargs.opt_value_from_str("--max-features")?,
            test_size: pargs.opt_value_from_str("--test-size")?,
            seed: pargs.opt_value_from_str("--seed")?,
            artifact_dir: pargs.opt_value_from_str(["-o", "--artifact-dir"])?,
            no_export: pargs.contains("--no-export"),
        };

        let remaining = pargs.finish();
        if !remaining.is_empty() {
            return Err(anyhow!("Unexpected arguments: {:?}", remaining));
        }

        Ok(Some(args))
    }

    /// Layer command line overrides on top of the resolved configuration
    fn apply(self, mut config: Config) -> Config {
        if let Some(real) = self.real {
            config.corpus.real_path = real;
        }

        if let Some(fake) = self.fake {
            config.corpus.fake_path = fake;
        }

        if let Some(text_column) = self.text_column {
            config.corpus.text_column = text_column;
        }

        if let Some(max_features) = self.max_features {
            config.vectorizer.max_features = max_features;
        }

        if let Some(test_size) = self.test_size {
            config.training.test_size = test_size;
        }

        if let Some(seed) = self.seed {
            config.training.seed = seed;
        }

        if let Some(dir) = self.artifact_dir {
            config.artifacts = ArtifactPaths::in_dir(dir);
        }

        if self.no_export {
            config.corpus.export_path = None;
        }

        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let Some(args) = Args::parse()? else {
        print!("{}", HELP);

        return Ok(());
    };

    let config = Config::resolve(args.config.clone())?;
    let config = args.apply(config);
    config.validate()?;

    log::info!("Loading {} dataset", news::DATASET);
    let corpus = news::Corpus::load(&config.corpus).await?;
    log::info!(
        "Corpus: {} documents ({} REAL, {} FAKE)",
        corpus.len(),
        corpus.count(Label::Real),
        corpus.count(Label::Fake)
    );

    let trained = text_classification::train(&config, corpus.items())?;

    if let Some(evaluation) = &trained.evaluation {
        println!("Accuracy: {:.4}", evaluation.accuracy);
        println!("{}", serde_json::to_string_pretty(evaluation)?);
    }

    println!(
        "Model and vectorizer saved to {} and {}",
        config.artifacts.model.display(),
        config.artifacts.vectorizer.display()
    );

    Ok(())
}
