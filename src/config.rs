use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::utils::tokens::StopWords;

/// Environment variable naming a YAML config file
pub static CONFIG_ENV: &str = "FAKE_NEWS_CONFIG";

/// Top-level configuration shared by the `train`, `infer` and `serve` binaries
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the labeled collections live
    pub corpus: CorpusConfig,

    /// Feature extraction settings
    pub vectorizer: VectorizerConfig,

    /// Classifier hyperparameters
    pub classifier: ClassifierConfig,

    /// Train/test split settings
    pub training: TrainingConfig,

    /// Where the fitted artifacts are stored
    pub artifacts: ArtifactPaths,

    /// HTTP listener settings
    pub server: ServerConfig,
}

/// Input collections for the Corpus Loader
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// CSV file whose rows are all labeled REAL
    pub real_path: PathBuf,

    /// CSV file whose rows are all labeled FAKE
    pub fake_path: PathBuf,

    /// Name of the free-text column
    pub text_column: String,

    /// Optional location for the merged, labeled corpus
    pub export_path: Option<PathBuf>,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            real_path: PathBuf::from("True.csv"),
            fake_path: PathBuf::from("Fake.csv"),
            text_column: "text".to_string(),
            export_path: Some(PathBuf::from("fake_or_real_news.csv")),
        }
    }
}

/// Feature Extractor settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    /// Maximum vocabulary size
    pub max_features: usize,

    /// Stop words removed before counting
    pub stop_words: StopWords,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            max_features: 5000,
            stop_words: StopWords::English,
        }
    }
}

/// Classifier hyperparameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Additive smoothing
    pub alpha: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self { alpha: 1.0 }
    }
}

/// Held-out evaluation settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Share of the corpus held out for evaluation, in `[0, 1)`
    pub test_size: f64,

    /// Seed for the shuffle preceding the split
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
        }
    }
}

/// Locations of the paired artifacts
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactPaths {
    /// The fitted Feature Extractor
    pub vectorizer: PathBuf,

    /// The fitted Classifier
    pub model: PathBuf,
}

impl ArtifactPaths {
    /// Both artifacts under a single directory, with the default file names
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let defaults = Self::default();
        let dir = dir.as_ref();

        Self {
            vectorizer: dir.join(defaults.vectorizer),
            model: dir.join(defaults.model),
        }
    }
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            vectorizer: PathBuf::from("vectorizer.bin"),
            model: PathBuf::from("fake_news_model.bin"),
        }
    }
}

/// HTTP listener settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// Port to bind
    pub port: u16,
}

impl ServerConfig {
    /// The socket address to listen on
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::Address(format!("{}:{}", self.host, self.port)))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5002,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|error| ConfigError::Read {
            path: path.to_path_buf(),
            error,
        })?;

        let config: Config = serde_yaml::from_str(&raw).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Load from the given path, else from `FAKE_NEWS_CONFIG`, else use defaults
    pub fn resolve(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        match path.or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from)) {
            Some(path) => {
                log::info!("Loading configuration from {}", path.display());
                Self::from_file(&path)
            }
            None => {
                log::debug!("No config file specified, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Reject values that cannot produce a usable model
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vectorizer.max_features == 0 {
            return Err(ConfigError::Invalid(
                "vectorizer.max_features must be at least 1".to_string(),
            ));
        }

        if !self.classifier.alpha.is_finite() || self.classifier.alpha <= 0.0 {
            return Err(ConfigError::Invalid(
                "classifier.alpha must be positive and finite".to_string(),
            ));
        }

        if !(0.0..1.0).contains(&self.training.test_size) {
            return Err(ConfigError::Invalid(
                "training.test_size must be in [0, 1)".to_string(),
            ));
        }

        Ok(())
    }
}

/// Config Error
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("unable to read config file {}: {error}", .path.display())]
    Read {
        /// The config file
        path: PathBuf,
        /// The underlying failure
        error: std::io::Error,
    },

    /// The config file is not valid YAML for [`Config`]
    #[error("unable to parse config file {}: {error}", .path.display())]
    Parse {
        /// The config file
        path: PathBuf,
        /// The underlying failure
        error: serde_yaml::Error,
    },

    /// A value is out of range
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// The listen address does not parse
    #[error("invalid listen address {0}")]
    Address(String),
}
