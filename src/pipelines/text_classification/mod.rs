/// Text Classification Items
pub mod item;

/// TF-IDF feature extraction
pub mod vectorizer;

/// Multinomial naive Bayes
pub mod model;

/// Paired artifact persistence
pub mod artifacts;

/// Training
pub mod training;

/// Inference
pub mod inference;

pub use artifacts::ArtifactError;
pub use inference::{infer, Prediction, Predictor};
pub use item::Item;
pub use model::{ModelError, MultinomialNb};
pub use training::{train, Evaluation, Trained};
pub use vectorizer::{FeatureVector, TfIdfVectorizer, VectorizerError};
