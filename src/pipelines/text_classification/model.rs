use serde::{Deserialize, Serialize};

use crate::{config::ClassifierConfig, datasets::Label};

use super::vectorizer::FeatureVector;

/// Multinomial naive Bayes over TF-IDF weighted features
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MultinomialNb {
    /// ln P(class), indexed by [`Label::index`]
    class_log_prior: Vec<f64>,

    /// ln P(feature | class), one row per class
    feature_log_prob: Vec<Vec<f64>>,

    /// Training documents seen per class
    class_count: Vec<usize>,

    n_features: usize,
}

impl MultinomialNb {
    /// Fit the per-class term likelihoods and class priors.
    ///
    /// Every label must be represented at least once; otherwise the model
    /// would predict a single class regardless of input.
    pub fn fit(
        config: &ClassifierConfig,
        vectors: &[FeatureVector],
        labels: &[Label],
    ) -> Result<Self, ModelError> {
        if !config.alpha.is_finite() || config.alpha <= 0.0 {
            return Err(ModelError::InvalidAlpha(config.alpha));
        }

        if vectors.len() != labels.len() {
            return Err(ModelError::LengthMismatch {
                vectors: vectors.len(),
                labels: labels.len(),
            });
        }

        let n_features = vectors.first().map(|v| v.dim()).ok_or(ModelError::Empty)?;
        let n_classes = Label::ALL.len();

        let mut class_count = vec![0usize; n_classes];
        let mut feature_count = vec![vec![0.0; n_features]; n_classes];

        for (vector, label) in vectors.iter().zip(labels) {
            if vector.dim() != n_features {
                return Err(ModelError::Shape {
                    expected: n_features,
                    actual: vector.dim(),
                });
            }

            let c = label.index();
            class_count[c] += 1;
            for (j, value) in vector.iter() {
                feature_count[c][j] += value;
            }
        }

        if let Some(missing) = Label::ALL.into_iter().find(|l| class_count[l.index()] == 0) {
            return Err(ModelError::MissingClass(missing));
        }

        let n_docs = vectors.len() as f64;
        let class_log_prior = class_count
            .iter()
            .map(|&n| (n as f64 / n_docs).ln())
            .collect();

        let alpha = config.alpha;
        let feature_log_prob = feature_count
            .iter()
            .map(|counts| {
                let total = counts.iter().sum::<f64>() + alpha * n_features as f64;
                counts.iter().map(|&n| ((n + alpha) / total).ln()).collect()
            })
            .collect();

        Ok(Self {
            class_log_prior,
            feature_log_prob,
            class_count,
            n_features,
        })
    }

    /// The unnormalized joint log-likelihood of each class, indexed by [`Label::index`]
    pub fn joint_log_likelihood(&self, vector: &FeatureVector) -> Result<[f64; 2], ModelError> {
        if vector.dim() != self.n_features {
            return Err(ModelError::Shape {
                expected: self.n_features,
                actual: vector.dim(),
            });
        }

        let mut jll = [0.0; 2];
        for label in Label::ALL {
            let c = label.index();
            let row = &self.feature_log_prob[c];
            jll[c] = self.class_log_prior[c] + vector.iter().map(|(j, v)| v * row[j]).sum::<f64>();
        }

        Ok(jll)
    }

    /// Normalized log posterior of each class
    pub fn predict_log_proba(&self, vector: &FeatureVector) -> Result<[f64; 2], ModelError> {
        let jll = self.joint_log_likelihood(vector)?;

        let max = jll[0].max(jll[1]);
        let log_sum = max + jll.iter().map(|x| (x - max).exp()).sum::<f64>().ln();

        Ok([jll[0] - log_sum, jll[1] - log_sum])
    }

    /// Posterior probability of each class, indexed by [`Label::index`]
    pub fn predict_proba(&self, vector: &FeatureVector) -> Result<[f64; 2], ModelError> {
        let log_proba = self.predict_log_proba(vector)?;

        Ok(log_proba.map(f64::exp))
    }

    /// The most probable label. Exact ties go to REAL.
    pub fn predict(&self, vector: &FeatureVector) -> Result<Label, ModelError> {
        let jll = self.joint_log_likelihood(vector)?;

        if jll[Label::Fake.index()] > jll[Label::Real.index()] {
            Ok(Label::Fake)
        } else {
            Ok(Label::Real)
        }
    }

    /// The dimensionality this model was fitted on
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Training documents seen for a label
    pub fn class_count(&self, label: Label) -> usize {
        self.class_count[label.index()]
    }
}

/// Model Error
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ModelError {
    /// Nothing to fit on
    #[error("cannot fit a classifier on an empty training set")]
    Empty,

    /// Vectors and labels differ in length
    #[error("{vectors} feature vectors but {labels} labels")]
    LengthMismatch {
        /// Number of vectors
        vectors: usize,
        /// Number of labels
        labels: usize,
    },

    /// A label has no training examples
    #[error("no training examples labeled {0}")]
    MissingClass(Label),

    /// A vector's dimensionality does not match the model
    #[error("expected a feature vector of dimension {expected}, got {actual}")]
    Shape {
        /// The fitted dimensionality
        expected: usize,
        /// The dimensionality received
        actual: usize,
    },

    /// Smoothing must be positive
    #[error("alpha must be positive and finite, got {0}")]
    InvalidAlpha(f64),
}
