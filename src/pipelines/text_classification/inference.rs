use serde::Serialize;

use crate::{config::ArtifactPaths, datasets::Label};

use super::{
    artifacts::{self, ArtifactError},
    model::{ModelError, MultinomialNb},
    vectorizer::TfIdfVectorizer,
};

/// The fitted vectorizer and classifier, always kept together.
///
/// Immutable once built, so a single instance can be shared across any
/// number of concurrent requests.
#[derive(Clone, Debug)]
pub struct Predictor {
    vectorizer: TfIdfVectorizer,
    classifier: MultinomialNb,
}

/// The outcome of classifying one document
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Prediction {
    /// The most probable label
    pub label: Label,

    /// Posterior probability of REAL
    pub real: f64,

    /// Posterior probability of FAKE
    pub fake: f64,
}

impl Prediction {
    /// Whether the document was classified as FAKE
    pub fn is_fake(&self) -> bool {
        self.label == Label::Fake
    }
}

impl Predictor {
    /// Pair a vectorizer with a classifier fitted in its coordinate system
    pub fn new(vectorizer: TfIdfVectorizer, classifier: MultinomialNb) -> Result<Self, ModelError> {
        if classifier.n_features() != vectorizer.dim() {
            return Err(ModelError::Shape {
                expected: classifier.n_features(),
                actual: vectorizer.dim(),
            });
        }

        Ok(Self {
            vectorizer,
            classifier,
        })
    }

    /// Load the persisted pair
    pub fn load(paths: &ArtifactPaths) -> Result<Self, ArtifactError> {
        let (vectorizer, classifier) = artifacts::load(paths)?;

        Ok(Self {
            vectorizer,
            classifier,
        })
    }

    /// Persist the pair
    pub fn save(&self, paths: &ArtifactPaths) -> Result<(), ArtifactError> {
        artifacts::save(paths, &self.vectorizer, &self.classifier)
    }

    /// Classify one document
    pub fn predict(&self, text: &str) -> Result<Prediction, ModelError> {
        let vector = self.vectorizer.transform(text);
        let label = self.classifier.predict(&vector)?;
        let proba = self.classifier.predict_proba(&vector)?;

        Ok(Prediction {
            label,
            real: proba[Label::Real.index()],
            fake: proba[Label::Fake.index()],
        })
    }

    /// The fitted vectorizer
    pub fn vectorizer(&self) -> &TfIdfVectorizer {
        &self.vectorizer
    }

    /// The fitted classifier
    pub fn classifier(&self) -> &MultinomialNb {
        &self.classifier
    }
}

/// Load the saved artifacts and classify each sample
pub fn infer(artifact_paths: &ArtifactPaths, samples: &[String]) -> anyhow::Result<Vec<Prediction>> {
    let predictor = Predictor::load(artifact_paths)
        .map_err(|e| anyhow!("Unable to load trained model: {}", e))?;

    samples
        .iter()
        .map(|text| predictor.predict(text).map_err(anyhow::Error::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClassifierConfig, VectorizerConfig};

    fn predictor() -> Predictor {
        let texts = ["election results certified", "miracle cure doctors hate"];
        let vectorizer = TfIdfVectorizer::fit(&VectorizerConfig::default(), &texts).unwrap();
        let classifier = MultinomialNb::fit(
            &ClassifierConfig::default(),
            &vectorizer.transform_all(&texts),
            &[Label::Real, Label::Fake],
        )
        .unwrap();

        Predictor::new(vectorizer, classifier).unwrap()
    }

    #[test]
    fn test_predict() {
        let predictor = predictor();

        let prediction = predictor.predict("a miracle cure").unwrap();

        assert!(prediction.is_fake());
        assert!(prediction.fake > prediction.real);
        assert!((prediction.fake + prediction.real - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_predict_is_repeatable() {
        let predictor = predictor();

        let a = predictor.predict("certified miracle").unwrap();
        let b = predictor.predict("certified miracle").unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_new_rejects_mismatched_pair() {
        let small =
            TfIdfVectorizer::fit(&VectorizerConfig::default(), &["only words here"]).unwrap();

        let err = Predictor::new(small, predictor().classifier().clone()).unwrap_err();

        assert!(matches!(err, ModelError::Shape { .. }));
    }

    #[test]
    fn test_infer_requires_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::in_dir(dir.path());

        let err = infer(&paths, &["anything".to_string()]).unwrap_err();

        assert!(err.to_string().contains("artifact not found"));
    }

    #[test]
    fn test_infer_after_save() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::in_dir(dir.path());
        predictor().save(&paths).unwrap();

        let predictions = infer(
            &paths,
            &["doctors hate it".to_string(), "results certified".to_string()],
        )
        .unwrap();

        let labels: Vec<_> = predictions.iter().map(|p| p.label).collect();
        assert_eq!(labels, vec![Label::Fake, Label::Real]);
    }
}
