use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::Serialize;

use crate::{
    config::{Config, TrainingConfig},
    datasets::Label,
};

use super::{inference::Predictor, model::MultinomialNb, vectorizer::TfIdfVectorizer, Item};

/// Indices of the training and held-out documents
#[derive(Clone, Debug, PartialEq)]
pub struct Split {
    /// Documents the classifier is fitted on
    pub train: Vec<usize>,

    /// Documents held out for evaluation
    pub test: Vec<usize>,
}

impl Split {
    /// Shuffle `0..n` with a seeded RNG and hold out `ceil(n * test_size)` documents.
    ///
    /// The same `(n, test_size, seed)` always produces the same split.
    pub fn new(n: usize, config: &TrainingConfig) -> Self {
        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(config.seed);
        indices.shuffle(&mut rng);

        let test_len = ((n as f64) * config.test_size).ceil() as usize;
        let train = indices.split_off(test_len.min(n));

        Self {
            train,
            test: indices,
        }
    }
}

/// Precision, recall and F1 for one class
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ClassMetrics {
    /// The class these metrics describe
    pub label: Label,

    /// Share of predictions of this class that were correct
    pub precision: f64,

    /// Share of documents of this class that were found
    pub recall: f64,

    /// Harmonic mean of precision and recall
    pub f1: f64,

    /// Held-out documents of this class
    pub support: usize,
}

/// Held-out quality of a fitted model
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Evaluation {
    /// `confusion[actual][predicted]`, indexed by [`Label::index`]
    pub confusion: [[usize; 2]; 2],

    /// Share of held-out documents classified correctly
    pub accuracy: f64,

    /// Per-class metrics in [`Label::ALL`] order
    pub classes: Vec<ClassMetrics>,
}

impl Evaluation {
    /// Summarize predictions against the true labels
    pub fn new(actual: &[Label], predicted: &[Label]) -> Self {
        let mut confusion = [[0usize; 2]; 2];
        for (a, p) in actual.iter().zip(predicted) {
            confusion[a.index()][p.index()] += 1;
        }

        let total = actual.len();
        let correct: usize = Label::ALL.iter().map(|l| confusion[l.index()][l.index()]).sum();
        let accuracy = ratio(correct, total);

        let classes = Label::ALL
            .iter()
            .map(|&label| {
                let c = label.index();
                let tp = confusion[c][c];
                let predicted_c = confusion[0][c] + confusion[1][c];
                let support = confusion[c][0] + confusion[c][1];

                let precision = ratio(tp, predicted_c);
                let recall = ratio(tp, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };

                ClassMetrics {
                    label,
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect();

        Self {
            confusion,
            accuracy,
            classes,
        }
    }

    fn report(&self) {
        log::info!("Held-out accuracy: {:.4}", self.accuracy);
        for m in &self.classes {
            log::info!(
                "  {:<4}  precision {:.4}  recall {:.4}  f1 {:.4}  support {}",
                m.label,
                m.precision,
                m.recall,
                m.f1,
                m.support
            );
        }
        log::info!("  confusion (rows actual REAL/FAKE): {:?}", self.confusion);
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// The result of a training run
#[derive(Clone, Debug)]
pub struct Trained {
    /// The fitted pair
    pub predictor: Predictor,

    /// Held-out metrics, absent when nothing was held out
    pub evaluation: Option<Evaluation>,

    /// The split that was used
    pub split: Split,
}

/// Fit the vectorizer on every document and the classifier on the training split
pub fn fit<I: Item>(config: &Config, items: &[I]) -> anyhow::Result<Trained> {
    config.validate()?;

    let texts: Vec<&str> = items.iter().map(|i| i.input()).collect();
    let labels: Vec<Label> = items.iter().map(|i| i.class_label()).collect();

    let vectorizer = TfIdfVectorizer::fit(&config.vectorizer, &texts)
        .map_err(|e| anyhow!("Unable to fit vectorizer: {}", e))?;
    log::info!(
        "Vocabulary: {} terms from {} documents",
        vectorizer.dim(),
        texts.len()
    );

    let vectors = vectorizer.transform_all(&texts);

    let split = Split::new(items.len(), &config.training);
    log::info!(
        "Split: {} training / {} held out (seed {})",
        split.train.len(),
        split.test.len(),
        config.training.seed
    );

    let train_vectors: Vec<_> = split.train.iter().map(|&i| vectors[i].clone()).collect();
    let train_labels: Vec<_> = split.train.iter().map(|&i| labels[i]).collect();

    let classifier = MultinomialNb::fit(&config.classifier, &train_vectors, &train_labels)
        .map_err(|e| anyhow!("Unable to fit classifier: {}", e))?;

    let evaluation = if split.test.is_empty() {
        None
    } else {
        let actual: Vec<_> = split.test.iter().map(|&i| labels[i]).collect();
        let predicted = split
            .test
            .iter()
            .map(|&i| classifier.predict(&vectors[i]))
            .collect::<Result<Vec<_>, _>>()?;

        let evaluation = Evaluation::new(&actual, &predicted);
        evaluation.report();
        Some(evaluation)
    };

    Ok(Trained {
        predictor: Predictor::new(vectorizer, classifier)?,
        evaluation,
        split,
    })
}

/// Fit, evaluate and persist the artifact pair
pub fn train<I: Item>(config: &Config, items: &[I]) -> anyhow::Result<Trained> {
    let trained = fit(config, items)?;

    trained
        .predictor
        .save(&config.artifacts)
        .map_err(|e| anyhow!("Unable to save artifacts: {}", e))?;

    Ok(trained)
}
