//! TF-IDF feature extraction.
//!
//! The vocabulary and inverse document frequencies are learned once by
//! [`TfIdfVectorizer::fit`]. After that the vectorizer is read-only:
//! [`TfIdfVectorizer::transform`] maps text into the frozen coordinate
//! system, silently dropping terms it has never seen.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
    config::VectorizerConfig,
    utils::tokens::{tokenize, StopWords},
};

/// A sparse, L2-normalized TF-IDF vector
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    dim: usize,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl FeatureVector {
    /// Build from parallel index/value lists. Indices must be strictly increasing and below `dim`.
    pub fn new(dim: usize, indices: Vec<usize>, values: Vec<f64>) -> Result<Self, VectorizerError> {
        if indices.len() != values.len() {
            return Err(VectorizerError::Malformed(format!(
                "{} indices but {} values",
                indices.len(),
                values.len()
            )));
        }

        if indices.windows(2).any(|w| w[0] >= w[1]) {
            return Err(VectorizerError::Malformed(
                "indices must be strictly increasing".to_string(),
            ));
        }

        if let Some(&last) = indices.last() {
            if last >= dim {
                return Err(VectorizerError::Malformed(format!(
                    "index {last} out of bounds for dimension {dim}"
                )));
            }
        }

        Ok(Self {
            dim,
            indices,
            values,
        })
    }

    /// The all-zero vector
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// The dimensionality (vocabulary size)
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of non-zero entries
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Iterate over `(index, value)` pairs of the non-zero entries
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// The dense form, mostly useful for inspection
    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.dim];
        for (i, v) in self.iter() {
            dense[i] = v;
        }
        dense
    }
}

/// Term-frequency / inverse-document-frequency vectorizer with a capped vocabulary
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TfIdfVectorizer {
    /// Term -> column index, in lexical order
    vocabulary: HashMap<String, usize>,

    /// Column index -> term
    terms: Vec<String>,

    /// Smoothed inverse document frequency per column
    idf: Vec<f64>,

    stop_words: StopWords,
}

impl TfIdfVectorizer {
    /// Learn the vocabulary and idf weights from the given documents
    pub fn fit<S: AsRef<str>>(
        config: &VectorizerConfig,
        documents: &[S],
    ) -> Result<Self, VectorizerError> {
        if config.max_features == 0 {
            return Err(VectorizerError::InvalidMaxFeatures);
        }

        let tokenized: Vec<Vec<String>> = documents
            .iter()
            .map(|d| tokenize(d.as_ref(), config.stop_words))
            .collect();

        // Total count and document frequency for every candidate term
        let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        for doc in &tokenized {
            let mut seen = HashSet::new();
            for token in doc {
                let entry = counts.entry(token.as_str()).or_insert((0, 0));
                entry.0 += 1;
                if seen.insert(token.as_str()) {
                    entry.1 += 1;
                }
            }
        }

        if counts.is_empty() {
            return Err(VectorizerError::EmptyVocabulary);
        }

        // Highest total count wins; the sort is stable so ties keep lexical order
        let mut ranked: Vec<(&str, (usize, usize))> = counts.into_iter().collect();
        if ranked.len() > config.max_features {
            ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0));
            ranked.truncate(config.max_features);
            ranked.sort_by(|a, b| a.0.cmp(b.0));
        }

        let n_docs = documents.len() as f64;
        let terms: Vec<String> = ranked.iter().map(|(t, _)| t.to_string()).collect();
        let idf = ranked
            .iter()
            .map(|(_, (_, df))| ((1.0 + n_docs) / (1.0 + *df as f64)).ln() + 1.0)
            .collect();
        let vocabulary = terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();

        log::debug!(
            "Fitted vocabulary of {} terms from {} documents",
            terms.len(),
            documents.len()
        );

        Ok(Self {
            vocabulary,
            terms,
            idf,
            stop_words: config.stop_words,
        })
    }

    /// Map text into the fitted coordinate system
    pub fn transform(&self, text: &str) -> FeatureVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for token in tokenize(text, self.stop_words) {
            if let Some(&idx) = self.vocabulary.get(&token) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let (indices, mut values): (Vec<usize>, Vec<f64>) = counts
            .into_iter()
            .map(|(idx, tf)| (idx, tf * self.idf[idx]))
            .unzip();

        let norm = values.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            values.iter_mut().for_each(|v| *v /= norm);
        }

        FeatureVector {
            dim: self.terms.len(),
            indices,
            values,
        }
    }

    /// Transform a batch of documents
    pub fn transform_all<S: AsRef<str>>(&self, documents: &[S]) -> Vec<FeatureVector> {
        documents.iter().map(|d| self.transform(d.as_ref())).collect()
    }

    /// The vocabulary size, i.e. the dimensionality of every output vector
    pub fn dim(&self) -> usize {
        self.terms.len()
    }

    /// Terms in column order
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// The idf weight per column
    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    /// Column index of a term, if it is in the vocabulary
    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    /// A checksum identifying this coordinate system
    pub fn fingerprint(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&(self.terms.len() as u64).to_le_bytes());
        for (term, idf) in self.terms.iter().zip(&self.idf) {
            hasher.update(term.as_bytes());
            hasher.update(&[0]);
            hasher.update(&idf.to_bits().to_le_bytes());
        }
        hasher.finalize()
    }
}

/// Vectorizer Error
#[derive(thiserror::Error, Debug)]
pub enum VectorizerError {
    /// The fitting corpus produced no usable terms
    #[error("no terms remain after tokenization and stop-word removal")]
    EmptyVocabulary,

    /// A vocabulary cap of zero was requested
    #[error("max_features must be at least 1")]
    InvalidMaxFeatures,

    /// A feature vector was built from inconsistent parts
    #[error("malformed feature vector: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn config(max_features: usize) -> VectorizerConfig {
        VectorizerConfig {
            max_features,
            stop_words: StopWords::English,
        }
    }

    fn corpus() -> Vec<&'static str> {
        vec![
            "election results certified",
            "the election results were certified",
            "miracle cure doctors hate",
        ]
    }

    #[test]
    fn test_vocabulary_is_lexically_ordered_without_stop_words() {
        let vectorizer = TfIdfVectorizer::fit(&config(100), &corpus()).unwrap();

        assert_eq!(
            vectorizer.terms(),
            &["certified", "cure", "doctors", "election", "hate", "miracle", "results"]
        );
        assert_eq!(vectorizer.index_of("the"), None);
    }

    #[test]
    fn test_max_features_keeps_most_frequent_terms() {
        let vectorizer = TfIdfVectorizer::fit(&config(3), &corpus()).unwrap();

        // certified, election and results each appear twice
        assert_eq!(vectorizer.terms(), &["certified", "election", "results"]);
        assert_eq!(vectorizer.dim(), 3);
    }

    #[test]
    fn test_max_features_ties_resolve_lexically() {
        let vectorizer = TfIdfVectorizer::fit(&config(2), &["zeta alpha mid"]).unwrap();

        assert_eq!(vectorizer.terms(), &["alpha", "mid"]);
    }

    #[test]
    fn test_smoothed_idf() {
        let vectorizer = TfIdfVectorizer::fit(&config(100), &corpus()).unwrap();
        let election = vectorizer.index_of("election").unwrap();
        let cure = vectorizer.index_of("cure").unwrap();

        assert!((vectorizer.idf()[election] - ((4.0_f64 / 3.0).ln() + 1.0)).abs() < 1e-12);
        assert!((vectorizer.idf()[cure] - ((4.0_f64 / 2.0).ln() + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_transform_has_fixed_dimension() {
        let vectorizer = TfIdfVectorizer::fit(&config(100), &corpus()).unwrap();

        let long = "cure ".repeat(1000);

        for text in ["", "unseen words only", "election", long.as_str()] {
            assert_eq!(vectorizer.transform(text).dim(), vectorizer.dim());
        }
    }

    #[test]
    fn test_transform_drops_unknown_terms() {
        let vectorizer = TfIdfVectorizer::fit(&config(100), &corpus()).unwrap();

        let vector = vectorizer.transform("quantum blockchain");

        assert_eq!(vector.nnz(), 0);
        assert_eq!(vector, FeatureVector::zeros(vectorizer.dim()));
    }

    #[test]
    fn test_transform_is_l2_normalized() {
        let vectorizer = TfIdfVectorizer::fit(&config(100), &corpus()).unwrap();

        let vector = vectorizer.transform("miracle miracle cure election");
        let norm: f64 = vector.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();

        assert!((norm - 1.0).abs() < 1e-12);
        assert_eq!(vector.nnz(), 3);
    }

    #[test]
    fn test_transform_is_deterministic() {
        let vectorizer = TfIdfVectorizer::fit(&config(100), &corpus()).unwrap();
        let text = "Doctors certified the miracle results";

        let a = vectorizer.transform(text);
        let b = vectorizer.transform(text);

        assert_eq!(a, b);
        let bits = |v: &FeatureVector| v.iter().map(|(i, x)| (i, x.to_bits())).collect::<Vec<_>>();
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn test_empty_vocabulary() {
        let err = TfIdfVectorizer::fit(&config(100), &["the and of", ""]).unwrap_err();

        assert!(matches!(err, VectorizerError::EmptyVocabulary));
    }

    #[test]
    fn test_zero_max_features() {
        let err = TfIdfVectorizer::fit(&config(0), &corpus()).unwrap_err();

        assert!(matches!(err, VectorizerError::InvalidMaxFeatures));
    }

    #[test]
    fn test_fingerprint_tracks_vocabulary() {
        let a = TfIdfVectorizer::fit(&config(100), &corpus()).unwrap();
        let b = TfIdfVectorizer::fit(&config(100), &corpus()).unwrap();
        let c = TfIdfVectorizer::fit(&config(3), &corpus()).unwrap();

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_feature_vector_validation() {
        assert!(FeatureVector::new(3, vec![0, 2], vec![0.5, 0.5]).is_ok());
        assert!(FeatureVector::new(3, vec![2, 0], vec![0.5, 0.5]).is_err());
        assert!(FeatureVector::new(3, vec![3], vec![1.0]).is_err());
        assert!(FeatureVector::new(3, vec![1], vec![]).is_err());

        let v = FeatureVector::new(3, vec![1], vec![2.0]).unwrap();
        assert_eq!(v.to_dense(), vec![0.0, 2.0, 0.0]);
    }
}
