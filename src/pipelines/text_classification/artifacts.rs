//! Paired persistence of the fitted vectorizer and classifier.
//!
//! Each file holds a bincode-encoded [`Envelope`] tagged with a magic
//! number, a format version, the artifact kind and the fingerprint of the
//! vectorizer whose coordinate system the pair shares. Both envelopes are
//! staged as `*.tmp` siblings and renamed into place only after both were
//! written successfully. If a crash lands between the two renames, the
//! fingerprints disagree and [`load`] refuses the pair.

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{config::ArtifactPaths, utils::files};

use super::{model::MultinomialNb, vectorizer::TfIdfVectorizer};

/// Identifies files written by this crate
pub const MAGIC: [u8; 4] = *b"FNCA";

/// Bumped whenever the encoded layout of either artifact changes
pub const FORMAT_VERSION: u32 = 1;

/// What a blob contains
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// A [`TfIdfVectorizer`]
    Vectorizer,

    /// A [`MultinomialNb`]
    Classifier,
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    magic: [u8; 4],
    format_version: u32,
    kind: ArtifactKind,
    fingerprint: u32,
    payload: T,
}

/// Persist both artifacts as one unit
pub fn save(
    paths: &ArtifactPaths,
    vectorizer: &TfIdfVectorizer,
    classifier: &MultinomialNb,
) -> Result<(), ArtifactError> {
    if classifier.n_features() != vectorizer.dim() {
        return Err(ArtifactError::Dimension {
            vectorizer: vectorizer.dim(),
            classifier: classifier.n_features(),
        });
    }

    let fingerprint = vectorizer.fingerprint();
    let vectorizer_bytes = encode(ArtifactKind::Vectorizer, fingerprint, vectorizer)?;
    let classifier_bytes = encode(ArtifactKind::Classifier, fingerprint, classifier)?;

    let staged_vectorizer = stage(&paths.vectorizer, &vectorizer_bytes)?;
    let staged_classifier = match stage(&paths.model, &classifier_bytes) {
        Ok(tmp) => tmp,
        Err(e) => {
            files::discard(&staged_vectorizer);
            return Err(e);
        }
    };

    let committed = files::commit(&staged_vectorizer, &paths.vectorizer)
        .map_err(|error| io_error(&paths.vectorizer, error))
        .and_then(|_| {
            files::commit(&staged_classifier, &paths.model)
                .map_err(|error| io_error(&paths.model, error))
        });

    if committed.is_err() {
        files::discard(&staged_vectorizer);
        files::discard(&staged_classifier);
    }
    committed?;

    log::info!(
        "Saved vectorizer to {} and classifier to {} (fingerprint {:08x})",
        paths.vectorizer.display(),
        paths.model.display(),
        fingerprint
    );

    Ok(())
}

/// Load both artifacts, refusing anything but a consistent pair
pub fn load(paths: &ArtifactPaths) -> Result<(TfIdfVectorizer, MultinomialNb), ArtifactError> {
    let required = [paths.vectorizer.as_path(), paths.model.as_path()];
    if let Some(missing) = files::first_missing(&required) {
        return Err(ArtifactError::Missing(missing.to_path_buf()));
    }

    let (vectorizer_fp, vectorizer): (u32, TfIdfVectorizer) =
        decode(&paths.vectorizer, ArtifactKind::Vectorizer)?;
    let (classifier_fp, classifier): (u32, MultinomialNb) =
        decode(&paths.model, ArtifactKind::Classifier)?;

    if vectorizer_fp != classifier_fp || vectorizer.fingerprint() != vectorizer_fp {
        return Err(ArtifactError::Fingerprint {
            vectorizer: vectorizer_fp,
            classifier: classifier_fp,
        });
    }

    if classifier.n_features() != vectorizer.dim() {
        return Err(ArtifactError::Dimension {
            vectorizer: vectorizer.dim(),
            classifier: classifier.n_features(),
        });
    }

    log::info!(
        "Loaded artifacts: {} terms, fingerprint {:08x}",
        vectorizer.dim(),
        vectorizer_fp
    );

    Ok((vectorizer, classifier))
}

fn encode<T: Serialize>(
    kind: ArtifactKind,
    fingerprint: u32,
    payload: &T,
) -> Result<Vec<u8>, ArtifactError> {
    let envelope = Envelope {
        magic: MAGIC,
        format_version: FORMAT_VERSION,
        kind,
        fingerprint,
        payload,
    };

    bincode::serialize(&envelope).map_err(ArtifactError::Encode)
}

fn stage(path: &Path, bytes: &[u8]) -> Result<PathBuf, ArtifactError> {
    files::write_temp(path, bytes).map_err(|error| io_error(path, error))
}

fn decode<T: DeserializeOwned>(
    path: &Path,
    expected: ArtifactKind,
) -> Result<(u32, T), ArtifactError> {
    let bytes = std::fs::read(path).map_err(|error| io_error(path, error))?;

    // Check the header before trusting the payload layout
    let header: Envelope<()> = bincode::deserialize(&bytes).map_err(|error| {
        ArtifactError::Decode {
            path: path.to_path_buf(),
            error,
        }
    })?;

    if header.magic != MAGIC {
        return Err(ArtifactError::NotAnArtifact(path.to_path_buf()));
    }

    if header.format_version != FORMAT_VERSION {
        return Err(ArtifactError::Version {
            path: path.to_path_buf(),
            found: header.format_version,
        });
    }

    if header.kind != expected {
        return Err(ArtifactError::Kind {
            path: path.to_path_buf(),
            expected,
            found: header.kind,
        });
    }

    let envelope: Envelope<T> =
        bincode::deserialize(&bytes).map_err(|error| ArtifactError::Decode {
            path: path.to_path_buf(),
            error,
        })?;

    Ok((envelope.fingerprint, envelope.payload))
}

fn io_error(path: &Path, error: std::io::Error) -> ArtifactError {
    ArtifactError::Io {
        path: path.to_path_buf(),
        error,
    }
}

/// Artifact Error
#[derive(thiserror::Error, Debug)]
pub enum ArtifactError {
    /// An artifact file is absent; the model must be trained first
    #[error("artifact not found: {} (train the model first)", .0.display())]
    Missing(PathBuf),

    /// Reading or writing a file failed
    #[error("i/o error on {}: {error}", .path.display())]
    Io {
        /// The file concerned
        path: PathBuf,
        /// The underlying failure
        error: std::io::Error,
    },

    /// Serialization failed
    #[error("unable to encode artifact: {0}")]
    Encode(bincode::Error),

    /// The file is not a decodable artifact
    #[error("unable to decode {}: {error}", .path.display())]
    Decode {
        /// The file concerned
        path: PathBuf,
        /// The underlying failure
        error: bincode::Error,
    },

    /// The file does not start with the expected magic number
    #[error("{} is not a model artifact", .0.display())]
    NotAnArtifact(PathBuf),

    /// The file was written by an incompatible version
    #[error("{} has format version {found}, expected {}", .path.display(), FORMAT_VERSION)]
    Version {
        /// The file concerned
        path: PathBuf,
        /// The version it carries
        found: u32,
    },

    /// A vectorizer was found where a classifier was expected, or vice versa
    #[error("{} holds a {found:?} artifact, expected {expected:?}", .path.display())]
    Kind {
        /// The file concerned
        path: PathBuf,
        /// The kind required at this path
        expected: ArtifactKind,
        /// The kind it holds
        found: ArtifactKind,
    },

    /// The two artifacts were not fitted together
    #[error(
        "vectorizer fingerprint {vectorizer:08x} does not match classifier fingerprint {classifier:08x}"
    )]
    Fingerprint {
        /// Fingerprint recorded with the vectorizer
        vectorizer: u32,
        /// Fingerprint recorded with the classifier
        classifier: u32,
    },

    /// The classifier was fitted on a different dimensionality
    #[error("vectorizer has {vectorizer} features but classifier expects {classifier}")]
    Dimension {
        /// Vocabulary size
        vectorizer: usize,
        /// Classifier dimensionality
        classifier: usize,
    },
}
