use std::{fmt::Display, path::PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::CorpusConfig;

/// The labeled real/fake news corpus
pub mod news;

/// The two classes a document can belong to
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Label {
    /// Genuine reporting
    #[serde(rename = "REAL")]
    Real,

    /// Fabricated reporting
    #[serde(rename = "FAKE")]
    Fake,
}

impl Label {
    /// Every label, in class-index order
    pub const ALL: [Label; 2] = [Label::Real, Label::Fake];

    /// The position of this label in per-class parameter tables
    pub fn index(self) -> usize {
        match self {
            Label::Real => 0,
            Label::Fake => 1,
        }
    }

    /// The canonical string form
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Real => "REAL",
            Label::Fake => "FAKE",
        }
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which of the two input collections a path belongs to
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Source {
    /// The collection whose rows are all labeled REAL
    Real,

    /// The collection whose rows are all labeled FAKE
    Fake,
}

impl Source {
    /// The label every row of this source receives
    pub fn label(self) -> Label {
        match self {
            Source::Real => Label::Real,
            Source::Fake => Label::Fake,
        }
    }
}

impl Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Source::Real => "real",
            Source::Fake => "fake",
        };

        write!(f, "{}", name)
    }
}

/// A dataset which can be loaded from the configured sources
#[async_trait]
pub trait LoadableDataset: Sized {
    /// Load the dataset
    async fn load(config: &CorpusConfig) -> Result<Self, DatasetError>;
}

/// Dataset Error
#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    /// An input collection does not exist
    #[error("{which} news file not found: {}", .path.display())]
    Missing {
        /// Which collection is absent
        which: Source,
        /// Where it was expected
        path: PathBuf,
    },

    /// The text column is absent from a collection's header
    #[error("column '{column}' not found in {}", .path.display())]
    MissingColumn {
        /// The configured text column
        column: String,
        /// The offending file
        path: PathBuf,
    },

    /// A collection could not be parsed as CSV
    #[error("unable to read {}: {error}", .path.display())]
    Csv {
        /// The offending file
        path: PathBuf,
        /// The underlying parse failure
        error: csv::Error,
    },

    /// The merged export could not be written
    #[error("unable to write merged corpus to {}: {error}", .path.display())]
    Export {
        /// The export destination
        path: PathBuf,
        /// The underlying failure
        error: csv::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_indexes_are_distinct() {
        assert_eq!(Label::Real.index(), 0);
        assert_eq!(Label::Fake.index(), 1);
    }

    #[test]
    fn test_label_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Label::Fake).unwrap(), "\"FAKE\"");
    }
}
