use std::path::Path;

use async_trait::async_trait;
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::{config::CorpusConfig, pipelines::text_classification, utils::files};

use super::{DatasetError, Label, LoadableDataset, Source};

/// The name of the news dataset
pub static DATASET: &str = "news";

/// One labeled news document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, new)]
pub struct Item {
    /// The article body
    pub text: String,

    /// REAL or FAKE, assigned from the collection the row came from
    pub label: Label,
}

impl text_classification::Item for Item {
    fn input(&self) -> &str {
        &self.text
    }

    fn class_label(&self) -> Label {
        self.label
    }
}

/// The merged corpus: every REAL row followed by every FAKE row
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Corpus {
    items: Vec<Item>,
}

impl Corpus {
    /// The labeled documents in load order
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Number of documents
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the corpus holds no documents
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of documents carrying the given label
    pub fn count(&self, label: Label) -> usize {
        self.items.iter().filter(|i| i.label == label).count()
    }

    /// Read both collections. Both files are checked before either is read.
    pub fn read(config: &CorpusConfig) -> Result<Self, DatasetError> {
        let sources = [
            (Source::Real, config.real_path.as_path()),
            (Source::Fake, config.fake_path.as_path()),
        ];

        for (which, path) in sources {
            if files::first_missing(&[path]).is_some() {
                return Err(DatasetError::Missing {
                    which,
                    path: path.to_path_buf(),
                });
            }
        }

        let mut items = Vec::new();
        for (which, path) in sources {
            let before = items.len();
            read_source(path, &config.text_column, which.label(), &mut items)?;

            log::info!(
                "Loaded {} {} documents from {}",
                items.len() - before,
                which.label(),
                path.display()
            );
        }

        Ok(Self { items })
    }

    /// Write the merged corpus as a `text,label` CSV file
    pub fn export(&self, path: &Path) -> Result<(), DatasetError> {
        let to_err = |error: csv::Error| DatasetError::Export {
            path: path.to_path_buf(),
            error,
        };

        let mut writer = csv::Writer::from_path(path).map_err(to_err)?;
        for item in &self.items {
            writer.serialize(item).map_err(to_err)?;
        }
        writer.flush().map_err(|e| to_err(e.into()))?;

        log::info!("Merged corpus written to {}", path.display());

        Ok(())
    }
}

#[async_trait]
impl LoadableDataset for Corpus {
    async fn load(config: &CorpusConfig) -> Result<Self, DatasetError> {
        let corpus = Self::read(config)?;

        if let Some(export_path) = &config.export_path {
            corpus.export(export_path)?;
        }

        Ok(corpus)
    }
}

/// Append every row of one collection, labeled with `label`
fn read_source(
    path: &Path,
    column: &str,
    label: Label,
    items: &mut Vec<Item>,
) -> Result<(), DatasetError> {
    let to_err = |error: csv::Error| DatasetError::Csv {
        path: path.to_path_buf(),
        error,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(to_err)?;

    let index = reader
        .headers()
        .map_err(to_err)?
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| DatasetError::MissingColumn {
            column: column.to_string(),
            path: path.to_path_buf(),
        })?;

    for record in reader.records() {
        let record = record.map_err(to_err)?;
        let text = record.get(index).unwrap_or_default();

        items.push(Item::new(text.to_string(), label));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;

    fn write_sources(dir: &Path) -> CorpusConfig {
        let real_path = dir.join("True.csv");
        let fake_path = dir.join("Fake.csv");

        fs::write(
            &real_path,
            "title,text,subject,date\n\
             A,\"Election results certified, officials say\",politics,2017\n\
             B,Senate passes budget,politics,2017\n",
        )
        .unwrap();
        fs::write(
            &fake_path,
            "title,text,subject,date\nC,Miracle cure doctors hate,news,2017\n",
        )
        .unwrap();

        CorpusConfig {
            real_path,
            fake_path,
            text_column: "text".to_string(),
            export_path: None,
        }
    }

    #[test]
    fn test_read_labels_by_source() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_sources(dir.path());

        let corpus = Corpus::read(&config).unwrap();

        assert_eq!(
            corpus.items(),
            &[
                Item::new(
                    "Election results certified, officials say".to_string(),
                    Label::Real
                ),
                Item::new("Senate passes budget".to_string(), Label::Real),
                Item::new("Miracle cure doctors hate".to_string(), Label::Fake),
            ]
        );
        assert_eq!(corpus.count(Label::Real), 2);
        assert_eq!(corpus.count(Label::Fake), 1);
    }

    #[test]
    fn test_missing_source_is_reported_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = write_sources(dir.path());
        config.fake_path = dir.path().join("absent.csv");

        let err = Corpus::read(&config).unwrap_err();

        match err {
            DatasetError::Missing { which, path } => {
                assert_eq!(which, Source::Fake);
                assert_eq!(path, dir.path().join("absent.csv"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_real_source_names_it() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = write_sources(dir.path());
        config.real_path = dir.path().join("nope.csv");

        let err = Corpus::read(&config).unwrap_err();

        assert!(err.to_string().starts_with("real news file not found"));
    }

    #[test]
    fn test_missing_text_column() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = write_sources(dir.path());
        config.text_column = "body".to_string();

        let err = Corpus::read(&config).unwrap_err();

        assert!(matches!(err, DatasetError::MissingColumn { .. }));
    }

    #[tokio::test]
    async fn test_load_exports_merged_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = write_sources(dir.path());
        let export_path = dir.path().join("merged.csv");
        config.export_path = Some(export_path.clone());

        let corpus = Corpus::load(&config).await.unwrap();
        assert_eq!(corpus.len(), 3);

        let exported = fs::read_to_string(&export_path).unwrap();
        let mut lines = exported.lines();
        assert_eq!(lines.next(), Some("text,label"));
        assert_eq!(
            lines.next(),
            Some("\"Election results certified, officials say\",REAL")
        );
        assert_eq!(lines.last(), Some("Miracle cure doctors hate,FAKE"));
    }
}
