//! # Fake News Classifier
//!
//! TF-IDF features and a multinomial naive Bayes model that label news
//! articles REAL or FAKE, with tools to train, persist, and serve them.
#![forbid(unsafe_code)]

/// Configuration
pub mod config;

/// Pipelines
pub mod pipelines;

/// Datasets
pub mod datasets;

/// HTTP prediction service
pub mod server;

/// Utilities
pub mod utils;

/// Error macros
#[macro_use]
extern crate anyhow;
