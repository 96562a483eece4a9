/// File utilities
pub mod files;

/// Logger setup for the binaries
pub mod logging;

/// Tokenization and stop words
pub mod tokens;
