//! Error types for configuration operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, saving or applying a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create directory
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Path of the directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// No entry with this name in the given section
    #[error("no entry '{name}' in [{section}]")]
    UnknownEntry {
        /// Section searched, e.g. `"curves"`.
        section: &'static str,
        /// Requested entry name.
        name: String,
    },

    /// An entry lacks a field its kind needs
    #[error("[{section}.{name}] is missing '{field}'")]
    MissingField {
        /// Section of the entry.
        section: &'static str,
        /// Entry name.
        name: String,
        /// Missing field.
        field: &'static str,
    },

    /// A curve, shaper or segment could not be built
    #[error("cannot build [{section}.{name}]: {source}")]
    Build {
        /// Section of the entry.
        section: &'static str,
        /// Entry name.
        name: String,
        /// Underlying numeric error.
        #[source]
        source: knobkit_core::Error,
    },

    /// Installing an entry into a render context failed
    #[error("graph error: {0}")]
    Graph(#[from] knobkit_graph::GraphError),

    /// Meter settings were rejected
    #[error("meter error: {0}")]
    Meter(#[from] knobkit_meter::MeterError),

    /// Validation errors
    #[error("validation failed: {0}")]
    Validation(#[from] crate::validation::ValidationError),
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Create a create directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }

    /// Create an unknown entry error.
    pub fn unknown_entry(section: &'static str, name: impl Into<String>) -> Self {
        ConfigError::UnknownEntry {
            section,
            name: name.into(),
        }
    }
}
