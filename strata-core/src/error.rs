//! Error types for the strata checker
//!
//! Rule violations are *not* errors: they are findings collected by the
//! checker. The types here cover everything that stops a run before
//! validation starts (bad configuration, unreadable edge lists, I/O).

use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// One or more problems in the rule file
    #[error("{0}")]
    Config(#[from] ConfigErrors),

    /// Malformed pre-computed edge list
    #[error("Edge list error in '{path}'{}: {message}", line_suffix(.line))]
    EdgeList {
        path: String,
        line: Option<usize>,
        message: String,
    },

    /// Source tree could not be scanned
    #[error("Scan error in '{path}': {message}")]
    Scan { path: String, message: String },

    /// I/O error
    #[error("I/O error: {message}")]
    Io { message: String },
}

fn line_suffix(line: &Option<usize>) -> String {
    match line {
        Some(l) => format!(" at line {}", l),
        None => String::new(),
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(ConfigErrors::from(err))
    }
}

/// A single problem found while loading the rule file
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// TOML syntax or schema type error
    #[error("failed to parse {file}: {message}")]
    Parse { file: String, message: String },

    /// A `[[modules]]` entry without a required field
    #[error("module entry #{index} is missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },

    /// Two `[[modules]]` entries share a path
    #[error("duplicate module path '{path}'")]
    DuplicateModule { path: String },

    /// A dotted path with empty or non-identifier segments
    #[error("invalid module path '{path}' in {context}")]
    InvalidPath { path: String, context: String },

    /// A layer name that is not one of the known layers, or not declared in `layers`
    #[error("unknown layer '{name}' in {context} (known layers: {known})")]
    UnknownLayer {
        name: String,
        context: String,
        known: String,
    },

    /// `layers` must be written highest first
    #[error("layers must be listed highest first: '{higher}' is listed before '{lower}'")]
    LayerOrder { higher: String, lower: String },

    /// An `exclude` pattern that is not a valid glob
    #[error("invalid exclude pattern '{pattern}': {message}")]
    InvalidGlob { pattern: String, message: String },
}

/// Every configuration problem found in one pass over the rule file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigErrors {
    errors: Vec<ConfigError>,
}

impl ConfigErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Add an error to the collection
    pub fn push(&mut self, error: ConfigError) {
        self.errors.push(error);
    }

    /// Check if there are any errors
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get the number of errors
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Get all errors
    pub fn errors(&self) -> &[ConfigError] {
        &self.errors
    }

    /// `Ok(value)` when nothing was collected
    pub fn into_result<T>(self, value: T) -> std::result::Result<T, Self> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.len() == 1 {
            return write!(f, "Configuration error: {}", self.errors[0]);
        }
        write!(f, "Found {} configuration error(s):", self.errors.len())?;
        for (i, error) in self.errors.iter().enumerate() {
            write!(f, "\n  [{}] {}", i + 1, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigErrors {}

impl From<ConfigError> for ConfigErrors {
    fn from(error: ConfigError) -> Self {
        let mut errors = ConfigErrors::new();
        errors.push(error);
        errors
    }
}

impl IntoIterator for ConfigErrors {
    type Item = ConfigError;
    type IntoIter = std::vec::IntoIter<ConfigError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}
