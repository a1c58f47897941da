//! Error handling for plotmerge
//!
//! Provides error types for every layer of a merge run:
//! - Configuration errors (height ordering, ink mode parameters)
//! - Input errors (missing or empty job sources)
//!
//! All error types use `thiserror` for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration error type
///
/// Detected while validating a run, before any file is touched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Pen-down height must lie strictly above pen-up height
    #[error("pen_down_z ({pen_down_z}) must be greater than pen_up_z ({pen_up_z})")]
    HeightOrdering {
        /// The configured pen-up height.
        pen_up_z: f64,
        /// The configured pen-down height.
        pen_down_z: f64,
    },

    /// A numeric setting is NaN or infinite
    #[error("Setting '{key}' must be a finite number")]
    NonFiniteValue {
        /// The offending setting name.
        key: String,
    },

    /// Default feed rate must be positive
    #[error("Default feed rate must be > 0, got {0}")]
    NonPositiveFeedrate(f64),

    /// Stroke mode selected without a positive interval
    #[error("{job}: stroke mode needs a positive stroke_interval")]
    MissingStrokeInterval {
        /// The job name.
        job: String,
    },

    /// Marker mode selected with an empty marker token
    #[error("{job}: marker mode selected but the marker token is empty")]
    EmptyMarkerToken {
        /// The job name.
        job: String,
    },

    /// Ink mode name not recognised
    #[error("{job}: unsupported ink mode '{mode}'")]
    UnknownInkMode {
        /// The job name.
        job: String,
        /// The mode string as given.
        mode: String,
    },

    /// Paper macro is empty while the strict paper policy is active
    #[error("Paper macro is empty but a paper change is required")]
    MissingPaperMacro,

    /// Output destination could not be prepared
    #[error("Cannot prepare output {path}: {reason}")]
    OutputNotCreatable {
        /// The destination path.
        path: PathBuf,
        /// The underlying failure.
        reason: String,
    },
}

/// Input error type
///
/// Raised when a job's line source cannot supply usable content.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    /// The source does not exist
    #[error("{job} G-code not found: {path}")]
    NotFound {
        /// The job name.
        job: String,
        /// Where the source was expected.
        path: String,
    },

    /// The source holds nothing but whitespace
    #[error("{job} G-code is empty: {path}")]
    Empty {
        /// The job name.
        job: String,
        /// Where the source was read from.
        path: String,
    },

    /// The source exists but could not be read
    #[error("{job} G-code could not be read from {path}: {reason}")]
    Unreadable {
        /// The job name.
        job: String,
        /// Where the source was read from.
        path: String,
        /// The underlying failure.
        reason: String,
    },
}

/// Main error type for plotmerge
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Input error
    #[error(transparent)]
    Input(#[from] InputError),

    /// Settings document error
    #[error("Settings error: {0}")]
    Settings(String),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// Check if this is an input error
    pub fn is_input_error(&self) -> bool {
        matches!(self, Error::Input(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
