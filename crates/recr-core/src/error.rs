//! Error types for the recr-core library.
//!
//! The interpretation pipeline itself never fails: malformed transcripts
//! produce degraded receipts with correction records, not errors. The types
//! here cover the fallible construction paths around the pipeline, such as
//! compiling a caller-supplied merchant table or loading a config file.

use thiserror::Error;

/// Main error type for the recr library.
#[derive(Error, Debug)]
pub enum RecrError {
    /// A merchant table entry contains an invalid regex pattern.
    #[error("invalid merchant pattern {pattern:?}: {source}")]
    MerchantPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the recr library.
pub type Result<T> = std::result::Result<T, RecrError>;
