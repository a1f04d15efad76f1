//! Error taxonomy for the record/replay engine.
//!
//! A mock-match miss and a skipped content type are ordinary control flow and
//! never surface here. Corrupt stored data is absorbed as an empty log on
//! read. The variants below cover the cases that do reach callers.

use thiserror::Error;

/// Errors surfaced by the record/replay engine.
#[derive(Debug, Error)]
pub enum EchoError {
    /// Imported content is not valid JSON. The store is left unmodified.
    #[error("import is not valid JSON: {0}")]
    ImportParse(#[source] serde_json::Error),

    /// Underlying key/value store failed.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// Entry (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The real transport failed. Propagated to the original caller
    /// unchanged; never recorded, never retried.
    #[error("transport error: {0}")]
    Transport(anyhow::Error),

    /// `install()` was called while an interceptor was already installed.
    #[error("interceptor already installed")]
    AlreadyInstalled,

    /// A control-surface operation ran with no interceptor installed.
    #[error("no interceptor installed")]
    NotInstalled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EchoError>;
