// src/error.rs

use thiserror::Error;

/// Errors surfaced by the extraction core.
///
/// Field-level misses are never errors — an absent field stays `None` and
/// is folded into the completeness score instead. Only structural problems
/// (input that cannot possibly carry an order) and caller-driven
/// cancellation abort a parse.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Input is structurally unusable: wrong sheet count, empty file,
    /// unrecognized file type. Always fatal, never partial.
    #[error("malformed input: {0}")]
    Structure(String),

    /// The caller's cancellation signal fired between pages. Distinct from
    /// every parse failure so callers can tell "user cancelled" from
    /// "document malformed".
    #[error("extraction cancelled")]
    Cancelled,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Workbook could not be decoded at all (corrupt zip, bad xml).
    #[error("workbook error: {0}")]
    Workbook(#[from] calamine::XlsxError),

    /// Paginated document could not be decoded into page text.
    #[error("document error: {0}")]
    Document(String),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, ExtractError>;
