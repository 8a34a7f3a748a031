use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::data::model::StructuralFilter;

/// The reference table could not be turned into a [`Dataset`].
///
/// Fatal at startup; retrying against the same file will fail the same way.
///
/// [`Dataset`]: crate::data::model::Dataset
#[derive(Debug, Error)]
pub enum DataFormatError {
    #[error("cannot read '{}': {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("malformed table: {0}")]
    Csv(#[from] csv::Error),

    #[error("required column(s) missing: {}", missing.join(", "))]
    MissingColumns { missing: Vec<&'static str> },
}

/// The requested organ is not among the options for the current
/// (fraction, filter) pair. The caller should re-derive the organ list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{organ}' is not available for {fraction} fraction(s) with filter '{filter}'")]
pub struct InvalidSelectionError {
    pub organ: String,
    pub fraction: u32,
    pub filter: StructuralFilter,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("write failed: {0}")]
    Io(#[from] io::Error),

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("PDF export failed: {0}")]
    Pdf(String),

    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),
}
