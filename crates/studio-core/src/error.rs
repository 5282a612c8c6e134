//! Error types for fallible internal steps.
//!
//! None of these escape the public import entry points; those convert them
//! into [`LoadStatus::Malformed`](crate::model::LoadStatus) plus defaults.

use thiserror::Error;

pub type StudioResult<T> = Result<T, StudioError>;

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Parsed JSON that is neither a project, a page, nor a layout.
    #[error("unrecognized {expected} shape")]
    Shape { expected: &'static str },

    #[error("page {index} not found (project has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },

    #[error("unknown {kind} `{value}`")]
    UnknownKeyword { kind: &'static str, value: String },
}
