use thiserror::Error;

/// Errors that abort a whole pipeline run.
///
/// Per-candidate failures are NOT represented here — those are
/// [`veracart_core::RejectReason`] values recorded in the search report.
/// Only conditions that make the run itself impossible propagate.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search query is empty")]
    EmptyQuery,
}
