use std::path::PathBuf;

use thiserror::Error;

/// Fatal pipeline failures. Every kind aborts the run for the current
/// document; there are no retries and no partial output.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input package not found: {0}")]
    InputNotFound(PathBuf),

    #[error("not a valid document package: {path}")]
    InvalidArchive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("malformed part: {part}")]
    MalformedPart {
        part: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("text transform failed")]
    TransformFailure(#[source] Box<dyn std::error::Error + Send + Sync>),
}
