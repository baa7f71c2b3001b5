use hyper::StatusCode;
use label_forge_command::RunnerError;
use label_forge_types::DimensionError;
use thiserror::Error;

use super::completion::CompletionError;
use super::materialize::ValidationError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    MissingUpload(&'static str),

    #[error(transparent)]
    InvalidDimension(#[from] DimensionError),

    #[error("upload '{name}' is not valid base64: {source}")]
    BadUpload {
        name: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("prompt template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("generated script rejected: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Runner(#[from] RunnerError),
}

impl PipelineError {
    /// Input problems are the caller's fault; everything else is ours.
    pub fn status(&self) -> StatusCode {
        match self {
            PipelineError::MissingUpload(_)
            | PipelineError::InvalidDimension(_)
            | PipelineError::BadUpload { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown in the form.
    pub fn user_message(&self) -> String {
        match self.status() {
            StatusCode::BAD_REQUEST => self.to_string(),
            _ => format!("Error: {self}"),
        }
    }
}
