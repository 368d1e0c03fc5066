use sketchseek_common::error::ApiError;
use thiserror::Error;

/// Rejected user input. Always raised before any remote call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a text description.")]
    EmptyTextPrompt,

    #[error("Please draw something on the canvas.")]
    EmptyCanvas,

    #[error("Text designs cannot carry canvas data.")]
    UnexpectedCanvasData,

    #[error("Canvas designs cannot carry a text prompt.")]
    UnexpectedTextPrompt,

    #[error("At least one search provider is required.")]
    NoProviders,
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Transport(#[from] ApiError),

    #[error("Job polling timed out after {attempts} attempts")]
    PollingTimeout {
        attempts: u32,
        last_error: Option<ApiError>,
    },

    #[error("Workflow cancelled")]
    Cancelled,
}
