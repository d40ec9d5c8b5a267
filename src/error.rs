use thiserror::Error;

/// Errors produced by the pipeline and its surrounding tooling.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Required configuration is missing (e.g. the API credential).
    ///
    /// Fatal: reported before any stage runs.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A pipeline stage failed; the run was aborted at this stage.
    #[error("Stage '{stage}' failed: {message}")]
    StageFailed { stage: String, message: String },

    /// Low-level HTTP transport failure (connection refused, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// HTTP error with status code and response body.
    ///
    /// Returned by [`Backend`](crate::backend::Backend) implementations when
    /// the provider returns a non-success status code.
    #[error("HTTP {status}: {body}")]
    HttpError {
        /// HTTP status code (e.g. 400, 429, 503).
        status: u16,
        /// Response body text.
        body: String,
    },

    /// JSON parsing failed at the serde level.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// File system failure while writing documents or archives.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Zip container could not be written or read.
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Invalid configuration or input detected at build time.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(String),
}

impl PipelineError {
    /// Name of the failing stage, if this error aborted a run.
    pub fn stage(&self) -> Option<&str> {
        match self {
            PipelineError::StageFailed { stage, .. } => Some(stage),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for PipelineError {
    fn from(err: anyhow::Error) -> Self {
        PipelineError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
