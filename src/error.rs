use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Failure taxonomy shared by the import and derivation jobs.
///
/// `Configuration` and `Validation` are fatal to the operation that raised
/// them; the rest are recorded per item and never abort an enclosing batch.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("not configured: {0}")]
    Configuration(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("upstream service error: {0}")]
    Upstream(String),

    #[error("datastore error: {0}")]
    Data(String),

    #[error("unparseable response: {0}")]
    Parse(String),
}

impl From<sqlx::Error> for PipelineError {
    fn from(err: sqlx::Error) -> Self {
        PipelineError::Data(err.to_string())
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        PipelineError::Upstream(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Parse(err.to_string())
    }
}
