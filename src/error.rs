use thiserror::Error;

/// Failures that end a single crawl branch.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("fetch of {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("embedded model not found: {0}")]
    EmbeddedModel(String),

    #[error("embedded model is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected {stage} model shape: {message}")]
    Schema { stage: &'static str, message: String },

    #[error("required field `{0}` missing from listing")]
    MissingField(&'static str),

    #[error("field `{field}` could not be converted: {message}")]
    InvalidField { field: &'static str, message: String },

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("ocr failed: {0}")]
    Ocr(String),
}

impl ScrapeError {
    pub fn schema(stage: &'static str, message: impl Into<String>) -> Self {
        ScrapeError::Schema {
            stage,
            message: message.into(),
        }
    }

    /// Transport failures are expected noise; everything else means the site changed.
    pub fn is_transport(&self) -> bool {
        matches!(self, ScrapeError::Transport { .. })
    }
}

pub type ScrapeResult<T> = Result<T, ScrapeError>;

/// Failures of user-facing property operations
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("property {0} not found")]
    EntityNotFound(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error(transparent)]
    Repository(#[from] anyhow::Error),
}
