use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("failed to parse index snapshot: {0}")]
    Parse(String),
    #[error("failed to export index snapshot")]
    Export(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SearchError>;
