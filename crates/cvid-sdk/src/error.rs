use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error(transparent)]
    Cache(#[from] cvid_cache::CacheError),

    #[error("invalid session config: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SdkError {
    /// The instability report, if this error carries one.
    pub fn instability(&self) -> Option<&cvid_cache::InstabilityReport> {
        match self {
            Self::Cache(err) => err.report(),
            _ => None,
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
