use thiserror::Error;

/// Errors raised by the census pipeline and its hosts.
#[derive(Debug, Error)]
pub enum CensusError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error(
        "lifespan #{index} ({birth}, {death}) lies outside year offsets 0..{year_range}"
    )]
    DataIntegrity {
        index: usize,
        birth: i64,
        death: i64,
        year_range: usize,
    },
    #[error("report io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("report encoding error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("cycle worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl CensusError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        CensusError::InvalidConfiguration(msg.into())
    }
}

pub type Result<T, E = CensusError> = std::result::Result<T, E>;
