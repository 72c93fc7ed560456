use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("Quote unavailable for {0}")]
    QuoteUnavailable(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),
}

impl MarketDataError {
    /// True for conditions caused by the upstream provider rather than the caller.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            MarketDataError::QuoteUnavailable(_) | MarketDataError::ApiError(_)
        )
    }
}
