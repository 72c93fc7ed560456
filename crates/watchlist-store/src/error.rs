use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchlistError {
    #[error("Failed to read watchlist file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed watchlist file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid record for {symbol} in watchlist file {path}: {reason}")]
    InvalidRecord {
        path: PathBuf,
        symbol: String,
        reason: String,
    },

    /// The in-memory mutation that preceded the write has been applied.
    #[error("Failed to write watchlist file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl WatchlistError {
    /// True for durable-storage failures (read, parse, write).
    pub fn is_persistence(&self) -> bool {
        !matches!(self, WatchlistError::InvalidInput(_))
    }
}

pub type Result<T> = std::result::Result<T, WatchlistError>;
