//! Watchlist Store
//!
//! Tracks the symbols a user is watching together with the price and date
//! they were added at, persists them to a flat JSON file, and values them
//! against live quotes on demand.

pub mod error;
pub mod models;
pub mod store;


pub use error::WatchlistError;
pub use models::{normalize_symbol, ValuationRecord, WatchlistEntry};
pub use store::WatchlistStore;
