use chrono::Local;
use market_core::{Exchange, QuoteSource};
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::{Result, WatchlistError};
use crate::models::{
    normalize_symbol, validate_purchase_price, StoredEntry, ValuationRecord, WatchlistEntry,
};

/// Watchlist persisted write-through to a JSON file.
///
/// The store assumes it is the only writer of its file. Every mutation is
/// written before the call returns; two stores sharing a path overwrite each
/// other with no conflict detection.
#[derive(Debug, Clone)]
pub struct WatchlistStore {
    path: PathBuf,
    exchange: Exchange,
    entries: BTreeMap<String, WatchlistEntry>,
}

impl WatchlistStore {
    /// Empty store bound to `path`. Nothing is written until the first mutation.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            exchange: Exchange::default(),
            entries: BTreeMap::new(),
        }
    }

    /// Load the store from `path`, creating the file with an empty mapping if
    /// it does not exist yet.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let store = Self::empty(path);
                store.save()?;
                tracing::info!("Created empty watchlist at {}", store.path.display());
                return Ok(store);
            }
            Err(source) => return Err(WatchlistError::Read { path, source }),
        };

        let stored: BTreeMap<String, StoredEntry> = serde_json::from_str(&contents)
            .map_err(|source| WatchlistError::Malformed {
                path: path.clone(),
                source,
            })?;

        let mut entries = BTreeMap::new();
        for (key, record) in stored {
            let symbol = normalize_symbol(&key).map_err(|_| WatchlistError::InvalidRecord {
                path: path.clone(),
                symbol: key.clone(),
                reason: "empty symbol".to_string(),
            })?;
            if validate_purchase_price(record.purchase_price).is_err() {
                return Err(WatchlistError::InvalidRecord {
                    path,
                    symbol,
                    reason: format!("non-positive purchase price {}", record.purchase_price),
                });
            }
            if entries.contains_key(&symbol) {
                return Err(WatchlistError::InvalidRecord {
                    path,
                    symbol,
                    reason: "duplicate symbol".to_string(),
                });
            }
            entries.insert(symbol.clone(), record.into_entry(symbol));
        }

        tracing::info!("Loaded {} watchlist entries from {}", entries.len(), path.display());
        Ok(Self {
            path,
            exchange: Exchange::default(),
            entries,
        })
    }

    /// Like [`WatchlistStore::load`], but a damaged file degrades to an empty
    /// store bound to the same path. The error is handed back for display.
    /// The next mutation overwrites the damaged file.
    pub fn load_or_empty(path: impl Into<PathBuf>) -> (Self, Option<WatchlistError>) {
        let path = path.into();
        match Self::load(&path) {
            Ok(store) => (store, None),
            Err(e) => {
                tracing::error!("Error loading watchlist: {}", e);
                (Self::empty(path), Some(e))
            }
        }
    }

    /// Exchange whose suffix is appended when querying the quote source.
    pub fn with_exchange(mut self, exchange: Exchange) -> Self {
        self.exchange = exchange;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exchange(&self) -> Exchange {
        self.exchange
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in symbol order.
    pub fn entries(&self) -> impl Iterator<Item = &WatchlistEntry> {
        self.entries.values()
    }

    pub fn symbols(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn get(&self, symbol: &str) -> Option<&WatchlistEntry> {
        let symbol = normalize_symbol(symbol).ok()?;
        self.entries.get(&symbol)
    }

    /// Insert or overwrite the entry for `symbol` and persist the store.
    ///
    /// A quote failure does not reject the add: the entry is stored with an
    /// unavailable last-known price and valued later.
    pub async fn add(
        &mut self,
        symbol: &str,
        purchase_price: f64,
        quotes: &dyn QuoteSource,
    ) -> Result<WatchlistEntry> {
        let symbol = normalize_symbol(symbol)?;
        let purchase_price = validate_purchase_price(purchase_price)?;

        let last_known_price = quotes.price_quote(&self.exchange.qualify(&symbol)).await;
        if !last_known_price.is_available() {
            tracing::warn!("Adding {} to watchlist without a current price", symbol);
        }

        let entry = WatchlistEntry {
            symbol: symbol.clone(),
            purchase_price,
            purchase_date: Local::now().date_naive(),
            last_known_price,
        };
        self.entries.insert(symbol, entry.clone());
        self.save()?;

        tracing::info!("{} added to watchlist at {:.2}", entry.symbol, entry.purchase_price);
        Ok(entry)
    }

    /// Remove `symbol`. Returns false, without touching the file, when absent.
    pub fn remove(&mut self, symbol: &str) -> Result<bool> {
        let Ok(symbol) = normalize_symbol(symbol) else {
            return Ok(false);
        };
        if self.entries.remove(&symbol).is_none() {
            return Ok(false);
        }
        self.save()?;

        tracing::info!("{} removed from watchlist", symbol);
        Ok(true)
    }

    /// Remove every entry and persist the empty mapping.
    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.save()?;

        tracing::info!("Watchlist cleared");
        Ok(())
    }

    /// Value every entry against a fresh quote, one symbol at a time.
    ///
    /// A symbol whose quote fails is reported with an unavailable price; the
    /// remaining symbols are still valued.
    pub async fn valuate(&self, quotes: &dyn QuoteSource) -> Vec<ValuationRecord> {
        let mut records = Vec::with_capacity(self.entries.len());
        for entry in self.entries.values() {
            let current = quotes.price_quote(&self.exchange.qualify(&entry.symbol)).await;
            records.push(ValuationRecord::new(entry, current));
        }
        records
    }

    /// Write the full mapping to the backing file.
    pub fn save(&self) -> Result<()> {
        let stored: BTreeMap<&str, StoredEntry> = self
            .entries
            .iter()
            .map(|(symbol, entry)| (symbol.as_str(), StoredEntry::from(entry)))
            .collect();

        let json = serde_json::to_string_pretty(&stored)
            .map_err(|e| self.write_error(std::io::Error::new(ErrorKind::InvalidData, e)))?;

        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent).map_err(|source| self.write_error(source))?;
                parent
            }
            None => Path::new("."),
        };

        // Write beside the target and rename over it, so a crash mid-write
        // leaves the previous file intact.
        let mut tmp = NamedTempFile::new_in(dir).map_err(|source| self.write_error(source))?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|source| self.write_error(source))?;
        tmp.persist(&self.path)
            .map_err(|e| self.write_error(e.error))?;
        Ok(())
    }

    fn write_error(&self, source: std::io::Error) -> WatchlistError {
        WatchlistError::Write {
            path: self.path.clone(),
            source,
        }
    }
}
