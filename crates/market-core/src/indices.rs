//! Curated index constituents the dashboard can browse.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::MarketDataError;

const NIFTY_50: &[&str] = &[
    "INDUSINDBK", "TATAMOTORS", "ASIANPAINT", "ONGC", "HEROMOTOCO", "TRENT",
    "ADANIENT", "BAJAJ-AUTO", "COALINDIA", "TATACONSUM", "TATASTEEL", "RELIANCE",
    "SBILIFE", "HINDUNILVR", "SHRIRAMFIN", "NESTLEIND", "TITAN", "ADANIPORTS",
    "BPCL", "MARUTI", "BRITANNIA", "BAJAJFINSV", "HINDALCO", "BAJFINANCE",
    "AXISBANK", "GRASIM", "BHARTIARTL", "NTPC", "BEL", "KOTAKBANK", "POWERGRID",
    "ULTRACEMCO", "ITC", "DRREDDY", "M&M", "CIPLA", "TCS", "SUNPHARMA", "JSWSTEEL",
    "LT", "HDFCLIFE", "SBIN", "ICICIBANK", "INFY", "EICHERMOT", "APOLLOHOSP",
    "TECHM", "WIPRO", "HDFCBANK", "HCLTECH",
];

const BANK_NIFTY: &[&str] = &[
    "AUBANK", "CANBK", "AXISBANK", "HDFCBANK", "ICICIBANK", "KOTAKBANK", "SBIN", "INDUSINDBK",
    "BANKBARODA", "PNB", "FEDERALBNK", "IDFCFIRSTB",
];

const FIN_NIFTY: &[&str] = &[
    "HDFCBANK", "ICICIBANK", "AXISBANK", "KOTAKBANK", "SBIN", "RELIANCE",
    "BAJAJFINSV", "BAJFINANCE", "MUTHOOTFIN", "HDFCLIFE", "TATAMOTORS", "TCS",
    "HDFC", "ICICIGI", "L&T", "ADANIGREEN", "ICICIPRULI", "M&M", "CHOLAFIN", "HDFCAMC",
    "LICHSGFIN", "MCX", "PFC", "RECLTD", "SBICARD", "SBILIFE", "SHRIRAMFIN",
];

const MIDCAP_NIFTY: &[&str] = &[
    "ASHOKLEY", "AUBANK", "AUROPHARMA", "BHARATFORG", "COFORGE", "COLPAL", "CONCOR", "COMMINSIND",
    "DIXON", "FEDERALBNK", "GODREJPROP", "HDFCAMC", "HINDPETRO", "IDEA", "IDFCFIRSTB", "INDHOTEL",
    "INDUSTOWER", "LUPIN", "MPHASIS", "MRF", "PERSISTENT", "PIIND", "POLYCAB", "SRF", "VOLTAS",
];

const SENSEX: &[&str] = &[
    "ADANIPORTS", "ASIANPAINT", "AXISBANK", "BAJAJFINSV", "BAJFINANCE", "BHARTIARTL", "HCLTECH",
    "HDFCBANK", "HINDUNILVR", "ICICIBANK", "INDUSINDBK", "INFY", "ITC", "JSWSTEEL", "KOTAKBANK",
    "LT", "M&M", "MARUTI", "NESTLEIND", "NTPC", "POWERGRID", "RELIANCE", "SBIN", "SUNPHARMA",
    "TATAMOTORS", "TATASTEEL", "TCS", "TECHM", "TITAN", "ULTRACEMCO",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarketIndex {
    Nifty50,
    BankNifty,
    FinNifty,
    MidcapNifty,
    Sensex,
}

impl MarketIndex {
    pub const ALL: [MarketIndex; 5] = [
        MarketIndex::Nifty50,
        MarketIndex::BankNifty,
        MarketIndex::FinNifty,
        MarketIndex::MidcapNifty,
        MarketIndex::Sensex,
    ];

    /// Constituents in their published order.
    pub fn constituents(&self) -> &'static [&'static str] {
        match self {
            MarketIndex::Nifty50 => NIFTY_50,
            MarketIndex::BankNifty => BANK_NIFTY,
            MarketIndex::FinNifty => FIN_NIFTY,
            MarketIndex::MidcapNifty => MIDCAP_NIFTY,
            MarketIndex::Sensex => SENSEX,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MarketIndex::Nifty50 => "Nifty 50",
            MarketIndex::BankNifty => "Bank Nifty",
            MarketIndex::FinNifty => "Fin Nifty",
            MarketIndex::MidcapNifty => "Midcap Nifty",
            MarketIndex::Sensex => "Sensex",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            MarketIndex::Nifty50 => "nifty-50",
            MarketIndex::BankNifty => "bank-nifty",
            MarketIndex::FinNifty => "fin-nifty",
            MarketIndex::MidcapNifty => "midcap-nifty",
            MarketIndex::Sensex => "sensex",
        }
    }
}

impl fmt::Display for MarketIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Selection used to narrow the browsable symbol list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexFilter {
    #[default]
    All,
    Index(MarketIndex),
}

impl IndexFilter {
    /// Sorted, de-duplicated symbols matching the filter.
    pub fn symbols(&self) -> Vec<&'static str> {
        let set: BTreeSet<&'static str> = match self {
            IndexFilter::All => MarketIndex::ALL
                .iter()
                .flat_map(|idx| idx.constituents().iter().copied())
                .collect(),
            IndexFilter::Index(idx) => idx.constituents().iter().copied().collect(),
        };
        set.into_iter().collect()
    }

    /// First listed constituent, used as the initial selection.
    pub fn default_symbol(&self) -> Option<&'static str> {
        match self {
            IndexFilter::All => NIFTY_50.first().copied(),
            IndexFilter::Index(idx) => idx.constituents().first().copied(),
        }
    }

    pub fn contains(&self, symbol: &str) -> bool {
        match self {
            IndexFilter::All => MarketIndex::ALL
                .iter()
                .any(|idx| idx.constituents().contains(&symbol)),
            IndexFilter::Index(idx) => idx.constituents().contains(&symbol),
        }
    }
}

impl FromStr for IndexFilter {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let slug = s.trim().to_ascii_lowercase();
        if slug == "all" {
            return Ok(IndexFilter::All);
        }
        MarketIndex::ALL
            .iter()
            .find(|idx| idx.slug() == slug)
            .map(|idx| IndexFilter::Index(*idx))
            .ok_or_else(|| MarketDataError::InvalidData(format!("Unknown index: {}", s)))
    }
}
