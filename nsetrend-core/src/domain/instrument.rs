use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Indian exchanges reachable through the provider's suffix convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Exchange {
    Nse,
    Bse,
}

impl Exchange {
    /// Provider ticker suffix, e.g. `.NS` for `RELIANCE.NS`.
    pub fn suffix(self) -> &'static str {
        match self {
            Exchange::Nse => ".NS",
            Exchange::Bse => ".BO",
        }
    }

    /// Exchange code as written in `NSE:RELIANCE` style identifiers.
    pub fn code(self) -> &'static str {
        match self {
            Exchange::Nse => "NSE",
            Exchange::Bse => "BSE",
        }
    }

    /// Both exchanges trade on India Standard Time (UTC+05:30).
    pub fn utc_offset(self) -> FixedOffset {
        const IST_SECS: i32 = 5 * 3600 + 30 * 60;
        FixedOffset::east_opt(IST_SECS).expect("IST offset is within one day")
    }

    /// Match a provider suffix (without the dot), case-insensitive.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix.to_ascii_uppercase().as_str() {
            "NS" => Some(Exchange::Nse),
            "BO" => Some(Exchange::Bse),
            _ => None,
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Exchange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NSE" => Ok(Exchange::Nse),
            "BSE" => Ok(Exchange::Bse),
            other => Err(format!("unknown exchange '{other}' (expected NSE or BSE)")),
        }
    }
}

/// A resolved listing. Identity is the (symbol, exchange) pair.
///
/// Only the symbol resolver constructs instruments from user input, so the
/// symbol is always uppercase and suffix-free.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Instrument {
    symbol: String,
    exchange: Exchange,
}

impl Instrument {
    pub(crate) fn new(symbol: String, exchange: Exchange) -> Self {
        Self { symbol, exchange }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn exchange(&self) -> Exchange {
        self.exchange
    }

    /// Ticker in the provider's naming convention, e.g. `TCS.NS`.
    pub fn provider_ticker(&self) -> String {
        format!("{}{}", self.symbol, self.exchange.suffix())
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.exchange.code(), self.symbol)
    }
}
