//! Listing directory: known NSE symbols and their company names.
//!
//! Parsed from the exchange's `EQUITY_L.csv` (columns `SYMBOL`,
//! `NAME OF COMPANY`, plus others we ignore). When no listing file is
//! available a built-in list of large caps is used instead.

use crate::error::ConfigError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

const SYMBOL_COLUMN: &str = "SYMBOL";
const NAME_COLUMN: &str = "NAME OF COMPANY";

#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub symbol: String,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct SymbolDirectory {
    entries: BTreeMap<String, String>,
}

impl SymbolDirectory {
    pub fn from_csv_path(path: &Path) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let position = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or(ConfigError::MissingColumn(name))
        };
        let symbol_idx = position(SYMBOL_COLUMN)?;
        let name_idx = position(NAME_COLUMN)?;

        let mut entries = BTreeMap::new();
        for record in rdr.records() {
            let record = record?;
            let Some(symbol) = record.get(symbol_idx).filter(|s| !s.is_empty()) else {
                continue;
            };
            let name = record.get(name_idx).unwrap_or_default();
            entries.insert(symbol.to_ascii_uppercase(), name.to_string());
        }

        Ok(Self { entries })
    }

    /// Built-in directory used when the exchange listing cannot be loaded.
    pub fn fallback() -> Self {
        let entries = [
            ("RELIANCE", "Reliance Industries Ltd."),
            ("TCS", "Tata Consultancy Services Ltd."),
            ("HDFCBANK", "HDFC Bank Ltd."),
            ("INFY", "Infosys Ltd."),
            ("ICICIBANK", "ICICI Bank Ltd."),
            ("HINDUNILVR", "Hindustan Unilever Ltd."),
            ("ITC", "ITC Ltd."),
            ("SBIN", "State Bank of India"),
            ("BHARTIARTL", "Bharti Airtel Ltd."),
            ("KOTAKBANK", "Kotak Mahindra Bank Ltd."),
            ("WIPRO", "Wipro Ltd."),
            ("ASIANPAINT", "Asian Paints Ltd."),
            ("MARUTI", "Maruti Suzuki India Ltd."),
            ("TATAMOTORS", "Tata Motors Ltd."),
            ("TECHM", "Tech Mahindra Ltd."),
            ("TITAN", "Titan Company Ltd."),
            ("BAJFINANCE", "Bajaj Finance Ltd."),
            ("TATASTEEL", "Tata Steel Ltd."),
            ("ADANIENT", "Adani Enterprises Ltd."),
            ("ZOMATO", "Zomato Ltd."),
            ("PAYTM", "Paytm Ltd."),
            ("NYKAA", "FSN E-Commerce Ltd."),
        ]
        .into_iter()
        .map(|(s, n)| (s.to_string(), n.to_string()))
        .collect();

        Self { entries }
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.entries.contains_key(symbol)
    }

    pub fn name_of(&self, symbol: &str) -> Option<&str> {
        self.entries.get(symbol).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive substring match on symbol or company name, sorted by symbol.
    pub fn search(&self, query: &str) -> Vec<Listing> {
        let q = query.trim().to_ascii_lowercase();
        self.entries
            .iter()
            .filter(|(sym, name)| {
                q.is_empty()
                    || sym.to_ascii_lowercase().contains(&q)
                    || name.to_ascii_lowercase().contains(&q)
            })
            .map(|(sym, name)| Listing {
                symbol: sym.clone(),
                name: name.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "SYMBOL,NAME OF COMPANY, SERIES, DATE OF LISTING\n\
                          20MICRONS,20 Microns Limited,EQ,06-OCT-2008\n\
                          M&M,Mahindra & Mahindra Limited,EQ,17-NOV-1995\n\
                          tcs,Tata Consultancy Services Limited,EQ,25-AUG-2004\n";

    #[test]
    fn parses_equity_listing_csv() {
        let dir = SymbolDirectory::from_csv_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(dir.len(), 3);
        assert!(dir.contains("M&M"));
        assert!(dir.contains("TCS"));
        assert_eq!(dir.name_of("20MICRONS"), Some("20 Microns Limited"));
    }

    #[test]
    fn missing_column_is_reported() {
        let err = SymbolDirectory::from_csv_reader("TICKER,NAME\nTCS,x\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingColumn("SYMBOL")));
    }

    #[test]
    fn fallback_has_large_caps() {
        let dir = SymbolDirectory::fallback();
        assert_eq!(dir.len(), 22);
        assert!(dir.contains("RELIANCE"));
        assert!(!dir.is_empty());
    }

    #[test]
    fn search_matches_symbol_or_name() {
        let dir = SymbolDirectory::fallback();
        let tata: Vec<String> = dir.search("tata").into_iter().map(|l| l.symbol).collect();
        assert_eq!(tata, vec!["TATAMOTORS", "TATASTEEL", "TCS"]);
        assert_eq!(dir.search("").len(), dir.len());
    }
}
