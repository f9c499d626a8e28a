//! Symbol resolution: raw user input → canonical [`Instrument`].
//!
//! Accepted forms: `TCS`, `tcs`, `TCS.NS`, `TCS.BO`, `NSE:TCS`, `BSE:TCS`.
//! The same listing written any of these ways yields the same instrument, and
//! therefore the same cache key.

use super::directory::SymbolDirectory;
use crate::domain::{Exchange, Instrument};
use crate::error::ResolutionError;
use std::sync::Arc;

const MAX_SYMBOL_LEN: usize = 20;

#[derive(Debug, Clone)]
pub struct SymbolResolver {
    default_exchange: Exchange,
    directory: Option<Arc<SymbolDirectory>>,
    strict: bool,
}

impl Default for SymbolResolver {
    fn default() -> Self {
        Self::new(Exchange::Nse)
    }
}

impl SymbolResolver {
    pub fn new(default_exchange: Exchange) -> Self {
        Self {
            default_exchange,
            directory: None,
            strict: false,
        }
    }

    /// Attach a listing directory. With `strict`, unknown symbols fail resolution.
    pub fn with_directory(mut self, directory: Arc<SymbolDirectory>, strict: bool) -> Self {
        self.directory = Some(directory);
        self.strict = strict;
        self
    }

    pub fn directory(&self) -> Option<&SymbolDirectory> {
        self.directory.as_deref()
    }

    pub fn resolve(&self, raw: &str) -> Result<Instrument, ResolutionError> {
        let normalized = raw.trim().to_ascii_uppercase();
        if normalized.is_empty() {
            return Err(ResolutionError::Empty);
        }

        let (symbol, exchange) = self.split_exchange(&normalized)?;
        validate_symbol(symbol)?;

        if self.strict {
            if let Some(dir) = &self.directory {
                if !dir.contains(symbol) {
                    return Err(ResolutionError::UnknownSymbol {
                        symbol: symbol.to_string(),
                    });
                }
            }
        }

        Ok(Instrument::new(symbol.to_string(), exchange))
    }

    /// Company name for a resolved instrument, when the directory knows it.
    pub fn company_name(&self, instrument: &Instrument) -> Option<String> {
        self.directory
            .as_ref()
            .and_then(|d| d.name_of(instrument.symbol()))
            .map(str::to_string)
    }

    fn split_exchange<'a>(&self, input: &'a str) -> Result<(&'a str, Exchange), ResolutionError> {
        if let Some((prefix, rest)) = input.split_once(':') {
            let exchange = prefix.parse::<Exchange>().map_err(|_| {
                ResolutionError::UnsupportedExchange {
                    exchange: prefix.to_string(),
                }
            })?;
            return Ok((rest.trim(), exchange));
        }

        if let Some((symbol, suffix)) = input.rsplit_once('.') {
            let exchange = Exchange::from_suffix(suffix).ok_or_else(|| {
                ResolutionError::UnsupportedExchange {
                    exchange: suffix.to_string(),
                }
            })?;
            return Ok((symbol, exchange));
        }

        Ok((input, self.default_exchange))
    }
}

fn validate_symbol(symbol: &str) -> Result<(), ResolutionError> {
    let mut chars = symbol.chars();
    let first = chars.next().ok_or(ResolutionError::Empty)?;

    let len = symbol.chars().count();
    if len > MAX_SYMBOL_LEN {
        return Err(ResolutionError::TooLong {
            len,
            max: MAX_SYMBOL_LEN,
        });
    }

    if !first.is_ascii_alphanumeric() {
        return Err(ResolutionError::InvalidStart { ch: first });
    }

    for (index, ch) in symbol.chars().enumerate() {
        let valid = ch.is_ascii_alphanumeric() || ch == '&' || ch == '-';
        if !valid {
            return Err(ResolutionError::InvalidChar { ch, index });
        }
    }

    Ok(())
}
