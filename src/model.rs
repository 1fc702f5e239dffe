use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::constants::MAX_SYMBOLS_PER_REQUEST;
use crate::error::ConfigurationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentDescriptor {
    /// Exchange-qualified symbol, e.g. `THYAO.IS`
    pub symbol: String,
    pub display_name: String,
    pub sector: String,
    /// Hand-curated relative size used for tile area, not a market cap
    pub weight: f64,
}

impl InstrumentDescriptor {
    pub fn new(symbol: &str, display_name: &str, sector: &str, weight: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            display_name: display_name.to_string(),
            sector: sector.to_string(),
            weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub name: String,
    /// Exchange suffix removed from symbols for display, e.g. `.IS`
    #[serde(default)]
    pub suffix: String,
    pub instruments: Vec<InstrumentDescriptor>,
}

impl Market {
    pub fn display_symbol<'a>(&self, symbol: &'a str) -> &'a str {
        display_symbol(symbol, &self.suffix)
    }

    pub fn symbols(&self) -> Vec<String> {
        self.instruments
            .iter()
            .map(|instrument| instrument.symbol.clone())
            .collect()
    }
}

/// Strip a fixed exchange suffix; symbols without it pass through unchanged.
pub fn display_symbol<'a>(symbol: &'a str, suffix: &str) -> &'a str {
    if suffix.is_empty() {
        return symbol;
    }
    symbol
        .strip_suffix(suffix)
        .filter(|stripped| !stripped.is_empty())
        .unwrap_or(symbol)
}

/// Market identifier to ordered instrument list. Validated once and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketRoster {
    markets: BTreeMap<String, Market>,
}

impl MarketRoster {
    pub fn new(markets: BTreeMap<String, Market>) -> Result<Self, ConfigurationError> {
        for (id, market) in &markets {
            if market.instruments.is_empty() {
                return Err(ConfigurationError::EmptyMarket(id.clone()));
            }
            if market.instruments.len() > MAX_SYMBOLS_PER_REQUEST {
                return Err(ConfigurationError::TooManyInstruments {
                    market: id.clone(),
                    count: market.instruments.len(),
                    max: MAX_SYMBOLS_PER_REQUEST,
                });
            }

            let mut seen = HashSet::with_capacity(market.instruments.len());
            for instrument in &market.instruments {
                if !(instrument.weight.is_finite() && instrument.weight > 0.0) {
                    return Err(ConfigurationError::InvalidWeight {
                        symbol: instrument.symbol.clone(),
                        weight: instrument.weight,
                    });
                }
                if !seen.insert(instrument.symbol.as_str()) {
                    return Err(ConfigurationError::DuplicateSymbol {
                        market: id.clone(),
                        symbol: instrument.symbol.clone(),
                    });
                }
            }
        }

        Ok(Self { markets })
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let markets: BTreeMap<String, Market> =
            serde_json::from_str(raw).context("roster is not a valid market map")?;
        Ok(Self::new(markets)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read roster file {:?}", path))?;
        Self::from_json(&raw).with_context(|| format!("invalid roster file {:?}", path))
    }

    pub fn market(&self, id: &str) -> Result<&Market, ConfigurationError> {
        self.markets
            .get(id)
            .ok_or_else(|| ConfigurationError::UnknownMarket(id.to_string()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.markets.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Market)> {
        self.markets.iter().map(|(id, market)| (id.as_str(), market))
    }
}

impl Default for MarketRoster {
    fn default() -> Self {
        default_roster()
    }
}

pub fn default_roster() -> MarketRoster {
    let mut markets = BTreeMap::new();
    markets.insert("BIST".to_string(), bist_market());
    markets.insert("FTSE".to_string(), ftse_market());

    MarketRoster::new(markets).unwrap_or_else(|err| panic!("built-in roster is invalid: {err}"))
}

fn bist_market() -> Market {
    let instruments = [
        ("THYAO.IS", "Türk Hava Yolları", "Industrials", 12.0),
        ("ASELS.IS", "Aselsan", "Industrials", 10.0),
        ("KCHOL.IS", "Koç Holding", "Holdings", 11.0),
        ("SAHOL.IS", "Sabancı Holding", "Holdings", 6.0),
        ("AKBNK.IS", "Akbank", "Financials", 8.0),
        ("GARAN.IS", "Garanti BBVA", "Financials", 10.0),
        ("ISCTR.IS", "İş Bankası", "Financials", 8.0),
        ("YKBNK.IS", "Yapı Kredi", "Financials", 6.0),
        ("TUPRS.IS", "Tüpraş", "Energy", 9.0),
        ("EREGL.IS", "Ereğli Demir Çelik", "Materials", 5.0),
        ("SISE.IS", "Şişecam", "Materials", 4.0),
        ("BIMAS.IS", "BİM Mağazalar", "Consumer Staples", 7.0),
        ("FROTO.IS", "Ford Otosan", "Consumer Discretionary", 8.0),
        ("TCELL.IS", "Turkcell", "Communication", 5.0),
    ];

    Market {
        name: "Borsa Istanbul".to_string(),
        suffix: ".IS".to_string(),
        instruments: instruments
            .iter()
            .map(|(symbol, name, sector, weight)| {
                InstrumentDescriptor::new(symbol, name, sector, *weight)
            })
            .collect(),
    }
}

fn ftse_market() -> Market {
    let instruments = [
        ("AZN.L", "AstraZeneca", "Healthcare", 180.0),
        ("GSK.L", "GSK", "Healthcare", 60.0),
        ("SHEL.L", "Shell", "Energy", 170.0),
        ("BP.L", "BP", "Energy", 70.0),
        ("HSBA.L", "HSBC", "Financials", 130.0),
        ("LLOY.L", "Lloyds Banking Group", "Financials", 35.0),
        ("BARC.L", "Barclays", "Financials", 30.0),
        ("ULVR.L", "Unilever", "Consumer Staples", 110.0),
        ("DGE.L", "Diageo", "Consumer Staples", 55.0),
        ("BATS.L", "British American Tobacco", "Consumer Staples", 60.0),
        ("RIO.L", "Rio Tinto", "Materials", 80.0),
        ("GLEN.L", "Glencore", "Materials", 50.0),
        ("REL.L", "RELX", "Industrials", 65.0),
        ("LSEG.L", "London Stock Exchange Group", "Financials", 50.0),
        ("NG.L", "National Grid", "Utilities", 40.0),
        ("VOD.L", "Vodafone", "Communication", 20.0),
    ];

    Market {
        name: "London Stock Exchange".to_string(),
        suffix: ".L".to_string(),
        instruments: instruments
            .iter()
            .map(|(symbol, name, sector, weight)| {
                InstrumentDescriptor::new(symbol, name, sector, *weight)
            })
            .collect(),
    }
}
