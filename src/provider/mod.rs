//! Upstream price sources. A source answers one batched request for a set of
//! symbols with a date-indexed table of closing prices; gaps are expected.
pub mod yahoo;

use std::collections::{BTreeMap, HashMap};
use std::future::Future;

use chrono::NaiveDate;

use crate::error::RetrievalError;
use crate::period::RetrievalWindow;

pub use yahoo::YahooProvider;

pub trait PriceSource {
    /// Fetch daily closes for every symbol in one call.
    fn fetch_closes(
        &self,
        symbols: &[String],
        window: RetrievalWindow,
    ) -> impl Future<Output = Result<PriceTable, RetrievalError>> + Send;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceRow {
    pub date: NaiveDate,
    closes: HashMap<String, f64>,
}

impl PriceRow {
    /// Close for `symbol`; `None` when missing or not a number.
    pub fn close(&self, symbol: &str) -> Option<f64> {
        self.closes.get(symbol).copied().filter(|price| !price.is_nan())
    }
}

/// Closing prices keyed by (date, symbol), rows in ascending date order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    rows: Vec<PriceRow>,
}

impl PriceTable {
    pub fn builder() -> PriceTableBuilder {
        PriceTableBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[PriceRow] {
        &self.rows
    }

    pub fn first(&self) -> Option<&PriceRow> {
        self.rows.first()
    }

    pub fn last(&self) -> Option<&PriceRow> {
        self.rows.last()
    }

    /// Row before the last one, if the table has at least two.
    pub fn previous(&self) -> Option<&PriceRow> {
        self.rows.len().checked_sub(2).map(|idx| &self.rows[idx])
    }
}

/// Outer-joins per-symbol series on date.
#[derive(Debug, Default)]
pub struct PriceTableBuilder {
    rows: BTreeMap<NaiveDate, HashMap<String, f64>>,
}

impl PriceTableBuilder {
    /// Record a close. A date only becomes a row once some symbol has a real
    /// close on it; `None` and NaN leave a gap for that symbol.
    pub fn close(mut self, date: NaiveDate, symbol: &str, close: Option<f64>) -> Self {
        self.push(date, symbol, close);
        self
    }

    pub fn push(&mut self, date: NaiveDate, symbol: &str, close: Option<f64>) {
        if let Some(price) = close.filter(|price| !price.is_nan()) {
            self.rows
                .entry(date)
                .or_default()
                .insert(symbol.to_string(), price);
        }
    }

    pub fn build(self) -> PriceTable {
        PriceTable {
            rows: self
                .rows
                .into_iter()
                .map(|(date, closes)| PriceRow { date, closes })
                .collect(),
        }
    }
}
