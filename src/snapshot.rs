//! Market snapshots: one batched price retrieval per (market, period),
//! turned into per-instrument percent changes and cached for a fixed epoch.

use std::time::Duration;

use serde::Serialize;
use serde_json::json;

use crate::cache::TtlCache;
use crate::error::{ConfigurationError, RetrievalError};
use crate::logging;
use crate::model::{Market, MarketRoster};
use crate::period::Period;
use crate::provider::{PriceSource, PriceTable};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentSnapshot {
    /// Display symbol, exchange suffix removed
    pub symbol: String,
    pub display_name: String,
    pub sector: String,
    pub weight: f64,
    pub current_price: f64,
    pub percent_change: f64,
    pub change_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub market: String,
    pub period: Period,
    pub instruments: Vec<InstrumentSnapshot>,
    /// Set when the provider failed or returned nothing
    pub failure: Option<String>,
}

impl Snapshot {
    fn failed(market: &str, period: Period, err: &RetrievalError) -> Self {
        Self {
            market: market.to_string(),
            period,
            instruments: Vec::new(),
            failure: Some(format!("No market data available: {err}")),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percent move from `start` to `current`, two decimals. Missing prices and a
/// zero start both yield `0.0`.
pub fn percent_change(current: Option<f64>, start: Option<f64>) -> f64 {
    match (current, start) {
        (Some(current), Some(start)) if !current.is_nan() && !start.is_nan() && start != 0.0 => {
            round2((current - start) / start * 100.0)
        }
        _ => 0.0,
    }
}

pub fn change_label(percent: f64) -> String {
    if percent > 0.0 {
        format!("+{percent:.2}%")
    } else if percent < 0.0 {
        format!("{percent:.2}%")
    } else {
        "0.00%".to_string()
    }
}

/// Per-instrument records for one retrieved table. Instruments without a
/// close in the last row are left out.
pub fn compute_snapshot(market: &Market, period: Period, table: &PriceTable) -> Vec<InstrumentSnapshot> {
    let Some(current_row) = table.last() else {
        return Vec::new();
    };

    // A single row compares against itself, i.e. 0% for everything.
    let start_row = if period.compares_previous_session() {
        table.previous().unwrap_or(current_row)
    } else {
        table.first().unwrap_or(current_row)
    };

    market
        .instruments
        .iter()
        .filter_map(|instrument| {
            let current = current_row.close(&instrument.symbol)?;
            let start = start_row.close(&instrument.symbol);
            let change = percent_change(Some(current), start);

            Some(InstrumentSnapshot {
                symbol: market.display_symbol(&instrument.symbol).to_string(),
                display_name: instrument.display_name.clone(),
                sector: instrument.sector.clone(),
                weight: instrument.weight,
                current_price: round2(current),
                percent_change: change,
                change_label: change_label(change),
            })
        })
        .collect()
}

pub struct MarketSnapshotBuilder<S> {
    roster: MarketRoster,
    source: S,
    cache: TtlCache<(String, Period), Snapshot>,
}

impl<S: PriceSource> MarketSnapshotBuilder<S> {
    pub fn new(roster: MarketRoster, source: S, cache_ttl: Duration) -> Self {
        Self {
            roster,
            source,
            cache: TtlCache::new(cache_ttl),
        }
    }

    pub fn roster(&self) -> &MarketRoster {
        &self.roster
    }

    /// Snapshot for `market_id` over `period_label`.
    ///
    /// Bad inputs fail with [`ConfigurationError`]. Provider failures never
    /// escape: they produce an empty snapshot with `failure` set, and are not
    /// cached so the next call retries.
    pub async fn build_snapshot(
        &self,
        market_id: &str,
        period_label: &str,
    ) -> Result<Snapshot, ConfigurationError> {
        let market = self.roster.market(market_id)?;
        let period: Period = period_label.parse()?;

        let key = (market_id.to_string(), period);
        let outcome = self
            .cache
            .get_or_compute(key, || self.retrieve(market_id, market, period))
            .await;

        match outcome {
            Ok(snapshot) => Ok(snapshot),
            Err(err) => {
                logging::warn(
                    "snapshot.retrieval_failed",
                    "Price retrieval failed; returning empty snapshot",
                    json!({
                        "market": market_id,
                        "period": period.label(),
                        "error": err.to_string(),
                    }),
                );
                Ok(Snapshot::failed(market_id, period, &err))
            }
        }
    }

    async fn retrieve(
        &self,
        market_id: &str,
        market: &Market,
        period: Period,
    ) -> Result<Snapshot, RetrievalError> {
        let symbols = market.symbols();
        let table = self.source.fetch_closes(&symbols, period.window()).await?;
        if table.is_empty() {
            return Err(RetrievalError::Empty);
        }

        let instruments = compute_snapshot(market, period, &table);
        if instruments.is_empty() {
            return Err(RetrievalError::Empty);
        }

        logging::info(
            "snapshot.built",
            "Market snapshot computed",
            json!({
                "market": market_id,
                "period": period.label(),
                "rows": table.len(),
                "instruments": instruments.len(),
                "omitted": symbols.len() - instruments.len(),
                "cache_ttl_secs": self.cache.ttl().as_secs(),
            }),
        );

        Ok(Snapshot {
            market: market_id.to_string(),
            period,
            instruments,
            failure: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::model::InstrumentDescriptor;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).expect("valid date")
    }

    fn market() -> Market {
        Market {
            name: "Test".into(),
            suffix: ".L".into(),
            instruments: vec![
                InstrumentDescriptor::new("AZN.L", "AstraZeneca", "Healthcare", 3.0),
                InstrumentDescriptor::new("BP.L", "BP", "Energy", 2.0),
                InstrumentDescriptor::new("VOD.L", "Vodafone", "Communication", 1.0),
            ],
        }
    }

    #[test]
    fn percent_change_rounds_and_falls_back() {
        assert_eq!(percent_change(Some(110.0), Some(100.0)), 10.0);
        assert_eq!(percent_change(Some(95.0), Some(100.0)), -5.0);
        assert_eq!(percent_change(Some(1.0), Some(3.0)), -66.67);
        assert_eq!(percent_change(Some(110.0), Some(0.0)), 0.0);
        assert_eq!(percent_change(Some(110.0), None), 0.0);
        assert_eq!(percent_change(None, Some(100.0)), 0.0);
        assert_eq!(percent_change(Some(f64::NAN), Some(100.0)), 0.0);
    }

    #[test]
    fn change_label_carries_sign() {
        assert_eq!(change_label(10.0), "+10.00%");
        assert_eq!(change_label(-5.0), "-5.00%");
        assert_eq!(change_label(-0.0), "0.00%");
    }

    #[test]
    fn multi_day_period_compares_first_and_last_rows() {
        let table = PriceTable::builder()
            .close(day(1), "AZN.L", Some(100.0))
            .close(day(1), "BP.L", Some(0.0))
            .close(day(2), "AZN.L", Some(105.0))
            .close(day(3), "AZN.L", Some(110.0))
            .close(day(3), "BP.L", Some(4.567))
            .build();

        let rows = compute_snapshot(&market(), Period::OneMonth, &table);
        assert_eq!(rows.len(), 2, "VOD has no current price and is omitted");

        assert_eq!(rows[0].symbol, "AZN");
        assert_eq!(rows[0].percent_change, 10.0);
        assert_eq!(rows[0].change_label, "+10.00%");
        assert_eq!(rows[0].weight, 3.0);

        assert_eq!(rows[1].symbol, "BP");
        assert_eq!(rows[1].current_price, 4.57);
        assert_eq!(rows[1].percent_change, 0.0, "zero start maps to 0%");
    }

    #[test]
    fn one_day_period_uses_previous_session() {
        let table = PriceTable::builder()
            .close(day(1), "AZN.L", Some(50.0))
            .close(day(2), "AZN.L", Some(100.0))
            .close(day(3), "AZN.L", Some(95.0))
            .build();

        let rows = compute_snapshot(&market(), Period::OneDay, &table);
        assert_eq!(rows[0].percent_change, -5.0);
    }

    #[test]
    fn one_day_single_row_is_flat() {
        let table = PriceTable::builder()
            .close(day(3), "AZN.L", Some(95.0))
            .close(day(3), "BP.L", Some(4.0))
            .build();

        let rows = compute_snapshot(&market(), Period::OneDay, &table);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.percent_change == 0.0));
    }
}
