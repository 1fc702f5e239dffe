use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::config::DashboardConfig;
use crate::constants::PRICE_INTERVAL;
use crate::error::RetrievalError;
use crate::logging;
use crate::period::RetrievalWindow;

use super::{PriceSource, PriceTable};

/// Yahoo Finance `spark` endpoint: daily closes for many symbols per request.
#[derive(Clone, Debug)]
pub struct YahooProvider {
    client: Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new(config: &DashboardConfig) -> Result<Self> {
        let client = reqwest::ClientBuilder::new()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.provider_url.clone(),
        })
    }

    fn spark_url(&self) -> String {
        format!("{}/v7/finance/spark", self.base_url)
    }
}

impl PriceSource for YahooProvider {
    async fn fetch_closes(
        &self,
        symbols: &[String],
        window: RetrievalWindow,
    ) -> Result<PriceTable, RetrievalError> {
        let joined = symbols.join(",");
        logging::info(
            "provider.request",
            "Requesting batched closes",
            json!({ "symbols": symbols.len(), "range": window.range }),
        );

        let response = self
            .client
            .get(self.spark_url())
            .query(&[
                ("symbols", joined.as_str()),
                ("range", window.range),
                ("interval", PRICE_INTERVAL),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::Status(status.as_u16()));
        }

        let envelope: SparkEnvelope = response.json().await?;
        table_from_spark(envelope)
    }
}

#[derive(Debug, Deserialize)]
struct SparkEnvelope {
    spark: Spark,
}

#[derive(Debug, Deserialize)]
struct Spark {
    #[serde(default)]
    result: Option<Vec<SparkResult>>,
    #[serde(default)]
    error: Option<SparkError>,
}

#[derive(Debug, Deserialize)]
struct SparkError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct SparkResult {
    symbol: String,
    #[serde(default)]
    response: Vec<SparkSeries>,
}

#[derive(Debug, Deserialize)]
struct SparkSeries {
    #[serde(default)]
    meta: Option<SparkMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
struct SparkMeta {
    /// Exchange offset from UTC, applied before taking the calendar date
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

fn trading_date(timestamp: i64, gmtoffset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp.saturating_add(gmtoffset), 0).map(|dt| dt.date_naive())
}

fn table_from_spark(envelope: SparkEnvelope) -> Result<PriceTable, RetrievalError> {
    let results = match (envelope.spark.result, envelope.spark.error) {
        (Some(results), _) => results,
        (None, Some(err)) => {
            return Err(RetrievalError::Provider(format!(
                "{}: {}",
                err.code, err.description
            )))
        }
        (None, None) => Vec::new(),
    };

    let mut builder = PriceTable::builder();
    for result in results {
        let Some(series) = result.response.first() else {
            logging::warn(
                "provider.missing_series",
                "Symbol returned no series",
                json!({ "symbol": result.symbol }),
            );
            continue;
        };

        let offset = series.meta.as_ref().map(|meta| meta.gmtoffset).unwrap_or(0);
        let closes = series
            .indicators
            .as_ref()
            .and_then(|indicators| indicators.quote.first())
            .map(|quote| quote.close.as_slice())
            .unwrap_or(&[]);

        if closes.len() != series.timestamp.len() {
            logging::warn(
                "provider.length_mismatch",
                "Timestamp and close arrays differ in length; extra points ignored",
                json!({
                    "symbol": result.symbol,
                    "timestamps": series.timestamp.len(),
                    "closes": closes.len(),
                }),
            );
        }

        for (timestamp, close) in series.timestamp.iter().zip(closes.iter()) {
            if let Some(date) = trading_date(*timestamp, offset) {
                builder.push(date, &result.symbol, *close);
            }
        }
    }

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(raw: &str) -> Result<PriceTable, RetrievalError> {
        let envelope: SparkEnvelope = serde_json::from_str(raw).expect("fixture decodes");
        table_from_spark(envelope)
    }

    #[test]
    fn joins_symbols_on_trading_date() {
        // 2024-03-04 and 2024-03-05 at 07:00 UTC, exchange at UTC+3
        let raw = r#"{
            "spark": {
                "result": [
                    {
                        "symbol": "THYAO.IS",
                        "response": [{
                            "meta": { "gmtoffset": 10800 },
                            "timestamp": [1709535600, 1709622000],
                            "indicators": { "quote": [{ "close": [280.5, 290.0] }] }
                        }]
                    },
                    {
                        "symbol": "ASELS.IS",
                        "response": [{
                            "meta": { "gmtoffset": 10800 },
                            "timestamp": [1709622000],
                            "indicators": { "quote": [{ "close": [null] }] }
                        }]
                    }
                ],
                "error": null
            }
        }"#;

        let table = decode(raw).expect("table");
        assert_eq!(table.len(), 2);
        let last = table.last().expect("last row");
        assert_eq!(last.date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(last.close("THYAO.IS"), Some(290.0));
        assert_eq!(last.close("ASELS.IS"), None);
        assert_eq!(table.first().and_then(|row| row.close("THYAO.IS")), Some(280.5));
    }

    #[test]
    fn trailing_null_close_does_not_become_the_last_row() {
        // 2024-03-04, 2024-03-05 and a null-only 2024-03-06 for AZN.L
        let raw = r#"{
            "spark": {
                "result": [
                    {
                        "symbol": "AZN.L",
                        "response": [{
                            "timestamp": [1709546400, 1709632800, 1709719200],
                            "indicators": { "quote": [{ "close": [100.0, 104.0, null] }] }
                        }]
                    },
                    {
                        "symbol": "BP.L",
                        "response": [{
                            "timestamp": [1709546400, 1709632800],
                            "indicators": { "quote": [{ "close": [50.0, 49.0] }] }
                        }]
                    }
                ]
            }
        }"#;

        let table = decode(raw).expect("table");
        assert_eq!(table.len(), 2);
        let last = table.last().expect("last row");
        assert_eq!(last.date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(last.close("AZN.L"), Some(104.0));
        assert_eq!(last.close("BP.L"), Some(49.0));
    }

    #[test]
    fn provider_error_object_is_a_retrieval_error() {
        let raw = r#"{ "spark": { "result": null, "error": { "code": "Bad Request", "description": "Missing symbols" } } }"#;
        assert_eq!(
            decode(raw),
            Err(RetrievalError::Provider("Bad Request: Missing symbols".into()))
        );
    }

    #[test]
    fn symbol_without_series_is_skipped() {
        let raw = r#"{ "spark": { "result": [ { "symbol": "GONE.L", "response": [] } ] } }"#;
        assert!(decode(raw).expect("table").is_empty());
    }
}
