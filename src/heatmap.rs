use std::fmt::Write as _;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::model::MarketRoster;
use crate::period::Period;
use crate::provider::PriceSource;
use crate::snapshot::{change_label, round2, InstrumentSnapshot, MarketSnapshotBuilder, Snapshot};

const BAR_WIDTH: usize = 40;

#[derive(Debug, Args, Clone)]
pub struct HeatmapArgs {
    /// Market identifier from the roster (e.g. BIST, FTSE)
    #[arg(short, long, default_value = "BIST")]
    pub market: String,

    /// Period label: 1 Day, 5 Days, 1 Month, 3 Months, 6 Months, 1 Year, YTD
    #[arg(short, long, default_value = "1 Day")]
    pub period: String,

    /// Print the heatmap tree as JSON
    #[arg(long)]
    pub json: bool,

    /// Disable ANSI colors
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Gain,
    Loss,
    Flat,
}

impl Tone {
    pub fn of(percent: f64) -> Self {
        if percent > 0.0 {
            Tone::Gain
        } else if percent < 0.0 {
            Tone::Loss
        } else {
            Tone::Flat
        }
    }

    fn ansi(self) -> &'static str {
        match self {
            Tone::Gain => "\x1b[32m",
            Tone::Loss => "\x1b[31m",
            Tone::Flat => "\x1b[90m",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Tile {
    pub symbol: String,
    pub display_name: String,
    pub weight: f64,
    /// Fraction of the whole market's weight
    pub share: f64,
    pub current_price: f64,
    pub percent_change: f64,
    pub change_label: String,
    pub tone: Tone,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectorGroup {
    pub name: String,
    pub weight: f64,
    pub share: f64,
    /// Weight-averaged change of the sector's tiles
    pub percent_change: f64,
    pub change_label: String,
    pub tiles: Vec<Tile>,
}

/// Market → sector → instrument tree, sized by weight and toned by change.
#[derive(Debug, Clone, Serialize)]
pub struct Heatmap {
    pub market: String,
    pub period: Period,
    pub weight: f64,
    pub percent_change: f64,
    pub change_label: String,
    pub sectors: Vec<SectorGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

fn weighted_change<'a>(instruments: impl Iterator<Item = &'a InstrumentSnapshot>) -> (f64, f64) {
    let (weight, weighted) = instruments.fold((0.0, 0.0), |(w, acc), instrument| {
        (w + instrument.weight, acc + instrument.weight * instrument.percent_change)
    });
    if weight > 0.0 {
        (weight, round2(weighted / weight))
    } else {
        (0.0, 0.0)
    }
}

impl Heatmap {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let (total_weight, market_change) = weighted_change(snapshot.instruments.iter());

        let mut sector_order: Vec<&str> = Vec::new();
        for instrument in &snapshot.instruments {
            if !sector_order.contains(&instrument.sector.as_str()) {
                sector_order.push(&instrument.sector);
            }
        }

        let share_of = |weight: f64| {
            if total_weight > 0.0 {
                weight / total_weight
            } else {
                0.0
            }
        };

        let sectors = sector_order
            .into_iter()
            .map(|sector| {
                let members = || {
                    snapshot
                        .instruments
                        .iter()
                        .filter(move |instrument| instrument.sector == sector)
                };
                let (weight, percent_change) = weighted_change(members());

                let mut tiles: Vec<Tile> = members()
                    .map(|instrument| Tile {
                        symbol: instrument.symbol.clone(),
                        display_name: instrument.display_name.clone(),
                        weight: instrument.weight,
                        share: share_of(instrument.weight),
                        current_price: instrument.current_price,
                        percent_change: instrument.percent_change,
                        change_label: instrument.change_label.clone(),
                        tone: Tone::of(instrument.percent_change),
                    })
                    .collect();
                tiles.sort_by(|a, b| b.weight.total_cmp(&a.weight));

                SectorGroup {
                    name: sector.to_string(),
                    weight,
                    share: share_of(weight),
                    percent_change,
                    change_label: change_label(percent_change),
                    tiles,
                }
            })
            .collect();

        Heatmap {
            market: snapshot.market.clone(),
            period: snapshot.period,
            weight: total_weight,
            percent_change: market_change,
            change_label: change_label(market_change),
            sectors,
            failure: snapshot.failure.clone(),
        }
    }

    pub fn render(&self, color: bool) -> String {
        let paint = |tone: Tone, text: &str| {
            if color {
                format!("{}{text}\x1b[0m", tone.ansi())
            } else {
                text.to_string()
            }
        };

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} · {}  {}",
            self.market,
            self.period,
            paint(Tone::of(self.percent_change), &self.change_label)
        );

        if let Some(failure) = &self.failure {
            let _ = writeln!(out, "{failure}");
            return out;
        }
        if self.sectors.is_empty() {
            let _ = writeln!(out, "No data");
            return out;
        }

        for sector in &self.sectors {
            let _ = writeln!(
                out,
                "\n{:<24} {:>6.1}%  {}",
                sector.name,
                sector.share * 100.0,
                paint(Tone::of(sector.percent_change), &format!("{:>8}", sector.change_label))
            );
            for tile in &sector.tiles {
                let bar_len = ((tile.share * BAR_WIDTH as f64).round() as usize).max(1);
                let _ = writeln!(
                    out,
                    "  {:<8} {:<28} {:>10.2} {} {}",
                    tile.symbol,
                    tile.display_name,
                    tile.current_price,
                    paint(tile.tone, &format!("{:>8}", tile.change_label)),
                    paint(tile.tone, &"█".repeat(bar_len)),
                );
            }
        }
        out
    }
}

pub fn list_markets(roster: &MarketRoster) -> String {
    let mut out = String::new();
    for (id, market) in roster.iter() {
        let _ = writeln!(
            out,
            "{:<8} {:<28} {:>3} instruments",
            id,
            market.name,
            market.instruments.len()
        );
    }
    out
}

pub async fn run<S: PriceSource>(builder: &MarketSnapshotBuilder<S>, args: HeatmapArgs) -> Result<()> {
    let snapshot = builder.build_snapshot(&args.market, &args.period).await?;
    let heatmap = Heatmap::from_snapshot(&snapshot);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&heatmap)?);
    } else {
        print!("{}", heatmap.render(!args.no_color));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instrument(symbol: &str, sector: &str, weight: f64, percent_change: f64) -> InstrumentSnapshot {
        InstrumentSnapshot {
            symbol: symbol.to_string(),
            display_name: symbol.to_string(),
            sector: sector.to_string(),
            weight,
            current_price: 10.0,
            percent_change,
            change_label: change_label(percent_change),
        }
    }

    fn snapshot(instruments: Vec<InstrumentSnapshot>) -> Snapshot {
        Snapshot {
            market: "FTSE".into(),
            period: Period::OneMonth,
            instruments,
            failure: None,
        }
    }

    #[test]
    fn groups_by_sector_with_weighted_change() {
        let heatmap = Heatmap::from_snapshot(&snapshot(vec![
            instrument("AZN", "Healthcare", 3.0, 10.0),
            instrument("BP", "Energy", 1.0, -4.0),
            instrument("GSK", "Healthcare", 1.0, -2.0),
        ]));

        let names: Vec<_> = heatmap.sectors.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Healthcare", "Energy"]);

        let healthcare = &heatmap.sectors[0];
        assert_eq!(healthcare.weight, 4.0);
        assert_eq!(healthcare.percent_change, 7.0);
        assert_eq!(healthcare.share, 0.8);
        assert_eq!(healthcare.tiles[0].symbol, "AZN");
        assert_eq!(healthcare.tiles[1].tone, Tone::Loss);

        // (30 - 4 - 2) / 5
        assert_eq!(heatmap.percent_change, 4.8);
        assert_eq!(heatmap.change_label, "+4.80%");
    }

    #[test]
    fn failed_snapshot_renders_no_data_state() {
        let mut failed = snapshot(Vec::new());
        failed.failure = Some("No market data available: provider returned HTTP 503".into());

        let rendered = Heatmap::from_snapshot(&failed).render(false);
        assert!(rendered.contains("HTTP 503"));
        assert!(rendered.starts_with("FTSE · 1 Month  0.00%"));
    }

    #[test]
    fn plain_render_lists_tiles() {
        let rendered = Heatmap::from_snapshot(&snapshot(vec![instrument("AZN", "Healthcare", 1.0, 1.5)]))
            .render(false);
        assert!(rendered.contains("AZN"));
        assert!(rendered.contains("+1.50%"));
        assert!(!rendered.contains('\x1b'));
    }
}
