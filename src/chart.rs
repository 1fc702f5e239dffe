use anyhow::Result;
use clap::Args;
use textplots::{Chart, Plot, Shape};

use crate::provider::PriceSource;
use crate::snapshot::{InstrumentSnapshot, MarketSnapshotBuilder};

#[derive(Debug, Args, Clone)]
pub struct ChartArgs {
    /// Market identifier from the roster (e.g. BIST, FTSE)
    #[arg(short, long, default_value = "BIST")]
    pub market: String,

    /// Period label: 1 Day, 5 Days, 1 Month, 3 Months, 6 Months, 1 Year, YTD
    #[arg(short, long, default_value = "1 Day")]
    pub period: String,

    /// Chart width in characters
    #[arg(long, default_value_t = 120)]
    pub width: u32,

    /// Chart height in characters
    #[arg(long, default_value_t = 30)]
    pub height: u32,
}

pub async fn run<S: PriceSource>(builder: &MarketSnapshotBuilder<S>, args: ChartArgs) -> Result<()> {
    let snapshot = builder.build_snapshot(&args.market, &args.period).await?;

    if let Some(failure) = &snapshot.failure {
        println!("{} · {}  {failure}", snapshot.market, snapshot.period);
        return Ok(());
    }

    println!(
        "Percent change by instrument for {} over {} ({} instruments)",
        snapshot.market,
        snapshot.period,
        snapshot.instruments.len()
    );
    render_chart(&snapshot.instruments, args.width, args.height);
    print!("{}", legend(&snapshot.instruments));
    Ok(())
}

/// One bar per instrument, ordered by change, x = position in that order.
pub fn bar_points(instruments: &[InstrumentSnapshot]) -> Vec<(f32, f32)> {
    let mut changes: Vec<f64> = instruments.iter().map(|i| i.percent_change).collect();
    changes.sort_by(|a, b| a.total_cmp(b));
    changes
        .into_iter()
        .enumerate()
        .map(|(idx, change)| (idx as f32, change as f32))
        .collect()
}

fn legend(instruments: &[InstrumentSnapshot]) -> String {
    let mut ordered: Vec<&InstrumentSnapshot> = instruments.iter().collect();
    ordered.sort_by(|a, b| a.percent_change.total_cmp(&b.percent_change));
    ordered
        .iter()
        .enumerate()
        .map(|(idx, instrument)| {
            format!("{idx:>3} {:<8} {:>8}\n", instrument.symbol, instrument.change_label)
        })
        .collect()
}

fn render_chart(instruments: &[InstrumentSnapshot], width: u32, height: u32) {
    let samples = bar_points(instruments);
    let max_x = samples.len().max(2) as f32;

    let min_change = samples.iter().map(|(_, c)| *c).fold(f32::INFINITY, f32::min);
    let max_change = samples.iter().map(|(_, c)| *c).fold(f32::NEG_INFINITY, f32::max);
    println!("Change range: {:.2}% → {:.2}%", min_change, max_change);

    let plot_width = width.max(40);
    let plot_height = height.max(10);

    Chart::new(plot_width, plot_height, -0.5, max_x - 0.5)
        .lineplot(&Shape::Bars(&samples))
        .display();
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::change_label;

    fn instrument(symbol: &str, percent_change: f64) -> InstrumentSnapshot {
        InstrumentSnapshot {
            symbol: symbol.into(),
            display_name: symbol.into(),
            sector: "Energy".into(),
            weight: 1.0,
            current_price: 1.0,
            percent_change,
            change_label: change_label(percent_change),
        }
    }

    #[test]
    fn bars_are_sorted_by_change() {
        let points = bar_points(&[instrument("BP", 2.5), instrument("SHEL", -1.0)]);
        assert_eq!(points, vec![(0.0, -1.0), (1.0, 2.5)]);
    }

    #[test]
    fn legend_follows_bar_order() {
        let text = legend(&[instrument("BP", 2.5), instrument("SHEL", -1.0)]);
        let first = text.lines().next().expect("legend line");
        assert!(first.contains("SHEL"));
        assert!(first.contains("-1.00%"));
    }
}
