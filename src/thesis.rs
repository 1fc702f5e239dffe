//! Investment thesis card. A static form: every input is echoed back next to
//! fixed header metrics. Nothing is fetched, computed, or saved.

use std::fmt::{self, Write as _};

use anyhow::{bail, Result};
use clap::{Args, ValueEnum};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
pub enum Horizon {
    Short,
    Medium,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
pub enum InflationTrend {
    Rising,
    Falling,
    Sticky,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
pub enum RatesOutlook {
    Tightening,
    Neutral,
    Easing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
pub enum Commodity {
    Oil,
    Gas,
    Copper,
    Agriculture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
pub enum Decision {
    Accumulate,
    Watch,
    Avoid,
}

macro_rules! display_as_debug {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Debug::fmt(self, f)
            }
        })*
    };
}

display_as_debug!(Horizon, InflationTrend, RatesOutlook, Commodity, Decision);

#[derive(Debug, Args, Clone)]
pub struct ThesisArgs {
    /// Ticker the thesis is about (e.g. AAPL)
    #[arg(short, long)]
    pub ticker: String,

    #[arg(long, value_enum, default_value_t = Horizon::Short)]
    pub horizon: Horizon,

    #[arg(long, value_enum, default_value_t = InflationTrend::Rising)]
    pub inflation: InflationTrend,

    #[arg(long, value_enum, default_value_t = RatesOutlook::Tightening)]
    pub rates: RatesOutlook,

    /// What really matters on the macro side
    #[arg(long, default_value = "")]
    pub macro_insight: String,

    /// Key commodity inputs; repeat for several
    #[arg(long = "commodity", value_enum)]
    pub commodities: Vec<Commodity>,

    /// Supply chain pressure, 1 (low) to 5 (high)
    #[arg(long, default_value_t = 3)]
    pub supply_pressure: u8,

    #[arg(long, default_value = "")]
    pub bottlenecks: String,

    #[arg(long, default_value = "")]
    pub risks: String,

    #[arg(long, value_enum, default_value_t = Decision::Accumulate)]
    pub decision: Decision,

    /// Confidence level, 1 to 5
    #[arg(long, default_value_t = 3)]
    pub confidence: u8,

    /// Final thesis summary
    #[arg(long, default_value = "")]
    pub summary: String,

    /// Print the card as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub title: &'static str,
    pub value: &'static str,
}

/// Header values shown for every ticker.
pub const HEADER_METRICS: [Metric; 4] = [
    Metric { title: "Sector", value: "Technology" },
    Metric { title: "Macro Regime", value: "Late Cycle" },
    Metric { title: "Commodity Exposure", value: "Energy" },
    Metric { title: "Supply Chain Stress", value: "Medium" },
];

#[derive(Debug, Clone, Serialize)]
pub struct ThesisCard {
    pub ticker: String,
    pub horizon: Horizon,
    pub header: Vec<Metric>,
    pub inflation: InflationTrend,
    pub rates: RatesOutlook,
    pub macro_insight: String,
    pub commodities: Vec<Commodity>,
    pub supply_pressure: u8,
    pub bottlenecks: String,
    pub gross_margin: String,
    pub debt_to_equity: String,
    pub risks: String,
    pub decision: Decision,
    pub confidence: u8,
    pub summary: String,
}

fn check_scale(name: &str, value: u8) -> Result<u8> {
    if !(1..=5).contains(&value) {
        bail!("{name} must be between 1 and 5, got {value}");
    }
    Ok(value)
}

impl ThesisCard {
    pub fn from_args(args: &ThesisArgs) -> Result<Self> {
        let ticker = args.ticker.trim().to_uppercase();
        if ticker.is_empty() {
            bail!("ticker must not be empty");
        }

        let mut commodities: Vec<Commodity> = Vec::with_capacity(args.commodities.len());
        for commodity in &args.commodities {
            if !commodities.contains(commodity) {
                commodities.push(*commodity);
            }
        }

        Ok(Self {
            ticker,
            horizon: args.horizon,
            header: HEADER_METRICS.to_vec(),
            inflation: args.inflation,
            rates: args.rates,
            macro_insight: args.macro_insight.trim().to_string(),
            commodities,
            supply_pressure: check_scale("supply pressure", args.supply_pressure)?,
            bottlenecks: args.bottlenecks.trim().to_string(),
            // No fundamentals source is wired in; these are the form's fallbacks.
            gross_margin: "0.0%".to_string(),
            debt_to_equity: "N/A".to_string(),
            risks: args.risks.trim().to_string(),
            decision: args.decision,
            confidence: check_scale("confidence", args.confidence)?,
            summary: args.summary.trim().to_string(),
        })
    }

    pub fn render(&self) -> String {
        let or_dash = |text: &str| if text.is_empty() { "—".to_string() } else { text.to_string() };
        let commodities = if self.commodities.is_empty() {
            "—".to_string()
        } else {
            self.commodities
                .iter()
                .map(Commodity::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut out = String::new();
        let _ = writeln!(out, "ThesisOS · Investment Thesis Builder");
        let _ = writeln!(out, "{} ({} horizon)\n", self.ticker, self.horizon);
        for metric in &self.header {
            let _ = writeln!(out, "  {:<22} {}", metric.title, metric.value);
        }

        let _ = writeln!(out, "\n[Macro]");
        let _ = writeln!(out, "  Inflation trend      {}", self.inflation);
        let _ = writeln!(out, "  Rates outlook        {}", self.rates);
        let _ = writeln!(out, "  Key insight          {}", or_dash(&self.macro_insight));
        let _ = writeln!(out, "\n[Commodities]\n  Key inputs           {commodities}");
        let _ = writeln!(out, "\n[Supply Chain]");
        let _ = writeln!(out, "  Pressure             {}/5", self.supply_pressure);
        let _ = writeln!(out, "  Bottlenecks          {}", or_dash(&self.bottlenecks));
        let _ = writeln!(out, "\n[Financials]");
        let _ = writeln!(out, "  Gross margin         {}", self.gross_margin);
        let _ = writeln!(out, "  Debt / equity        {}", self.debt_to_equity);
        let _ = writeln!(out, "\n[Risks]\n  {}", or_dash(&self.risks));
        let _ = writeln!(out, "\n[Decision]");
        let _ = writeln!(out, "  Final decision       {}", self.decision);
        let _ = writeln!(out, "  Confidence           {}/5", self.confidence);
        let _ = writeln!(out, "  Summary              {}", or_dash(&self.summary));
        out
    }
}

pub fn run(args: ThesisArgs) -> Result<()> {
    let card = ThesisCard::from_args(&args)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&card)?);
    } else {
        print!("{}", card.render());
    }
    Ok(())
}
