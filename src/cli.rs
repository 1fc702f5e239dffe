use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::chart::ChartArgs;
use crate::heatmap::HeatmapArgs;
use crate::model::MarketRoster;
use crate::thesis::ThesisArgs;

#[derive(Debug, Parser)]
#[command(author, version, about = "Market heatmap and investment thesis dashboard")]
pub struct Cli {
    /// JSON roster file replacing the built-in BIST/FTSE lists
    #[arg(long, global = true)]
    roster: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn roster(&self) -> Result<MarketRoster> {
        match &self.roster {
            Some(path) => MarketRoster::load(path),
            None => Ok(MarketRoster::default()),
        }
    }

    pub fn command(self) -> Command {
        self.command.unwrap_or_default()
    }
}

#[derive(Debug, Subcommand, Default)]
pub enum Command {
    /// List the markets in the roster
    #[default]
    Markets,
    /// Show a sector heatmap of percent changes for one market
    Heatmap(HeatmapArgs),
    /// Render a bar chart of percent changes for one market
    Chart(ChartArgs),
    /// Render an investment thesis card
    Thesis(ThesisArgs),
}
