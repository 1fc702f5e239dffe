use anyhow::Result;
use clap::Parser;
use market_heatmap::cli::{Cli, Command};
use market_heatmap::config::DashboardConfig;
use market_heatmap::model::MarketRoster;
use market_heatmap::provider::YahooProvider;
use market_heatmap::snapshot::MarketSnapshotBuilder;
use market_heatmap::{chart, heatmap, logging, thesis};

fn live_builder(roster: MarketRoster) -> Result<MarketSnapshotBuilder<YahooProvider>> {
    let config = DashboardConfig::from_env()?;
    let provider = YahooProvider::new(&config)?;
    Ok(MarketSnapshotBuilder::new(roster, provider, config.cache_ttl))
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_from_env();

    let cli = Cli::parse();
    let roster = cli.roster()?;
    match cli.command() {
        Command::Markets => {
            print!("{}", heatmap::list_markets(&roster));
            Ok(())
        }
        Command::Heatmap(args) => heatmap::run(&live_builder(roster)?, args).await,
        Command::Chart(args) => chart::run(&live_builder(roster)?, args).await,
        Command::Thesis(args) => thesis::run(args),
    }
}
