pub mod cache;
pub mod chart;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod heatmap;
pub mod logging;
pub mod model;
pub mod period;
pub mod provider;
pub mod snapshot;
pub mod thesis;
