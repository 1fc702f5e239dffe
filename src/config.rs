use std::time::Duration;

use anyhow::{Context, Result};

use crate::constants::{
    CACHE_TTL_SECS, PROVIDER_BASE_URL, PROVIDER_TIMEOUT_SECS, PROVIDER_USER_AGENT,
};

#[derive(Clone, Debug, PartialEq)]
pub struct DashboardConfig {
    pub provider_url: String,
    pub user_agent: String,
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            provider_url: PROVIDER_BASE_URL.to_string(),
            user_agent: PROVIDER_USER_AGENT.to_string(),
            cache_ttl: Duration::from_secs(CACHE_TTL_SECS),
            request_timeout: Duration::from_secs(PROVIDER_TIMEOUT_SECS),
        }
    }
}

impl DashboardConfig {
    /// Defaults overridden by `HEATMAP_*` variables, reading `.env` first.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("HEATMAP_PROVIDER_URL") {
            config.provider_url = url.trim_end_matches('/').to_string();
        }
        if let Some(agent) = lookup("HEATMAP_USER_AGENT") {
            config.user_agent = agent;
        }
        if let Some(raw) = lookup("HEATMAP_CACHE_TTL_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("HEATMAP_CACHE_TTL_SECS must be whole seconds, got {raw:?}"))?;
            config.cache_ttl = Duration::from_secs(secs);
        }
        if let Some(raw) = lookup("HEATMAP_TIMEOUT_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("HEATMAP_TIMEOUT_SECS must be whole seconds, got {raw:?}"))?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}
