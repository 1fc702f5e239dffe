pub const PROVIDER_BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const PROVIDER_USER_AGENT: &str = "Mozilla/5.0 (compatible; market-heatmap/0.1)";
pub const PROVIDER_TIMEOUT_SECS: u64 = 15;
pub const CACHE_TTL_SECS: u64 = 300;
pub const PRICE_INTERVAL: &str = "1d";
/// Symbols per spark request; each market is fetched in one request, so this
/// also caps roster size.
pub const MAX_SYMBOLS_PER_REQUEST: usize = 20;
