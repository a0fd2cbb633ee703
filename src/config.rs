use std::env;
use std::time::Duration;

/// Refresh cadence configuration.
///
/// Quotes and exposure are re-fetched on a short interval while the market is
/// open; margins change rarely and are cached for a longer interval.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Quote/exposure poll interval while the market is open.
    pub quote_interval: Duration,
    /// Market status re-check interval.
    pub market_status_interval: Duration,
    /// Margin cache TTL.
    pub margin_ttl: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            quote_interval: Duration::from_secs(10),
            market_status_interval: Duration::from_secs(60),
            margin_ttl: Duration::from_secs(300),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Trade store base URL (position listing, mutations, sync, market status).
    pub trade_store_url: String,
    /// Quote service base URL (live LTP lookups).
    pub quote_service_url: String,
    /// Margin/exposure service base URL.
    pub margin_service_url: String,
    /// Position listing page size requested from the trade store.
    pub page_size: u32,
    /// Refresh cadence.
    pub refresh: RefreshConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3002);

        let trade_store_url = env::var("TRADE_STORE_URL")
            .unwrap_or_else(|_| "http://localhost:8000/api/v1".to_string());
        // Quote and margin services default to the same backend as the store.
        let quote_service_url =
            env::var("QUOTE_SERVICE_URL").unwrap_or_else(|_| trade_store_url.clone());
        let margin_service_url =
            env::var("MARGIN_SERVICE_URL").unwrap_or_else(|_| trade_store_url.clone());

        Self {
            host,
            port,
            trade_store_url,
            quote_service_url,
            margin_service_url,
            page_size: env::var("PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(50),
            refresh: RefreshConfig {
                quote_interval: Duration::from_secs(
                    env::var("QUOTE_INTERVAL_SECS")
                        .ok()
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(10),
                ),
                market_status_interval: Duration::from_secs(
                    env::var("MARKET_STATUS_INTERVAL_SECS")
                        .ok()
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(60),
                ),
                margin_ttl: Duration::from_secs(
                    env::var("MARGIN_TTL_SECS")
                        .ok()
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(300),
                ),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_config_defaults() {
        let refresh = RefreshConfig::default();
        assert_eq!(refresh.quote_interval, Duration::from_secs(10));
        assert_eq!(refresh.margin_ttl, Duration::from_secs(300));
        assert!(refresh.margin_ttl > refresh.quote_interval);
    }

    #[test]
    fn test_config_construction() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 9000,
            trade_store_url: "http://store.test/api/v1".to_string(),
            quote_service_url: "http://quotes.test".to_string(),
            margin_service_url: "http://margins.test".to_string(),
            page_size: 25,
            refresh: RefreshConfig::default(),
        };

        assert_eq!(config.port, 9000);
        assert_eq!(config.page_size, 25);
        assert!(config.trade_store_url.starts_with("http://"));
    }

    #[test]
    fn test_config_clone() {
        let config = Config {
            host: "test".to_string(),
            port: 1234,
            trade_store_url: "http://test".to_string(),
            quote_service_url: "http://test".to_string(),
            margin_service_url: "http://test".to_string(),
            page_size: 10,
            refresh: RefreshConfig::default(),
        };

        let cloned = config.clone();
        assert_eq!(cloned.host, config.host);
        assert_eq!(cloned.port, config.port);
    }
}
