//! Application configuration loaded from environment variables.

use std::time::Duration;

use fulfillment::DEFAULT_QUEUE_CAPACITY;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `PRODUCT_SERVICE_URL`: product service base URL (default: `"http://localhost:8081"`)
/// - `INVENTORY_TIMEOUT_SECS`: inventory call timeout (default: `5`)
/// - `STOCK_DELTA_QUEUE_CAPACITY`: stock-delta queue bound (default: `1024`)
/// - `DATABASE_URL`: PostgreSQL URL; orders are kept in memory when unset
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub product_service_url: String,
    pub inventory_timeout: Duration,
    pub stock_delta_queue_capacity: usize,
    pub database_url: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .map(|f| LogFormat::parse(&f))
                .unwrap_or(defaults.log_format),
            product_service_url: lookup("PRODUCT_SERVICE_URL")
                .unwrap_or(defaults.product_service_url),
            inventory_timeout: lookup("INVENTORY_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.inventory_timeout),
            stock_delta_queue_capacity: lookup("STOCK_DELTA_QUEUE_CAPACITY")
                .and_then(|s| s.parse().ok())
                .filter(|capacity: &usize| *capacity > 0)
                .unwrap_or(defaults.stock_delta_queue_capacity),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            product_service_url: "http://localhost:8081".to_string(),
            inventory_timeout: Duration::from_secs(5),
            stock_delta_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            database_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.product_service_url, "http://localhost:8081");
        assert_eq!(config.inventory_timeout, Duration::from_secs(5));
        assert_eq!(config.stock_delta_queue_capacity, 1024);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Default::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_addr_default() {
        let config = Config::default();
        assert_eq!(config.addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "9000"),
            ("LOG_FORMAT", "JSON"),
            ("PRODUCT_SERVICE_URL", "http://products:8081"),
            ("INVENTORY_TIMEOUT_SECS", "2"),
            ("STOCK_DELTA_QUEUE_CAPACITY", "16"),
            ("DATABASE_URL", "postgres://localhost/orders"),
        ]);
        assert_eq!(config.port, 9000);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.product_service_url, "http://products:8081");
        assert_eq!(config.inventory_timeout, Duration::from_secs(2));
        assert_eq!(config.stock_delta_queue_capacity, 16);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/orders")
        );
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("PORT", "not-a-port"),
            ("INVENTORY_TIMEOUT_SECS", "soon"),
            ("STOCK_DELTA_QUEUE_CAPACITY", "0"),
            ("DATABASE_URL", ""),
        ]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.inventory_timeout, Duration::from_secs(5));
        assert_eq!(config.stock_delta_queue_capacity, 1024);
        assert!(config.database_url.is_none());
    }
}
