//! Application configuration loaded from environment variables.

use std::time::Duration;

use saga::{BackendAddresses, CheckoutConfig, ConnectorConfig};
use thiserror::Error;

/// Errors raised while reading the configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),

    #[error("environment variable {name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Server configuration.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default `"0.0.0.0"`)
/// - `PORT`: listen port (default `5050`)
/// - `RUST_LOG`: tracing filter directive (default `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default `text`)
/// - `CART_SERVICE_ADDR`, `PRODUCT_CATALOG_SERVICE_ADDR`, `CURRENCY_SERVICE_ADDR`,
///   `SHIPPING_SERVICE_ADDR`, `PAYMENT_SERVICE_ADDR`, `EMAIL_SERVICE_ADDR`: required
/// - `CHECKOUT_DEADLINE_MS`, `CHECKOUT_PRICING_CONCURRENCY`,
///   `CHECKOUT_EXTRA_LATENCY_MS`, `BACKEND_TIMEOUT_MS`: optional
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub backends: BackendAddresses,
    pub checkout: CheckoutConfig,
    pub backend_timeout: Duration,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| var(name).ok_or(ConfigError::Missing(name));

        let port = match var("PORT") {
            Some(p) => parse("PORT", &p)?,
            None => 5050,
        };
        let log_format = match var("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "LOG_FORMAT",
                    reason: format!("expected text or json, got {other:?}"),
                });
            }
        };

        let backends = BackendAddresses {
            cart: required("CART_SERVICE_ADDR")?,
            catalog: required("PRODUCT_CATALOG_SERVICE_ADDR")?,
            currency: required("CURRENCY_SERVICE_ADDR")?,
            shipping: required("SHIPPING_SERVICE_ADDR")?,
            payment: required("PAYMENT_SERVICE_ADDR")?,
            notification: required("EMAIL_SERVICE_ADDR")?,
        };

        let mut checkout = CheckoutConfig::default();
        if let Some(ms) = var("CHECKOUT_DEADLINE_MS") {
            let ms = parse("CHECKOUT_DEADLINE_MS", &ms)?;
            checkout = checkout.with_deadline(Duration::from_millis(ms));
        }
        if let Some(n) = var("CHECKOUT_PRICING_CONCURRENCY") {
            let n = parse("CHECKOUT_PRICING_CONCURRENCY", &n)?;
            checkout = checkout.with_pricing_concurrency(n);
        }
        if let Some(ms) = var("CHECKOUT_EXTRA_LATENCY_MS") {
            let ms = parse("CHECKOUT_EXTRA_LATENCY_MS", &ms)?;
            checkout = checkout.with_extra_latency(Duration::from_millis(ms));
        }

        let backend_timeout = match var("BACKEND_TIMEOUT_MS") {
            Some(ms) => Duration::from_millis(parse("BACKEND_TIMEOUT_MS", &ms)?),
            None => ConnectorConfig::default().request_timeout,
        };

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            log_level: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            log_format,
            backends,
            checkout,
            backend_timeout,
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Transport settings for the backend connector pool.
    pub fn connector_config(&self) -> ConnectorConfig {
        ConnectorConfig::default().with_request_timeout(self.backend_timeout)
    }
}

fn parse<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serial_test::serial;

    use super::*;

    const BACKEND_VARS: [(&str, &str); 6] = [
        ("CART_SERVICE_ADDR", "cart:7070"),
        ("PRODUCT_CATALOG_SERVICE_ADDR", "catalog:3550"),
        ("CURRENCY_SERVICE_ADDR", "currency:7000"),
        ("SHIPPING_SERVICE_ADDR", "shipping:50051"),
        ("PAYMENT_SERVICE_ADDR", "payment:50051"),
        ("EMAIL_SERVICE_ADDR", "email:5000"),
    ];

    fn load(extra: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = BACKEND_VARS
            .iter()
            .chain(extra)
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = load(&[]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 5050);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.backends.cart, "cart:7070");
        assert_eq!(config.backends.notification, "email:5000");
        assert_eq!(config.checkout.deadline, None);
        assert_eq!(config.checkout.pricing_concurrency, 1);
        assert_eq!(config.backend_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_addr_formatting() {
        let config = load(&[("HOST", "127.0.0.1"), ("PORT", "8080")]).unwrap();
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_missing_backend_address() {
        let vars: HashMap<&str, &str> = BACKEND_VARS
            .into_iter()
            .filter(|(k, _)| *k != "PAYMENT_SERVICE_ADDR")
            .collect();
        let err = Config::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap_err();
        assert_eq!(err, ConfigError::Missing("PAYMENT_SERVICE_ADDR"));
    }

    #[test]
    fn test_blank_backend_address_counts_as_missing() {
        let err = load(&[("CART_SERVICE_ADDR", "  ")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("CART_SERVICE_ADDR"));
    }

    #[test]
    fn test_checkout_tuning() {
        let config = load(&[
            ("CHECKOUT_DEADLINE_MS", "1500"),
            ("CHECKOUT_PRICING_CONCURRENCY", "4"),
            ("CHECKOUT_EXTRA_LATENCY_MS", "20"),
            ("BACKEND_TIMEOUT_MS", "250"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();
        assert_eq!(config.checkout.deadline, Some(Duration::from_millis(1500)));
        assert_eq!(config.checkout.pricing_concurrency, 4);
        assert_eq!(config.checkout.extra_latency, Some(Duration::from_millis(20)));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(
            config.connector_config().request_timeout,
            Duration::from_millis(250)
        );
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("PORT", "http")]),
            Err(ConfigError::Invalid { name: "PORT", .. })
        ));
        assert!(matches!(
            load(&[("CHECKOUT_DEADLINE_MS", "-1")]),
            Err(ConfigError::Invalid {
                name: "CHECKOUT_DEADLINE_MS",
                ..
            })
        ));
        assert!(matches!(
            load(&[("LOG_FORMAT", "yaml")]),
            Err(ConfigError::Invalid {
                name: "LOG_FORMAT",
                ..
            })
        ));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        // SAFETY: serialized with every other test that touches the environment.
        unsafe {
            for (name, value) in BACKEND_VARS {
                std::env::set_var(name, value);
            }
            std::env::set_var("PORT", "6060");
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config.port, 6060);
        assert_eq!(config.backends.shipping, "shipping:50051");

        unsafe {
            std::env::remove_var("PORT");
            std::env::remove_var("EMAIL_SERVICE_ADDR");
        }
        assert_eq!(
            Config::from_env().unwrap_err(),
            ConfigError::Missing("EMAIL_SERVICE_ADDR")
        );

        unsafe {
            for (name, _) in BACKEND_VARS {
                std::env::remove_var(name);
            }
        }
    }
}
