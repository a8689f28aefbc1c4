//! Application configuration loaded from environment variables.

use checkout::GatewayConfig;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `GATEWAY_PAY_URL` — hosted payment page
/// - `GATEWAY_VERIFY_URL` — server-to-server verification endpoint
/// - `GATEWAY_MERCHANT_CODE` — merchant code issued by the gateway
/// - `PAYMENT_SUCCESS_URL` / `PAYMENT_FAILURE_URL` — customer callbacks
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub gateway: GatewayConfig,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = GatewayConfig::default();
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            gateway: GatewayConfig {
                pay_url: std::env::var("GATEWAY_PAY_URL").unwrap_or(defaults.pay_url),
                verify_url: std::env::var("GATEWAY_VERIFY_URL").unwrap_or(defaults.verify_url),
                merchant_code: std::env::var("GATEWAY_MERCHANT_CODE")
                    .unwrap_or(defaults.merchant_code),
                success_url: std::env::var("PAYMENT_SUCCESS_URL").unwrap_or(defaults.success_url),
                failure_url: std::env::var("PAYMENT_FAILURE_URL").unwrap_or(defaults.failure_url),
            },
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
            gateway: GatewayConfig::default(),
        }
    }
}
