//! Client configuration

use std::path::PathBuf;
use std::time::Duration;

/// Client configuration
///
/// # Environment
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | MALL_API_URL | http://localhost:8000/api | API base URL |
/// | MALL_REQUEST_TIMEOUT_SECS | 30 | Transport timeout |
/// | MALL_CHAT_POLL_SECS | 3 | Support chat poll interval |
/// | MALL_DATA_DIR | ./mall-data | Durable state directory |
/// | MALL_PAYMENT_PROVIDER | wechat | Wallet provider for payment start |
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL (e.g., "https://shop.example.com/api")
    pub base_url: String,

    /// Request timeout in seconds (applied by the transport only)
    pub timeout: u64,

    /// Support chat poll interval in seconds
    pub poll_interval: u64,

    /// Directory holding tokens, chat cache, offline queue, pending confirm
    pub data_dir: PathBuf,

    /// Wallet provider passed to `POST /payments/{id}/start`
    pub payment_provider: String,

    /// Payment method passed to `POST /payments`
    pub payment_method: String,
}

impl ClientConfig {
    /// Create a configuration with defaults for everything but the URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: 30,
            poll_interval: 3,
            data_dir: PathBuf::from("./mall-data"),
            payment_provider: "wechat".to_string(),
            payment_method: "wechat".to_string(),
        }
    }

    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let mut config = Self::new(
            std::env::var("MALL_API_URL").unwrap_or_else(|_| "http://localhost:8000/api".into()),
        );
        if let Some(timeout) = std::env::var("MALL_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.timeout = timeout;
        }
        if let Some(poll) = std::env::var("MALL_CHAT_POLL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.poll_interval = poll;
        }
        if let Ok(dir) = std::env::var("MALL_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(provider) = std::env::var("MALL_PAYMENT_PROVIDER") {
            config.payment_method = provider.clone();
            config.payment_provider = provider;
        }
        config
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Set the chat poll interval
    pub fn with_poll_interval(mut self, seconds: u64) -> Self {
        self.poll_interval = seconds;
        self
    }

    /// Set the durable state directory
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Set wallet provider and payment method
    pub fn with_payment_provider(
        mut self,
        provider: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        self.payment_provider = provider.into();
        self.payment_method = method.into();
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Poll interval, never below one second
    pub fn chat_poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval.max(1))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:8000/api")
    }
}
