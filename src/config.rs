//! Centralized configuration management for campaign-dash

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Largest page the service accepts (`limit <= 100`)
pub const MAX_PAGE_SIZE: usize = 100;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the campaign analytics API
    pub api_base_url: String,
    /// File holding the persisted session token
    pub token_path: PathBuf,
    /// Directory for exported campaign reports
    pub export_dir: PathBuf,
    /// Campaign list configuration
    pub listing: ListingConfig,
    /// HTTP client configuration
    pub http: HttpConfig,
}

/// Campaign list configuration
#[derive(Debug, Clone)]
pub struct ListingConfig {
    /// Campaigns per page
    pub page_size: usize,
    /// How long the create screen shows its success banner before returning
    /// to the list (milliseconds)
    pub redirect_delay_ms: u64,
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: 5,
            redirect_delay_ms: 2000,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 5,
            user_agent: "campaign-dash/0.1.0".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables and defaults
    pub fn from_env() -> Result<Self> {
        let api_base_url = std::env::var("CAMPAIGN_DASH_API_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8000".to_string());

        let token_path = std::env::var("CAMPAIGN_DASH_TOKEN_PATH")
            .unwrap_or_else(|_| "./.campaign_dash_token".to_string())
            .into();

        let export_dir = std::env::var("CAMPAIGN_DASH_EXPORT_DIR")
            .unwrap_or_else(|_| "./reports".to_string())
            .into();

        let listing = ListingConfig {
            page_size: parse_env_var("CAMPAIGN_DASH_PAGE_SIZE")?.unwrap_or(5),
            redirect_delay_ms: parse_env_var("CAMPAIGN_DASH_REDIRECT_DELAY_MS")?.unwrap_or(2000),
        };

        let http = HttpConfig {
            timeout_seconds: parse_env_var("CAMPAIGN_DASH_HTTP_TIMEOUT_SECONDS")?.unwrap_or(5),
            user_agent: std::env::var("CAMPAIGN_DASH_USER_AGENT")
                .unwrap_or_else(|_| "campaign-dash/0.1.0".to_string()),
        };

        Ok(Config {
            api_base_url,
            token_path,
            export_dir,
            listing,
            http,
        })
    }

    /// Replace the API URL, e.g. from a command line flag
    pub fn with_api_url(mut self, api_url: Option<&str>) -> Self {
        if let Some(url) = api_url {
            self.api_base_url = url.to_string();
        }
        self
    }

    /// Get HTTP timeout as Duration
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }

    /// Get post-create redirect delay as Duration
    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.listing.redirect_delay_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        reqwest::Url::parse(&self.api_base_url)
            .with_context(|| format!("Invalid API URL: {}", self.api_base_url))?;

        if self.listing.page_size == 0 || self.listing.page_size > MAX_PAGE_SIZE {
            return Err(anyhow::anyhow!(
                "Page size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE,
                self.listing.page_size
            ));
        }

        if self.http.timeout_seconds == 0 {
            return Err(anyhow::anyhow!("HTTP timeout must be at least one second"));
        }

        // The token file is created on first login; its directory must exist
        if let Some(parent) = self.token_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(anyhow::anyhow!(
                    "Token directory does not exist: {}",
                    parent.display()
                ));
            }
        }

        Ok(())
    }
}

/// Helper function to parse environment variable as a specific type
fn parse_env_var<T>(var_name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display + Send + Sync + std::error::Error + 'static,
{
    match std::env::var(var_name) {
        Ok(val) => val.parse().map(Some).with_context(|| {
            format!("Failed to parse environment variable {} = '{}'", var_name, val)
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::from_env().unwrap();
        assert_eq!(config.api_base_url, "http://127.0.0.1:8000");
        assert_eq!(config.export_dir, PathBuf::from("./reports"));
        assert_eq!(config.listing.page_size, 5);
        assert_eq!(config.http.timeout_seconds, 5);
        assert_eq!(config.redirect_delay(), Duration::from_secs(2));
    }

    #[test]
    fn test_config_validation() {
        let config = Config::from_env().unwrap();
        // Should not fail for default paths
        config.validate().unwrap();
    }

    #[test]
    fn test_page_size_bounds() {
        let mut config = Config::from_env().unwrap();
        config.listing.page_size = 0;
        assert!(config.validate().is_err());
        config.listing.page_size = MAX_PAGE_SIZE + 1;
        assert!(config.validate().is_err());
        config.listing.page_size = MAX_PAGE_SIZE;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_api_url_override() {
        let config = Config::from_env()
            .unwrap()
            .with_api_url(Some("not a url"));
        assert_eq!(config.api_base_url, "not a url");
        assert!(config.validate().is_err());

        let unchanged = Config::from_env().unwrap().with_api_url(None);
        assert_eq!(unchanged.api_base_url, "http://127.0.0.1:8000");
    }
}
