//! Client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MU_URL: &str = "https://mu.ao-testnet.xyz";
pub const DEFAULT_CU_URL: &str = "https://cu.ao-testnet.xyz";
pub const DEFAULT_SCHEDULER: &str = "_GQ33BkPtZrqxA84vM8Zk-N2aO0toNNu_C-l-rawrBA";
pub const DEFAULT_SDK: &str = "aogo";

/// AO client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AoConfig {
    /// Messenger Unit base URL
    #[serde(default = "default_mu_url")]
    pub mu_url: String,

    /// Compute Unit base URL
    #[serde(default = "default_cu_url")]
    pub cu_url: String,

    /// Scheduler address tagged onto spawned processes
    #[serde(default = "default_scheduler")]
    pub scheduler: String,

    /// Value of the `SDK` tag
    #[serde(default = "default_sdk")]
    pub sdk: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for AoConfig {
    fn default() -> Self {
        Self {
            mu_url: default_mu_url(),
            cu_url: default_cu_url(),
            scheduler: default_scheduler(),
            sdk: default_sdk(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

// Default value helpers
fn default_mu_url() -> String {
    DEFAULT_MU_URL.to_string()
}

fn default_cu_url() -> String {
    DEFAULT_CU_URL.to_string()
}

fn default_scheduler() -> String {
    DEFAULT_SCHEDULER.to_string()
}

fn default_sdk() -> String {
    DEFAULT_SDK.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl AoConfig {
    /// Load configuration: defaults, then an optional file, then `AO_*`
    /// environment variables (`AO_MU_URL`, `AO_CU_URL`, ...).
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&AoConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(config::Environment::with_prefix("AO").try_parsing(true));

        builder.build()?.try_deserialize()
    }

    /// Configuration pointing both units at local test servers.
    pub fn local(mu_url: impl Into<String>, cu_url: impl Into<String>) -> Self {
        Self {
            mu_url: mu_url.into(),
            cu_url: cu_url.into(),
            ..Default::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AoConfig::default();
        assert_eq!(config.mu_url, DEFAULT_MU_URL);
        assert_eq!(config.cu_url, DEFAULT_CU_URL);
        assert_eq!(config.sdk, "aogo");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ao.toml");
        std::fs::write(
            &path,
            "cu_url = \"http://localhost:6363\"\nrequest_timeout_secs = 5\n",
        )
        .unwrap();

        let config = AoConfig::load(path.to_str()).unwrap();
        assert_eq!(config.cu_url, "http://localhost:6363");
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.mu_url, DEFAULT_MU_URL);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AoConfig::load(Some("/nonexistent/ao-config")).unwrap();
        assert_eq!(config.scheduler, DEFAULT_SCHEDULER);
    }

    #[test]
    fn test_partial_json_uses_field_defaults() {
        let config: AoConfig = serde_json::from_str(r#"{"sdk":"custom"}"#).unwrap();
        assert_eq!(config.sdk, "custom");
        assert_eq!(config.mu_url, DEFAULT_MU_URL);
    }
}
