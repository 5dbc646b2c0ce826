//! # Provider Configuration
//!
//! Provider-level settings loaded from environment variables.

use crate::config::OperationTimeouts;
use crate::constants::{
    DEFAULT_CONTAINER_ENDPOINT, DEFAULT_CREATE_TIMEOUT_SECS, DEFAULT_DELETE_TIMEOUT_SECS,
    DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS, DEFAULT_REGION,
    DEFAULT_UPDATE_TIMEOUT_SECS,
};
use crate::reconciler::NotFoundPolicy;
use std::time::Duration;

/// Provider-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// The orchestrator passes the process environment through to the provider unchanged.
#[derive(Clone)]
pub struct ProviderConfig {
    /// IBM Cloud region (e.g., "us-south", "eu-de")
    pub region: String,
    /// Power Virtual Server zone (e.g., "dal12"), used for the workspace CRN header
    pub zone: Option<String>,
    /// Account id, used for the workspace CRN header
    pub account_id: Option<String>,
    /// IAM bearer token; the session refuses to build without one
    pub iam_token: Option<String>,
    /// Power Virtual Server API base URL
    pub power_endpoint: String,
    /// Kubernetes Service API base URL
    pub container_endpoint: String,
    /// Timeout for a single HTTP request (seconds)
    pub http_timeout_secs: u64,
    /// Per-operation timeouts
    pub timeouts: OperationTimeouts,
    /// What Read/Delete do when the remote resource is gone
    pub not_found_policy: NotFoundPolicy,
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE)
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: String,
    /// Enable metrics collection
    pub enable_metrics: bool,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("region", &self.region)
            .field("zone", &self.zone)
            .field("account_id", &self.account_id)
            .field("iam_token", &self.iam_token.as_ref().map(|_| "<redacted>"))
            .field("power_endpoint", &self.power_endpoint)
            .field("container_endpoint", &self.container_endpoint)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("timeouts", &self.timeouts)
            .field("not_found_policy", &self.not_found_policy)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .field("enable_metrics", &self.enable_metrics)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            zone: None,
            account_id: None,
            iam_token: None,
            power_endpoint: power_endpoint_for_region(DEFAULT_REGION),
            container_endpoint: DEFAULT_CONTAINER_ENDPOINT.to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            timeouts: OperationTimeouts::default(),
            not_found_policy: NotFoundPolicy::default(),
            log_level: "INFO".to_string(),
            log_format: "text".to_string(),
            enable_metrics: true,
        }
    }
}

impl ProviderConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let region = env_var_or_default_str("IC_REGION", DEFAULT_REGION);
        let power_endpoint = env_var_or_default_str(
            "IBMCLOUD_PI_API_ENDPOINT",
            &power_endpoint_for_region(&region),
        );

        let not_found_policy = if env_var_or_default_bool("PROVIDER_STRICT_NOT_FOUND", false) {
            NotFoundPolicy::Propagate
        } else {
            NotFoundPolicy::TreatAsAbsent
        };

        Self {
            region,
            zone: env_var_opt("IC_ZONE"),
            account_id: env_var_opt("IC_ACCOUNT_ID"),
            iam_token: env_var_opt("IC_IAM_TOKEN"),
            power_endpoint,
            container_endpoint: env_var_or_default_str(
                "IBMCLOUD_CS_API_ENDPOINT",
                DEFAULT_CONTAINER_ENDPOINT,
            ),
            http_timeout_secs: env_var_or_default(
                "PROVIDER_HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            ),
            timeouts: OperationTimeouts {
                create: Duration::from_secs(env_var_or_default(
                    "PROVIDER_CREATE_TIMEOUT_SECS",
                    DEFAULT_CREATE_TIMEOUT_SECS,
                )),
                read: Duration::from_secs(env_var_or_default(
                    "PROVIDER_READ_TIMEOUT_SECS",
                    DEFAULT_READ_TIMEOUT_SECS,
                )),
                update: Duration::from_secs(env_var_or_default(
                    "PROVIDER_UPDATE_TIMEOUT_SECS",
                    DEFAULT_UPDATE_TIMEOUT_SECS,
                )),
                delete: Duration::from_secs(env_var_or_default(
                    "PROVIDER_DELETE_TIMEOUT_SECS",
                    DEFAULT_DELETE_TIMEOUT_SECS,
                )),
            },
            not_found_policy,
            log_level: env_var_or_default_str("LOG_LEVEL", "INFO"),
            log_format: env_var_or_default_str("LOG_FORMAT", "text"),
            enable_metrics: env_var_or_default_bool("ENABLE_METRICS", true),
        }
    }

    /// Get the HTTP request timeout duration
    pub fn http_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Power Virtual Server endpoint for a region
pub fn power_endpoint_for_region(region: &str) -> String {
    format!("https://{region}.power-iaas.cloud.ibm.com")
}

/// Read environment variable or return default value
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T
where
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as boolean or return default
fn env_var_or_default_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| {
            let v_lower = v.to_lowercase();
            v_lower == "true" || v_lower == "1" || v_lower == "yes" || v_lower == "on"
        })
        .unwrap_or(default)
}

/// Read environment variable as string or return default
fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read environment variable, treating empty values as unset
fn env_var_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_endpoint_for_region() {
        assert_eq!(
            power_endpoint_for_region("eu-de"),
            "https://eu-de.power-iaas.cloud.ibm.com"
        );
    }

    #[test]
    fn test_default_config() {
        let config = ProviderConfig::default();
        assert_eq!(config.region, "us-south");
        assert_eq!(config.power_endpoint, "https://us-south.power-iaas.cloud.ibm.com");
        assert_eq!(config.not_found_policy, NotFoundPolicy::TreatAsAbsent);
        assert_eq!(config.http_timeout_duration(), Duration::from_secs(60));
        assert!(config.iam_token.is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ProviderConfig {
            iam_token: Some("very-secret-token".to_string()),
            ..ProviderConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("very-secret-token"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_env_helpers_fall_back_when_unset() {
        assert_eq!(env_var_or_default("PROVIDER_TEST_UNSET_NUMBER", 42_u64), 42);
        assert!(env_var_or_default_bool("PROVIDER_TEST_UNSET_BOOL", true));
        assert_eq!(env_var_opt("PROVIDER_TEST_UNSET_STRING"), None);
    }
}
