//! Centralized configuration for shortener-cli.
//!
//! All environment variables are loaded and validated at startup to fail fast
//! on misconfiguration rather than at submission time.

use std::env;
use std::fmt;

use domain::processor::ShortcodePolicy;
use log_collector::DEFAULT_COLLECTOR_URL;

/// Base used for rendered short links when `SHORTLINK_DOMAIN` is unset.
pub const DEFAULT_SHORTLINK_DOMAIN: &str = "http://localhost:3000";

/// Log output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Configuration error.
#[derive(Debug)]
pub struct ConfigError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration error for {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Session configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Remote log collector endpoint
    pub collector_url: String,
    /// Whether telemetry events are sent at all
    pub telemetry_enabled: bool,
    /// Base origin for rendered short links
    pub shortlink_domain: String,
    /// Shortcode uniqueness policy
    pub shortcode_policy: ShortcodePolicy,
    /// Log format
    pub log_format: LogFormat,
}

impl Config {
    /// Load and validate configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Collector endpoint
        let collector_url = lookup("LOG_COLLECTOR_URL")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_COLLECTOR_URL.into());
        match url::Url::parse(&collector_url) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => {}
            Ok(u) => {
                return Err(ConfigError {
                    field: "LOG_COLLECTOR_URL",
                    message: format!("Unsupported scheme '{}'", u.scheme()),
                })
            }
            Err(e) => {
                return Err(ConfigError {
                    field: "LOG_COLLECTOR_URL",
                    message: format!("Invalid URL '{}': {}", collector_url, e),
                })
            }
        }

        // Telemetry switch
        let telemetry_enabled = match lookup("TELEMETRY_ENABLED") {
            Some(v) => matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
            None => true,
        };

        // Shortlink domain
        let shortlink_domain = lookup("SHORTLINK_DOMAIN")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SHORTLINK_DOMAIN.into());

        // Shortcode policy
        let shortcode_policy = match lookup("SHORTCODE_POLICY") {
            Some(raw) => ShortcodePolicy::parse(&raw).ok_or_else(|| ConfigError {
                field: "SHORTCODE_POLICY",
                message: format!("Expected 'allow' or 'unique', got '{}'", raw),
            })?,
            None => ShortcodePolicy::default(),
        };

        // Log format
        let log_format =
            LogFormat::from_str(&lookup("LOG_FORMAT").unwrap_or_else(|| "pretty".into()));

        Ok(Self {
            collector_url,
            telemetry_enabled,
            shortlink_domain,
            shortcode_policy,
            log_format,
        })
    }

    /// Log notes about non-default behavior.
    pub fn log_summary(&self) {
        if !self.telemetry_enabled {
            tracing::warn!("TELEMETRY_ENABLED is off: row outcomes will not reach the collector");
        }
        if self.shortcode_policy == ShortcodePolicy::RejectDuplicates {
            tracing::info!(
                "SHORTCODE_POLICY=unique: rows reusing an existing shortcode will be rejected"
            );
        }
    }
}
