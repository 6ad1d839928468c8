//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the site.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the subdomain router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SiteConfig {
    /// Canonical domain and URL construction policy.
    pub site: SiteSettings,

    /// Subdomain → URL table registrations.
    pub subdomains: Vec<SubdomainConfig>,

    /// URL tables, keyed by table id.
    pub tables: BTreeMap<String, TableConfig>,

    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Site-wide settings shared by host parsing and URL reversing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteSettings {
    /// Base domain subdomains are computed against (e.g. "example.com").
    pub domain: String,

    /// Treat a leading `www` label as "no subdomain".
    pub remove_www_from_domain: bool,

    /// Scheme used for reversed URLs when the caller doesn't pick one.
    pub default_url_scheme: String,

    /// Table that serves requests whose subdomain has no registration.
    pub root_table: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            domain: "example.com".to_string(),
            remove_www_from_domain: true,
            default_url_scheme: "http".to_string(),
            root_table: "root".to_string(),
        }
    }
}

/// A single subdomain registration.
///
/// ```toml
/// [[subdomains]]          # no `subdomain` key: the bare domain
/// table = "marketing"
///
/// [[subdomains]]
/// subdomain = "api"
/// table = "api"
///
/// [[subdomains]]
/// subdomain = "*"         # any subdomain without its own entry
/// table = "marketing"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SubdomainConfig {
    /// Subdomain label, `"*"` for the wildcard, omitted for the bare domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<String>,

    /// Id of the URL table under `[tables]`.
    pub table: String,
}

/// Named routes of one URL table.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TableConfig {
    /// Route name → path template, e.g. `view = "/view/{id}/"`.
    pub routes: BTreeMap<String, String>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// `pretty` for development, `json` for log aggregation.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
