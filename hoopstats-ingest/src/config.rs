//! Configuration resolution for hoopstats-ingest
//!
//! Builds the [`IngestConfig`] value handed to every component at
//! construction. Each setting resolves CLI → ENV → TOML → built-in default.

use hoopstats_common::config::{resolve_cache_directory, resolve_string, TomlConfig};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://www.nba.com";
pub const DEFAULT_API_BASE_URL: &str = "https://stats.nba.com/stats";
pub const DEFAULT_SEASON: &str = "2024-25";

/// Spacing between upstream requests; the stats host throttles bursts
pub const DEFAULT_PACING_DELAY: Duration = Duration::from_millis(2000);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const BASE_URL_ENV: &str = "HOOPSTATS_BASE_URL";
pub const API_BASE_URL_ENV: &str = "HOOPSTATS_API_BASE_URL";
pub const CACHE_DIR_ENV: &str = "HOOPSTATS_CACHE_DIR";

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/96.0.4664.110 Safari/537.36";

/// Runtime configuration for the ingest pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct IngestConfig {
    /// Rendered page host
    pub base_url: String,
    /// Structured stats API root
    pub api_base_url: String,
    /// Headers sent with every request
    pub request_headers: BTreeMap<String, String>,
    /// Directory for cached records and raw audit payloads
    pub cache_directory: PathBuf,
    /// Minimum spacing between requests; zero disables pacing
    pub pacing_delay: Duration,
    pub request_timeout: Duration,
    /// Season used for the player listing
    pub season: String,
    /// Keep unmodified upstream payloads under `cache_directory/raw`
    pub persist_raw: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_headers: default_request_headers(),
            cache_directory: hoopstats_common::config::default_cache_directory(),
            pacing_delay: DEFAULT_PACING_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            season: DEFAULT_SEASON.to_string(),
            persist_raw: false,
        }
    }
}

/// Per-invocation overrides (command-line flags)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub api_base_url: Option<String>,
    pub cache_directory: Option<PathBuf>,
    pub pacing_delay_ms: Option<u64>,
    pub season: Option<String>,
    pub persist_raw: bool,
}

impl IngestConfig {
    /// Resolve every setting from overrides, environment and the TOML file
    pub fn resolve(toml: &TomlConfig, overrides: &ConfigOverrides) -> Self {
        let defaults = Self::default();

        let base_url = resolve_string(
            overrides.base_url.as_deref(),
            BASE_URL_ENV,
            toml.base_url.as_deref(),
        )
        .unwrap_or(defaults.base_url);

        let api_base_url = resolve_string(
            overrides.api_base_url.as_deref(),
            API_BASE_URL_ENV,
            toml.api_base_url.as_deref(),
        )
        .unwrap_or(defaults.api_base_url);

        let cache_directory = resolve_cache_directory(
            overrides.cache_directory.as_deref(),
            CACHE_DIR_ENV,
            toml.cache_directory.as_deref(),
        );

        let mut request_headers = defaults.request_headers;
        request_headers.extend(
            toml.request_headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        let config = Self {
            base_url,
            api_base_url,
            request_headers,
            cache_directory,
            pacing_delay: overrides
                .pacing_delay_ms
                .or(toml.pacing_delay_ms)
                .map(Duration::from_millis)
                .unwrap_or(defaults.pacing_delay),
            request_timeout: toml
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            season: overrides
                .season
                .clone()
                .or_else(|| toml.season.clone())
                .unwrap_or(defaults.season),
            persist_raw: overrides.persist_raw || toml.persist_raw.unwrap_or(false),
        };

        debug!(
            base_url = %config.base_url,
            api_base_url = %config.api_base_url,
            cache_directory = %config.cache_directory.display(),
            pacing_ms = config.pacing_delay.as_millis() as u64,
            season = %config.season,
            "Resolved ingest configuration"
        );

        config
    }
}

/// Browser-like headers; the stats host rejects requests without a Referer
pub fn default_request_headers() -> BTreeMap<String, String> {
    [
        ("User-Agent", USER_AGENT),
        ("Referer", "https://www.nba.com/"),
        ("Accept", "application/json, text/plain, */*"),
        ("Accept-Language", "en-US,en;q=0.9"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    fn test_defaults() {
        let config = IngestConfig::default();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.pacing_delay, Duration::from_millis(2000));
        assert!(config.request_headers.contains_key("Referer"));
        assert!(!config.persist_raw);
    }

    #[test]
    #[serial]
    fn test_toml_headers_extend_defaults() {
        let mut toml = TomlConfig::default();
        toml.request_headers
            .insert("Referer".to_string(), "http://localhost/".to_string());
        toml.request_headers
            .insert("X-Trace".to_string(), "1".to_string());

        let config = IngestConfig::resolve(&toml, &ConfigOverrides::default());

        assert_eq!(config.request_headers["Referer"], "http://localhost/");
        assert_eq!(config.request_headers["X-Trace"], "1");
        assert!(config.request_headers.contains_key("User-Agent"));
    }

    #[test]
    #[serial]
    fn test_overrides_beat_toml() {
        let toml = TomlConfig {
            pacing_delay_ms: Some(500),
            season: Some("2022-23".to_string()),
            persist_raw: Some(false),
            ..TomlConfig::default()
        };
        let overrides = ConfigOverrides {
            pacing_delay_ms: Some(0),
            season: Some("2023-24".to_string()),
            persist_raw: true,
            ..ConfigOverrides::default()
        };

        let config = IngestConfig::resolve(&toml, &overrides);

        assert_eq!(config.pacing_delay, Duration::ZERO);
        assert_eq!(config.season, "2023-24");
        assert!(config.persist_raw);
    }

    #[test]
    #[serial]
    fn test_env_beats_toml_for_hosts() {
        env::set_var(API_BASE_URL_ENV, "http://env.stats.test/stats");
        env::remove_var(BASE_URL_ENV);

        let toml = TomlConfig {
            api_base_url: Some("http://toml.stats.test/stats".to_string()),
            base_url: Some("http://toml.pages.test".to_string()),
            ..TomlConfig::default()
        };
        let config = IngestConfig::resolve(&toml, &ConfigOverrides::default());

        assert_eq!(config.api_base_url, "http://env.stats.test/stats");
        assert_eq!(config.base_url, "http://toml.pages.test");

        // CLI still wins over the environment
        let overrides = ConfigOverrides {
            api_base_url: Some("http://cli.stats.test/stats".to_string()),
            ..ConfigOverrides::default()
        };
        let config = IngestConfig::resolve(&toml, &overrides);
        assert_eq!(config.api_base_url, "http://cli.stats.test/stats");

        env::remove_var(API_BASE_URL_ENV);
    }
}
