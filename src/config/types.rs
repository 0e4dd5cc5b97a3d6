use crate::output::ExportFormat;
use serde::Deserialize;

/// Main configuration structure for Sumi-Sieve
///
/// Every section is optional; missing sections take their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CrawlerConfig {
    /// Maximum link depth from the seed URL (inclusive)
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Number of concurrent crawl workers
    #[serde(default = "default_workers")]
    pub workers: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            workers: default_workers(),
        }
    }
}

fn default_max_depth() -> u32 {
    3
}

fn default_workers() -> u32 {
    5
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetchConfig {
    /// Name sent in the User-Agent header
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Version sent in the User-Agent header
    #[serde(default = "default_version")]
    pub version: String,

    /// Optional URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,

    /// Whole-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Connection timeout (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            version: default_version(),
            contact_url: None,
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl FetchConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL)`
    pub fn user_agent_string(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!("{}/{} (+{})", self.user_agent, self.version, contact),
            None => format!("{}/{}", self.user_agent, self.version),
        }
    }
}

fn default_user_agent() -> String {
    "SumiSieve".to_string()
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Format used when writing URL and fragment lists
    #[serde(default)]
    pub format: ExportFormat,
}
