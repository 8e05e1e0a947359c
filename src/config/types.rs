use serde::Deserialize;

/// User agent sent to the store-locator site; it rejects non-browser clients
pub const DEFAULT_SITE_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

/// Anchor list shared by the region and sub-region listing pages
pub const DEFAULT_LISTING_SELECTOR: &str =
    "#contentbegin > div > div > div > div:nth-child(2) > div > div > a";

/// Structured-data script blocks on a location page
pub const DEFAULT_LOCATION_SELECTOR: &str =
    "#contentbegin > div > div:nth-child(2) > div > script";

/// Main configuration structure for Shopmap
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    pub geocoder: GeocoderConfig,
    pub cache: CacheConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub overrides: OverridesConfig,
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Root listing page; also the base that relative hrefs are joined to
    #[serde(rename = "root-url")]
    pub root_url: String,

    /// Rough number of stores on the site, used only for progress output
    #[serde(rename = "expected-total")]
    pub expected_total: u32,

    #[serde(rename = "user-agent", default = "default_site_user_agent")]
    pub user_agent: String,
}

/// CSS selectors locating the data on each page level
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorConfig {
    #[serde(rename = "region-links", default = "default_listing_selector")]
    pub region_links: String,

    #[serde(rename = "subregion-links", default = "default_listing_selector")]
    pub subregion_links: String,

    #[serde(rename = "location-records", default = "default_location_selector")]
    pub location_records: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            region_links: default_listing_selector(),
            subregion_links: default_listing_selector(),
            location_records: default_location_selector(),
        }
    }
}

/// Geocoding service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GeocoderConfig {
    /// Search endpoint taking `q` and `format=json`
    pub endpoint: String,

    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

/// Response cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Path to the SQLite cache database
    pub path: String,
}

/// Crawl execution configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Sub-region pages fetched at once within a region (1 = sequential)
    #[serde(rename = "max-concurrent-subregions", default = "default_concurrency")]
    pub max_concurrent_subregions: u32,

    /// Per-request timeout; no timeout when absent
    #[serde(rename = "request-timeout-secs", default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_subregions: default_concurrency(),
            request_timeout_secs: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the shop CSV file
    #[serde(rename = "csv-path")]
    pub csv_path: String,
}

/// Extra address overrides layered on the built-in table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OverridesConfig {
    /// TOML file of `"<telephone>" = "<address>"` entries
    pub path: Option<String>,
}

fn default_site_user_agent() -> String {
    DEFAULT_SITE_USER_AGENT.to_string()
}

fn default_listing_selector() -> String {
    DEFAULT_LISTING_SELECTOR.to_string()
}

fn default_location_selector() -> String {
    DEFAULT_LOCATION_SELECTOR.to_string()
}

fn default_concurrency() -> u32 {
    1
}
