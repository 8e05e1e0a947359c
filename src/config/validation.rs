use crate::config::types::{
    CacheConfig, Config, CrawlerConfig, GeocoderConfig, OutputConfig, SelectorConfig, SiteConfig,
};
use crate::ConfigError;
use scraper::Selector;
use std::path::Path;
use url::Url;

/// Upper bound on sub-region pages fetched at once
const MAX_CONCURRENT_SUBREGIONS: u32 = 32;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_selector_config(&config.selectors)?;
    validate_geocoder_config(&config.geocoder)?;
    validate_cache_config(&config.cache)?;
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    Ok(())
}

fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    validate_http_url("root-url", &config.root_url)?;

    if config.expected_total < 1 {
        return Err(ConfigError::Validation(format!(
            "expected-total must be >= 1, got {}",
            config.expected_total
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "site user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_selector_config(config: &SelectorConfig) -> Result<(), ConfigError> {
    compile_selector("region-links", &config.region_links)?;
    compile_selector("subregion-links", &config.subregion_links)?;
    compile_selector("location-records", &config.location_records)?;
    Ok(())
}

/// Checks that a CSS selector compiles
pub fn compile_selector(name: &str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|_| ConfigError::InvalidSelector {
        name: name.to_string(),
        selector: selector.to_string(),
    })
}

fn validate_geocoder_config(config: &GeocoderConfig) -> Result<(), ConfigError> {
    validate_http_url("geocoder endpoint", &config.endpoint)?;

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "geocoder user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "cache path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_subregions < 1
        || config.max_concurrent_subregions > MAX_CONCURRENT_SUBREGIONS
    {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-subregions must be between 1 and {}, got {}",
            MAX_CONCURRENT_SUBREGIONS, config.max_concurrent_subregions
        )));
    }

    if config.request_timeout_secs == Some(0) {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.csv_path.is_empty() {
        return Err(ConfigError::Validation(
            "csv-path cannot be empty".to_string(),
        ));
    }

    if !has_csv_extension(Path::new(&config.csv_path)) {
        return Err(ConfigError::Validation(format!(
            "csv-path must end in .csv, got '{}'",
            config.csv_path
        )));
    }

    Ok(())
}

/// True when the path ends in `.csv`, ignoring case
pub fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            name, value
        )));
    }

    Ok(())
}
