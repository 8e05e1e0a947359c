//! Shopmap: a store-locator harvester
//!
//! This crate walks a retailer's store-locator site (region → sub-region →
//! location page), pulls the embedded `PostalAddress` blocks out of each
//! location page, and geocodes every store into a coordinate. Every HTTP
//! response goes through a persistent cache so reruns are cheap and resume
//! where a failed run stopped.

pub mod cache;
pub mod config;
pub mod crawler;
pub mod model;
pub mod output;
pub mod resolver;

use thiserror::Error;

/// Main error type for Shopmap operations
#[derive(Debug, Error)]
pub enum ShopmapError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport failure for {url}: {message}")]
    TransportFailure { url: String, message: String },

    #[error("Cache value for {key} is not text (got {kind})")]
    InvalidValueKind { key: String, kind: String },

    #[error("Malformed link on {page}: {element}")]
    MalformedLink { page: String, element: String },

    #[error("Schema mismatch in {origin}: {message}")]
    SchemaMismatch { origin: String, message: String },

    #[error("Could not geocode address: {address}")]
    UnresolvableAddress { address: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Point import from {path} failed: {message}")]
    PointImport { path: String, message: String },

    #[error("Crawl task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Cache store error: {0}")]
    Cache(#[from] cache::CacheStoreError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector for {name}: {selector}")]
    InvalidSelector { name: String, selector: String },
}

/// Result type alias for Shopmap operations
pub type Result<T> = std::result::Result<T, ShopmapError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use cache::Cache;
pub use config::Config;
pub use crawler::{run_crawl, Crawler, Fetcher, PageExtractor};
pub use model::{Coordinate, PostalAddressRecord, ResolvedAddress, ShopRecord};
pub use resolver::{AddressResolver, OverrideTable};
