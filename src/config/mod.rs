//! Configuration module for Shopmap
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use shopmap::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("shopmap.toml")).unwrap();
//! println!("Crawling from: {}", config.site.root_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CacheConfig, Config, CrawlerConfig, GeocoderConfig, OutputConfig, OverridesConfig,
    SelectorConfig, SiteConfig, DEFAULT_LISTING_SELECTOR, DEFAULT_LOCATION_SELECTOR,
    DEFAULT_SITE_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{compile_selector, has_csv_extension};
