//! Crawler module for the store-locator walk
//!
//! This module contains the core crawling logic, including:
//! - Cached HTTP fetching
//! - Link and structured-data extraction from the site's pages
//! - Overall crawl coordination

mod coordinator;
mod extractor;
mod fetcher;

pub use coordinator::{run_crawl, Crawler};
pub use extractor::PageExtractor;
pub use fetcher::{build_http_client, header_value, Fetcher};
