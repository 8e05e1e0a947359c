//! Integration tests against a mock store-locator site and geocoder

mod cache_tests;
mod crawl_tests;
mod support;
