//! Page extraction for the store-locator site
//!
//! Each page level has exactly one thing worth reading:
//! - the root listing page: anchors to region pages
//! - a region page: anchors to sub-region pages
//! - a sub-region page: `PostalAddress` JSON blocks, one per store
//!
//! The selectors are coupled to the site's markup. When the markup changes,
//! only the selector configuration needs updating.

use crate::config::{compile_selector, SelectorConfig};
use crate::model::PostalAddressRecord;
use crate::{ConfigError, Result, ShopmapError};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Compiled selectors plus the base URL hrefs are joined to
#[derive(Debug, Clone)]
pub struct PageExtractor {
    base_url: Url,
    region_links: Selector,
    subregion_links: Selector,
    location_records: Selector,
}

impl PageExtractor {
    /// Compiles the configured selectors
    ///
    /// # Arguments
    ///
    /// * `base_url` - Site root; region and sub-region hrefs are relative to it
    /// * `selectors` - Selector configuration
    pub fn new(base_url: Url, selectors: &SelectorConfig) -> std::result::Result<Self, ConfigError> {
        Ok(Self {
            base_url,
            region_links: compile_selector("region-links", &selectors.region_links)?,
            subregion_links: compile_selector("subregion-links", &selectors.subregion_links)?,
            location_records: compile_selector(
                "location-records",
                &selectors.location_records,
            )?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Extracts absolute region page URLs from the root listing page
    ///
    /// # Example
    ///
    /// ```
    /// use shopmap::config::SelectorConfig;
    /// use shopmap::crawler::PageExtractor;
    /// use url::Url;
    ///
    /// let selectors = SelectorConfig {
    ///     region_links: "nav a".to_string(),
    ///     ..SelectorConfig::default()
    /// };
    /// let base = Url::parse("https://locations.example.com").unwrap();
    /// let extractor = PageExtractor::new(base, &selectors).unwrap();
    ///
    /// let html = r#"<nav><a href="/il/">Illinois</a></nav>"#;
    /// let regions = extractor.region_links(html, "https://locations.example.com").unwrap();
    /// assert_eq!(regions, vec!["https://locations.example.com/il/".to_string()]);
    /// ```
    pub fn region_links(&self, html: &str, page_url: &str) -> Result<Vec<String>> {
        self.extract_links(html, page_url, &self.region_links)
    }

    /// Extracts absolute sub-region page URLs from a region page
    pub fn subregion_links(&self, html: &str, page_url: &str) -> Result<Vec<String>> {
        self.extract_links(html, page_url, &self.subregion_links)
    }

    /// Decodes every structured-data block on a sub-region page
    ///
    /// Blocks come back in document order. Any block that is not valid JSON
    /// or does not have the `PostalAddress` shape fails the whole page.
    pub fn location_records(&self, html: &str, page_url: &str) -> Result<Vec<PostalAddressRecord>> {
        let document = Html::parse_document(html);

        document
            .select(&self.location_records)
            .map(|script| decode_record(&script.text().collect::<String>(), page_url))
            .collect()
    }

    fn extract_links(&self, html: &str, page_url: &str, selector: &Selector) -> Result<Vec<String>> {
        let document = Html::parse_document(html);

        document
            .select(selector)
            .map(|anchor| self.resolve_href(anchor, page_url))
            .collect()
    }

    /// Joins an anchor's href onto the site base
    ///
    /// A missing, empty, or unjoinable href is a `MalformedLink`: the listing
    /// pages never contain decorative anchors, so one without a target means
    /// the markup has drifted.
    fn resolve_href(&self, anchor: ElementRef<'_>, page_url: &str) -> Result<String> {
        let malformed = |reason: &str| ShopmapError::MalformedLink {
            page: page_url.to_string(),
            element: format!("{} ({})", anchor.html(), reason),
        };

        let href = anchor
            .value()
            .attr("href")
            .ok_or_else(|| malformed("no href"))?
            .trim();

        if href.is_empty() {
            return Err(malformed("empty href"));
        }

        let absolute = self
            .base_url
            .join(href)
            .map_err(|e| malformed(&e.to_string()))?;

        Ok(absolute.to_string())
    }
}

/// Decodes one script block into a record
fn decode_record(json: &str, page_url: &str) -> Result<PostalAddressRecord> {
    let mismatch = |message: String| ShopmapError::SchemaMismatch {
        origin: page_url.to_string(),
        message,
    };

    let record: PostalAddressRecord =
        serde_json::from_str(json.trim()).map_err(|e| mismatch(e.to_string()))?;

    match record.schema_type.as_deref() {
        None | Some("PostalAddress") => Ok(record),
        Some(other) => Err(mismatch(format!("expected @type PostalAddress, got {}", other))),
    }
}
