//! Crawler coordinator - main crawl orchestration logic
//!
//! The crawl walks three fixed levels:
//! - the root listing page, yielding region pages
//! - each region page, yielding sub-region pages
//! - each sub-region page, yielding store records that are then geocoded
//!
//! Regions are processed one after another. Sub-regions of one region may be
//! fetched concurrently up to `max-concurrent-subregions`; results are always
//! reassembled in page order, so the output does not depend on which request
//! finished first. The first error at any level aborts the crawl.

use crate::cache::Cache;
use crate::config::Config;
use crate::crawler::{build_http_client, Fetcher, PageExtractor};
use crate::model::ShopRecord;
use crate::resolver::{AddressResolver, Geocoder, OverrideTable};
use crate::Result;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// Main crawler structure
///
/// Cloning is cheap; clones share the fetcher, resolver and progress counter.
#[derive(Clone)]
pub struct Crawler {
    fetcher: Fetcher,
    extractor: Arc<PageExtractor>,
    resolver: AddressResolver,
    root_url: String,
    expected_total: u32,
    max_concurrent_subregions: usize,
    stores_seen: Arc<AtomicUsize>,
}

impl Crawler {
    pub fn new(
        fetcher: Fetcher,
        extractor: PageExtractor,
        resolver: AddressResolver,
        expected_total: u32,
        max_concurrent_subregions: usize,
    ) -> Self {
        let root_url = extractor.base_url().to_string();

        Self {
            fetcher,
            extractor: Arc::new(extractor),
            resolver,
            root_url,
            expected_total: expected_total.max(1),
            max_concurrent_subregions: max_concurrent_subregions.max(1),
            stores_seen: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wires a crawler from validated configuration
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `cache` - Response cache shared by page and geocoder fetches
    /// * `refresh` - Ignore stored responses and overwrite them
    pub fn from_config(config: &Config, cache: Arc<Cache>, refresh: bool) -> Result<Self> {
        let client = build_http_client(&config.crawler)?;
        let fetcher = Fetcher::new(client, cache, &config.site.user_agent)?.with_refresh(refresh);

        let extractor = PageExtractor::new(Url::parse(&config.site.root_url)?, &config.selectors)?;

        let overrides = match &config.overrides.path {
            Some(path) => {
                let table = OverrideTable::load_extra(Path::new(path))?;
                tracing::info!("Loaded overrides from {} ({} entries)", path, table.len());
                table
            }
            None => OverrideTable::builtin().clone(),
        };

        let geocoder = Geocoder::new(
            fetcher.clone(),
            Url::parse(&config.geocoder.endpoint)?,
            &config.geocoder.user_agent,
        )?;
        let resolver = AddressResolver::new(Arc::new(overrides), geocoder);

        Ok(Self::new(
            fetcher,
            extractor,
            resolver,
            config.site.expected_total,
            config.crawler.max_concurrent_subregions as usize,
        ))
    }

    pub fn resolver(&self) -> &AddressResolver {
        &self.resolver
    }

    /// Runs the crawl and returns every store in page order
    pub async fn run(&self) -> Result<Vec<ShopRecord>> {
        let start_time = std::time::Instant::now();
        tracing::info!("Starting crawl at {}", self.root_url);

        let root_page = self.fetcher.get(&self.root_url).await?;
        let regions = self.extractor.region_links(&root_page, &self.root_url)?;
        tracing::info!("Found {} regions", regions.len());

        let mut shops = Vec::new();

        for region in &regions {
            tracing::info!(
                "{:.2}% - scraping stores under {}",
                self.progress(),
                page_label(region)
            );

            let region_page = self.fetcher.get(region).await?;
            let subregions = self.extractor.subregion_links(&region_page, region)?;
            tracing::debug!("{} sub-regions under {}", subregions.len(), region);

            shops.extend(self.crawl_subregions(subregions).await?);
        }

        tracing::info!(
            "Crawl completed: {} stores from {} regions in {:?}",
            shops.len(),
            regions.len(),
            start_time.elapsed()
        );

        Ok(shops)
    }

    /// Crawls the sub-regions of one region, keeping their order
    async fn crawl_subregions(&self, subregions: Vec<String>) -> Result<Vec<ShopRecord>> {
        if self.max_concurrent_subregions == 1 || subregions.len() <= 1 {
            let mut shops = Vec::new();
            for url in &subregions {
                shops.extend(self.crawl_subregion(url).await?);
            }
            return Ok(shops);
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_subregions));
        let mut tasks = JoinSet::new();

        for (index, url) in subregions.into_iter().enumerate() {
            let worker = self.clone();
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                // The semaphore is never closed
                let _permit = semaphore.acquire_owned().await.ok();
                let shops = worker.crawl_subregion(&url).await;
                (index, shops)
            });
        }

        let mut batches = Vec::with_capacity(tasks.len());

        while let Some(joined) = tasks.join_next().await {
            let (index, outcome) = joined?;
            match outcome {
                Ok(shops) => batches.push((index, shops)),
                Err(e) => {
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }

        batches.sort_by_key(|(index, _)| *index);
        Ok(batches.into_iter().flat_map(|(_, shops)| shops).collect())
    }

    /// Fetches one sub-region page and resolves each of its stores
    async fn crawl_subregion(&self, url: &str) -> Result<Vec<ShopRecord>> {
        let page = self.fetcher.get(url).await?;
        let records = self.extractor.location_records(&page, url)?;

        tracing::info!("{:.2}% - {}", self.progress(), page_label(url));

        let mut shops = Vec::with_capacity(records.len());
        for record in records {
            tracing::debug!("Resolving {} ({})", record.name, record.id);
            shops.push(self.resolver.resolve_shop(record).await?);
            self.stores_seen.fetch_add(1, Ordering::Relaxed);
        }

        Ok(shops)
    }

    /// Stores resolved so far as a percentage of the expected total
    fn progress(&self) -> f64 {
        self.stores_seen.load(Ordering::Relaxed) as f64 / self.expected_total as f64 * 100.0
    }
}

/// Last non-empty path segment of a page URL, for progress lines
fn page_label(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
                .map(str::to_string)
        })
        .unwrap_or_else(|| url.to_string())
}

/// Runs a complete crawl against `cache`
///
/// The cache is flushed whether the crawl succeeds or aborts. Hit and miss
/// totals are logged at the end.
///
/// # Example
///
/// ```no_run
/// use shopmap::cache::Cache;
/// use shopmap::config::load_config;
/// use shopmap::crawler::run_crawl;
/// use std::path::Path;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("shopmap.toml"))?;
/// let cache = Arc::new(Cache::open(Path::new(&config.cache.path))?);
/// let shops = run_crawl(&config, cache, false).await?;
/// println!("{} stores", shops.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: &Config, cache: Arc<Cache>, refresh: bool) -> Result<Vec<ShopRecord>> {
    let outcome = match Crawler::from_config(config, Arc::clone(&cache), refresh) {
        Ok(crawler) => crawler.run().await,
        Err(e) => Err(e),
    };

    match cache.stats() {
        Ok(stats) => tracing::info!(
            "Cache: {} hits, {} misses, {} entries",
            stats.hits,
            stats.misses,
            stats.entries
        ),
        Err(e) => tracing::warn!("Could not read cache stats: {}", e),
    }

    let closed = cache.close();

    let shops = outcome?;
    closed?;
    Ok(shops)
}
