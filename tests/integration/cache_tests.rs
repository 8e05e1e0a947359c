//! Integration tests for the persistent response cache across runs

use crate::support::*;
use shopmap::cache::Cache;
use shopmap::crawler::run_crawl;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::MockServer;

fn open(config: &shopmap::Config) -> Arc<Cache> {
    Arc::new(Cache::open(Path::new(&config.cache.path)).expect("cache should open"))
}

#[tokio::test]
async fn test_rerun_served_from_disk() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    // Two runs, one request per URL
    mount_single_store_site(&mock_server, 1).await;
    mount_geocode(
        &mock_server,
        SYNTHESIZED_ADDRESS,
        r#"[{"lat": "41.0", "lon": "-87.0"}]"#,
        1,
    )
    .await;

    let config = test_config(&mock_server.uri(), temp_dir.path(), "");

    let first = run_crawl(&config, open(&config), false)
        .await
        .expect("first crawl should succeed");

    // Reopen from disk, as a fresh process would
    let cache = open(&config);
    assert_eq!(cache.len().unwrap(), 4);

    let second = run_crawl(&config, Arc::clone(&cache), false)
        .await
        .expect("second crawl should succeed");

    assert_eq!(first, second);

    let stats = cache.stats().unwrap();
    assert_eq!(stats.hits, 4);
    assert_eq!(stats.misses, 0);
}

#[tokio::test]
async fn test_refresh_refetches_everything() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    mount_single_store_site(&mock_server, 2).await;
    mount_geocode(
        &mock_server,
        SYNTHESIZED_ADDRESS,
        r#"[{"lat": "41.0", "lon": "-87.0"}]"#,
        2,
    )
    .await;

    let config = test_config(&mock_server.uri(), temp_dir.path(), "");

    run_crawl(&config, open(&config), false)
        .await
        .expect("first crawl should succeed");

    let cache = open(&config);
    run_crawl(&config, Arc::clone(&cache), true)
        .await
        .expect("refreshed crawl should succeed");

    assert_eq!(cache.stats().unwrap().misses, 4);
    assert_eq!(cache.len().unwrap(), 4);
}

#[tokio::test]
async fn test_fixed_address_rerun_resumes() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    // Pages are fetched once across both runs
    mount_single_store_site(&mock_server, 1).await;
    mount_geocode(&mock_server, SYNTHESIZED_ADDRESS, "[]", 1).await;
    mount_geocode(
        &mock_server,
        "1 Main Street, Town, ST",
        r#"[{"lat": "41.5", "lon": "-87.5"}]"#,
        1,
    )
    .await;

    let config = test_config(&mock_server.uri(), temp_dir.path(), "");
    assert!(run_crawl(&config, open(&config), false).await.is_err());

    let overrides_path = temp_dir.path().join("overrides.toml");
    std::fs::write(
        &overrides_path,
        format!(r#""{}" = "1 Main Street, Town, ST""#, TELEPHONE),
    )
    .unwrap();
    let extra = format!("[overrides]\npath = \"{}\"", overrides_path.display());
    let fixed = test_config(&mock_server.uri(), temp_dir.path(), &extra);

    let shops = run_crawl(&fixed, open(&fixed), false)
        .await
        .expect("rerun should succeed");

    assert_eq!(shops.len(), 1);
    assert_eq!(shops[0].lat, 41.5);
}

#[tokio::test]
async fn test_forget_forces_one_refetch() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    mount_single_store_site(&mock_server, 1).await;
    mount_geocode(
        &mock_server,
        SYNTHESIZED_ADDRESS,
        r#"[{"lat": "41.0", "lon": "-87.0"}]"#,
        2,
    )
    .await;

    let config = test_config(&mock_server.uri(), temp_dir.path(), "");
    run_crawl(&config, open(&config), false).await.unwrap();

    let cache = open(&config);
    let key = format!(
        "{}/search?q=1+Main+St%2C+Town%2C+ST+00001&format=json",
        mock_server.uri()
    );
    assert!(cache.get(&key).unwrap().is_some());
    assert!(cache.forget(&key).unwrap());

    run_crawl(&config, Arc::clone(&cache), false).await.unwrap();
    assert_eq!(cache.stats().unwrap().misses, 1);
}

#[tokio::test]
async fn test_refresh_fetches_each_url_once_per_run() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    // One request per URL in each of the two runs, although the
    // sub-region is linked twice
    mount_page(
        &mock_server,
        "/",
        listing_page(r#"<a href="/st/">State</a>"#),
        2,
    )
    .await;
    mount_page(
        &mock_server,
        "/st/",
        listing_page(r#"<a href="/st/town/">Town</a><a href="/st/town/">Town again</a>"#),
        2,
    )
    .await;
    mount_page(
        &mock_server,
        "/st/town/",
        location_page(&store_json(
            "https://locations.example.com/st/town/1",
            "1 Main St, Suite 2",
            TELEPHONE,
        )),
        2,
    )
    .await;
    mount_geocode(
        &mock_server,
        SYNTHESIZED_ADDRESS,
        r#"[{"lat": "41.0", "lon": "-87.0"}]"#,
        2,
    )
    .await;

    let config = test_config(&mock_server.uri(), temp_dir.path(), "");
    run_crawl(&config, open(&config), false)
        .await
        .expect("first crawl should succeed");

    let cache = open(&config);
    let shops = run_crawl(&config, Arc::clone(&cache), true)
        .await
        .expect("refreshed crawl should succeed");

    assert_eq!(shops.len(), 2);
    let stats = cache.stats().unwrap();
    assert_eq!(stats.misses, 4);
    assert_eq!(stats.hits, 2);
}
