//! Integration tests for the crawler
//!
//! These tests use wiremock for both the store-locator site and the geocoder
//! and run the full crawl cycle end-to-end.

use crate::support::*;
use shopmap::cache::Cache;
use shopmap::config::CrawlerConfig;
use shopmap::crawler::{build_http_client, run_crawl, Fetcher};
use shopmap::output::{dedup_by_id, write_shops_csv};
use shopmap::{Coordinate, ShopRecord, ShopmapError};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_single_store_crawl() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    mount_single_store_site(&mock_server, 1).await;
    mount_geocode(
        &mock_server,
        SYNTHESIZED_ADDRESS,
        r#"[{"lat": "41.0", "lon": "-87.0"}]"#,
        1,
    )
    .await;

    let config = test_config(&mock_server.uri(), temp_dir.path(), "");
    let shops = run_crawl(&config, Arc::new(Cache::in_memory()), false)
        .await
        .expect("crawl should succeed");

    assert_eq!(
        shops,
        vec![ShopRecord {
            id: "https://locations.example.com/st/town/1".to_string(),
            name: "Main Street Market".to_string(),
            street_address: "1 Main St, Suite 2".to_string(),
            locality: "Town".to_string(),
            region: "ST".to_string(),
            postal_code: "00001".to_string(),
            country: "US".to_string(),
            telephone: "+1 555-000-0000".to_string(),
            lat: 41.0,
            long: -87.0,
        }]
    );
}

#[tokio::test]
async fn test_empty_geocode_aborts_crawl() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    mount_single_store_site(&mock_server, 1).await;
    mount_geocode(&mock_server, SYNTHESIZED_ADDRESS, "[]", 1).await;

    let config = test_config(&mock_server.uri(), temp_dir.path(), "");
    let cache = Arc::new(Cache::in_memory());
    let result = run_crawl(&config, Arc::clone(&cache), false).await;

    match result {
        Err(ShopmapError::UnresolvableAddress { address }) => {
            assert_eq!(address, SYNTHESIZED_ADDRESS)
        }
        other => panic!("expected UnresolvableAddress, got {:?}", other),
    }

    // Pages fetched before the failure stay cached for the rerun
    let root = format!("{}/", mock_server.uri());
    assert!(cache.get(&root).unwrap().is_some());
}

#[tokio::test]
async fn test_override_file_replaces_synthesized_address() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    let overrides_path = temp_dir.path().join("overrides.toml");
    std::fs::write(
        &overrides_path,
        format!(r#""{}" = "Plaza 9, Town, ST 00001""#, TELEPHONE),
    )
    .unwrap();

    mount_single_store_site(&mock_server, 1).await;
    mount_geocode(
        &mock_server,
        "Plaza 9, Town, ST 00001",
        r#"[{"lat": "40.5", "lon": "-86.5"}]"#,
        1,
    )
    .await;
    mount_geocode(&mock_server, SYNTHESIZED_ADDRESS, "[]", 0).await;

    let extra = format!("[overrides]\npath = \"{}\"", overrides_path.display());
    let config = test_config(&mock_server.uri(), temp_dir.path(), &extra);

    let shops = run_crawl(&config, Arc::new(Cache::in_memory()), false)
        .await
        .expect("crawl should succeed");

    assert_eq!(shops[0].coordinate(), Coordinate::new(40.5, -86.5));
}

#[tokio::test]
async fn test_missing_href_aborts_crawl() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/",
        listing_page(r#"<a href="/st/">State</a><a class="broken">Nowhere</a>"#),
        1,
    )
    .await;

    let config = test_config(&mock_server.uri(), temp_dir.path(), "");
    let result = run_crawl(&config, Arc::new(Cache::in_memory()), false).await;

    match result {
        Err(ShopmapError::MalformedLink { element, .. }) => assert!(element.contains("Nowhere")),
        other => panic!("expected MalformedLink, got {:?}", other),
    }
}

#[tokio::test]
async fn test_error_status_not_cached() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/",
        listing_page(r#"<a href="/st/">State</a>"#),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/st/"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server.uri(), temp_dir.path(), "");
    let cache = Arc::new(Cache::in_memory());
    let result = run_crawl(&config, Arc::clone(&cache), false).await;

    match result {
        Err(ShopmapError::TransportFailure { url, message }) => {
            assert!(url.ends_with("/st/"));
            assert!(message.contains("503"));
        }
        other => panic!("expected TransportFailure, got {:?}", other),
    }

    let region = format!("{}/st/", mock_server.uri());
    assert_eq!(cache.get(&region).unwrap(), None);
}

#[tokio::test]
async fn test_concurrent_subregions_keep_page_order() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/",
        listing_page(r#"<a href="/st/">State</a>"#),
        1,
    )
    .await;
    mount_page(
        &mock_server,
        "/st/",
        listing_page(
            r#"<a href="/st/a/">A</a><a href="/st/b/">B</a><a href="/st/c/">C</a>"#,
        ),
        1,
    )
    .await;

    // The first sub-region answers last
    for (index, name) in ["a", "b", "c"].iter().enumerate() {
        let delay = Duration::from_millis(200 - 80 * index as u64);
        Mock::given(method("GET"))
            .and(path(format!("/st/{}/", name)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(location_page(&store_json(
                        &format!("https://locations.example.com/st/{}/1", name),
                        &format!("{} Main St", index + 1),
                        &format!("+1 555-000-000{}", index + 1),
                    )))
                    .set_delay(delay),
            )
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"[{"lat": "41.0", "lon": "-87.0"}]"#),
        )
        .expect(3)
        .mount(&mock_server)
        .await;

    let extra = "[crawler]\nmax-concurrent-subregions = 3";
    let config = test_config(&mock_server.uri(), temp_dir.path(), extra);

    let shops = run_crawl(&config, Arc::new(Cache::in_memory()), false)
        .await
        .expect("crawl should succeed");

    let ids: Vec<&str> = shops.iter().map(|shop| shop.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "https://locations.example.com/st/a/1",
            "https://locations.example.com/st/b/1",
            "https://locations.example.com/st/c/1",
        ]
    );
}

#[tokio::test]
async fn test_crawl_to_csv() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/",
        listing_page(r#"<a href="/st/">State</a>"#),
        1,
    )
    .await;
    mount_page(
        &mock_server,
        "/st/",
        listing_page(r#"<a href="/st/town/">Town</a><a href="/st/town/">Town again</a>"#),
        1,
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
        1,
    )
    .await;
    mount_geocode(
        &mock_server,
        SYNTHESIZED_ADDRESS,
        r#"[{"lat": "41.0", "lon": "-87.0"}]"#,
        1,
    )
    .await;

    let config = test_config(&mock_server.uri(), temp_dir.path(), "");
    let shops = run_crawl(&config, Arc::new(Cache::in_memory()), false)
        .await
        .expect("crawl should succeed");

    // The sub-region is linked twice; the second visit is served from cache
    assert_eq!(shops.len(), 2);
    let shops = dedup_by_id(shops);
    assert_eq!(shops.len(), 1);

    let csv_path = Path::new(&config.output.csv_path);
    write_shops_csv(csv_path, &shops).unwrap();

    let content = std::fs::read_to_string(csv_path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with(r#""id","name","streetAddress""#));
    assert!(lines[1].ends_with(r#""+1 555-000-0000","41.0","-87.0""#));
}

#[tokio::test]
async fn test_body_decoded_with_declared_charset() {
    let mock_server = MockServer::start().await;

    // "Café" in ISO-8859-1 is not valid UTF-8
    Mock::given(method("GET"))
        .and(path("/latin1/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"<p>Caf\xe9</p>".to_vec())
                .insert_header("content-type", "text/html; charset=iso-8859-1"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let cache = Arc::new(Cache::in_memory());
    let client = build_http_client(&CrawlerConfig::default()).unwrap();
    let fetcher = Fetcher::new(client, Arc::clone(&cache), "shopmap-test-browser").unwrap();

    let url = format!("{}/latin1/", mock_server.uri());
    let body = fetcher.get(&url).await.expect("body should decode");

    assert_eq!(body, "<p>Caf\u{e9}</p>");
    assert_eq!(cache.get(&url).unwrap().as_deref(), Some("<p>Caf\u{e9}</p>"));
}
