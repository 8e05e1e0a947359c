//! Fixtures shared by the integration tests
//!
//! The mock site mirrors the markup the default selectors expect: listing
//! pages hold their anchors in the second column of `#contentbegin`, and
//! location pages carry one JSON script block per store.

use shopmap::config::{parse_config, Config};
use std::path::Path;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TELEPHONE: &str = "+1 555-000-0000";
pub const SYNTHESIZED_ADDRESS: &str = "1 Main St, Town, ST 00001";

/// Builds a validated config pointing at the mock server
pub fn test_config(server_uri: &str, dir: &Path, extra: &str) -> Config {
    let content = format!(
        r#"
[site]
root-url = "{server}"
expected-total = 4
user-agent = "shopmap-test-browser"

[geocoder]
endpoint = "{server}/search"
user-agent = "shopmap-test-geocoder"

[cache]
path = "{dir}/cache.db"

[output]
csv-path = "{dir}/shops.csv"

{extra}
"#,
        server = server_uri,
        dir = dir.display(),
        extra = extra,
    );

    parse_config(&content).expect("test config should be valid")
}

pub fn listing_page(anchors: &str) -> String {
    format!(
        r#"<html><body><div id="contentbegin"><div><div><div>
            <div><h1>Locations</h1></div>
            <div><div><div>{}</div></div></div>
        </div></div></div></div></body></html>"#,
        anchors
    )
}

pub fn location_page(scripts: &str) -> String {
    format!(
        r#"<html><body><div id="contentbegin"><div>
            <div>intro</div>
            <div><div>{}</div></div>
        </div></div></body></html>"#,
        scripts
    )
}

pub fn store_json(id: &str, street: &str, telephone: &str) -> String {
    format!(
        r#"<script type="application/ld+json">{{
            "@context": "https://schema.org",
            "@type": "PostalAddress",
            "@id": "{}",
            "name": "Main Street Market",
            "streetAddress": "{}",
            "addressLocality": "Town",
            "addressRegion": "ST",
            "postalCode": "00001",
            "addressCountry": "US",
            "telephone": "{}"
        }}</script>"#,
        id, street, telephone
    )
}

/// Mounts an HTML page at `route`, expecting exactly `hits` requests
pub async fn mount_page(server: &MockServer, route: &str, body: String, hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .expect(hits)
        .mount(server)
        .await;
}

/// Mounts a geocoder answer for `address`, expecting exactly `hits` requests
pub async fn mount_geocode(server: &MockServer, address: &str, body: &str, hits: u64) {
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", address))
        .and(query_param("format", "json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body.to_string())
                .insert_header("content-type", "application/json"),
        )
        .expect(hits)
        .mount(server)
        .await;
}

/// One region, one sub-region, one store
pub async fn mount_single_store_site(server: &MockServer, hits: u64) {
    mount_page(
        server,
        "/",
        listing_page(r#"<a href="/st/">State</a>"#),
        hits,
    )
    .await;
    mount_page(
        server,
        "/st/",
        listing_page(r#"<a href="/st/town/">Town</a>"#),
        hits,
    )
    .await;
    mount_page(
        server,
        "/st/town/",
        location_page(&store_json(
            "https://locations.example.com/st/town/1",
            "1 Main St, Suite 2",
            TELEPHONE,
        )),
        hits,
    )
    .await;
}
