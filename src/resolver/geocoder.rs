//! Geocoding through a Nominatim-style search endpoint
//!
//! The endpoint takes `q=<free text>&format=json` and answers with a JSON
//! array of hits, best first, each carrying `lat` and `lon` as strings.

use crate::crawler::{header_value, Fetcher};
use crate::model::Coordinate;
use crate::{Result, ShopmapError};
use reqwest::header::{HeaderMap, USER_AGENT};
use serde::Deserialize;
use url::Url;

/// One search hit; every other field is ignored
#[derive(Debug, Deserialize)]
struct GeocodeHit {
    lat: String,
    lon: String,
}

/// Geocoder client; responses are cached by full query URL
#[derive(Clone)]
pub struct Geocoder {
    fetcher: Fetcher,
    endpoint: Url,
    headers: HeaderMap,
}

impl Geocoder {
    pub fn new(fetcher: Fetcher, endpoint: Url, user_agent: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value(user_agent)?);

        Ok(Self {
            fetcher,
            endpoint,
            headers,
        })
    }

    /// The query URL for `address`; also its cache key
    pub fn query_url(&self, address: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", address)
            .append_pair("format", "json");
        url
    }

    /// Geocodes `address`, trusting the service's first hit
    ///
    /// # Errors
    ///
    /// * `UnresolvableAddress` - the service returned no hits
    /// * `SchemaMismatch` - the response is not a list of `lat`/`lon` hits
    /// * `TransportFailure` - the request itself failed
    pub async fn geocode(&self, address: &str) -> Result<Coordinate> {
        let url = self.query_url(address);
        let body = self
            .fetcher
            .get_with_headers(url.as_str(), &self.headers)
            .await?;

        parse_response(&body, url.as_str())?.ok_or_else(|| ShopmapError::UnresolvableAddress {
            address: address.to_string(),
        })
    }
}

/// Parses a search response; `None` when there are no hits
pub fn parse_response(body: &str, query_url: &str) -> Result<Option<Coordinate>> {
    let mismatch = |message: String| ShopmapError::SchemaMismatch {
        origin: query_url.to_string(),
        message,
    };

    let hits: Vec<GeocodeHit> = serde_json::from_str(body).map_err(|e| mismatch(e.to_string()))?;

    let Some(first) = hits.into_iter().next() else {
        return Ok(None);
    };

    let latitude: f64 = first
        .lat
        .trim()
        .parse()
        .map_err(|_| mismatch(format!("lat is not a number: {}", first.lat)))?;
    let longitude: f64 = first
        .lon
        .trim()
        .parse()
        .map_err(|_| mismatch(format!("lon is not a number: {}", first.lon)))?;

    Ok(Some(Coordinate::new(latitude, longitude)))
}
