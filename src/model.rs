//! Domain records flowing through the pipeline
//!
//! A location page yields [`PostalAddressRecord`]s, the resolver picks one
//! [`ResolvedAddress`] per record and geocodes it into a [`Coordinate`], and
//! the two are merged into the terminal [`ShopRecord`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// One `PostalAddress` structured-data block from a location page
///
/// See <https://schema.org/PostalAddress>. The JSON keys are the schema.org
/// names; `@context` and `@type` are optional, but when `@type` is present it
/// must be `PostalAddress`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PostalAddressRecord {
    #[serde(rename = "@type", default)]
    pub schema_type: Option<String>,

    /// Stable external identifier (the store page URL on the target site)
    #[serde(rename = "@id")]
    pub id: String,

    pub name: String,

    #[serde(rename = "streetAddress")]
    pub street_address: String,

    #[serde(rename = "addressLocality")]
    pub locality: String,

    #[serde(rename = "addressRegion")]
    pub region: String,

    #[serde(rename = "postalCode")]
    pub postal_code: String,

    #[serde(rename = "addressCountry")]
    pub country: String,

    /// Also the lookup key into the override table
    pub telephone: String,
}

/// The free-text address chosen for geocoding a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedAddress {
    /// Hand-verified address from the override table, used verbatim
    Override(String),

    /// Address assembled from the record's own fields
    Synthesized(String),
}

impl ResolvedAddress {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Override(address) | Self::Synthesized(address) => address,
        }
    }

    pub fn is_override(&self) -> bool {
        matches!(self, Self::Override(_))
    }
}

impl fmt::Display for ResolvedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// A store with its coordinate resolved
///
/// Serialized field order is fixed: existing consumers read the rows
/// positionally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "streetAddress")]
    pub street_address: String,
    #[serde(rename = "addressLocality")]
    pub locality: String,
    #[serde(rename = "addressRegion")]
    pub region: String,
    #[serde(rename = "postalCode")]
    pub postal_code: String,
    #[serde(rename = "addressCountry")]
    pub country: String,
    pub telephone: String,
    pub lat: f64,
    pub long: f64,
}

impl ShopRecord {
    /// Column names in output order
    pub const FIELDS: [&'static str; 10] = [
        "id",
        "name",
        "streetAddress",
        "addressLocality",
        "addressRegion",
        "postalCode",
        "addressCountry",
        "telephone",
        "lat",
        "long",
    ];

    /// Merges an extracted record with its resolved coordinate
    pub fn from_parts(record: PostalAddressRecord, coordinate: Coordinate) -> Self {
        Self {
            id: record.id,
            name: record.name,
            street_address: record.street_address,
            locality: record.locality,
            region: record.region,
            postal_code: record.postal_code,
            country: record.country,
            telephone: record.telephone,
            lat: coordinate.latitude,
            long: coordinate.longitude,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.long)
    }
}
