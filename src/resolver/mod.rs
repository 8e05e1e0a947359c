//! Address resolution
//!
//! Turns an extracted [`PostalAddressRecord`] into a [`Coordinate`]:
//! 1. pick the address string (override table first, then synthesis)
//! 2. geocode it through the cached geocoder
//! 3. take the first hit
//!
//! A record whose address cannot be geocoded is an error. There is no
//! fallback strategy; the fix is a new override entry and a rerun.

mod address;
mod geocoder;
mod overrides;

pub use address::{choose_address, synthesize_address};
pub use geocoder::{parse_response, Geocoder};
pub use overrides::OverrideTable;

use crate::model::{Coordinate, PostalAddressRecord, ResolvedAddress, ShopRecord};
use crate::Result;
use std::sync::Arc;

/// Resolves records to coordinates
#[derive(Clone)]
pub struct AddressResolver {
    overrides: Arc<OverrideTable>,
    geocoder: Geocoder,
}

impl AddressResolver {
    pub fn new(overrides: Arc<OverrideTable>, geocoder: Geocoder) -> Self {
        Self {
            overrides,
            geocoder,
        }
    }

    pub fn overrides(&self) -> &OverrideTable {
        &self.overrides
    }

    /// The address that will be geocoded for `record`
    pub fn address_for(&self, record: &PostalAddressRecord) -> ResolvedAddress {
        choose_address(record, &self.overrides)
    }

    /// Resolves the coordinate of `record`
    pub async fn resolve(&self, record: &PostalAddressRecord) -> Result<Coordinate> {
        let address = self.address_for(record);

        if address.is_override() {
            tracing::debug!("Using override address for {}: {}", record.telephone, address);
        }

        self.geocoder.geocode(address.as_str()).await
    }

    /// Geocodes a free-text address directly, bypassing the override table
    pub async fn resolve_text(&self, address: &str) -> Result<Coordinate> {
        self.geocoder.geocode(address).await
    }

    /// Resolves `record` and merges it into a [`ShopRecord`]
    pub async fn resolve_shop(&self, record: PostalAddressRecord) -> Result<ShopRecord> {
        let coordinate = self.resolve(&record).await?;
        Ok(ShopRecord::from_parts(record, coordinate))
    }
}
