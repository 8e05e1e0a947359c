//! Choosing the address string to geocode

use crate::model::{PostalAddressRecord, ResolvedAddress};
use crate::resolver::OverrideTable;

/// Picks the address to geocode for a record
///
/// An override for the record's telephone always wins and is used verbatim.
/// Otherwise the address is synthesized from the record's fields.
pub fn choose_address(record: &PostalAddressRecord, overrides: &OverrideTable) -> ResolvedAddress {
    match overrides.get(&record.telephone) {
        Some(address) => ResolvedAddress::Override(address.to_string()),
        None => ResolvedAddress::Synthesized(synthesize_address(record)),
    }
}

/// Builds `"<street>, <locality>, <region> <postal code>"`
///
/// Only the first comma-separated segment of the street address is kept:
/// suite and unit numbers after it confuse the geocoder.
pub fn synthesize_address(record: &PostalAddressRecord) -> String {
    let street = record
        .street_address
        .split(',')
        .next()
        .unwrap_or_default();

    format!(
        "{}, {}, {} {}",
        street, record.locality, record.region, record.postal_code
    )
}
