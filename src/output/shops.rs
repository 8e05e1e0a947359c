use crate::config::has_csv_extension;
use crate::model::ShopRecord;
use crate::{ConfigError, Result};
use csv::{QuoteStyle, WriterBuilder};
use std::collections::HashSet;
use std::path::Path;

/// Writes `shops` as CSV with every field quoted
///
/// The header row is always written, even for an empty list, and columns
/// follow [`ShopRecord::FIELDS`]. Parent directories are created as needed.
///
/// # Returns
///
/// * `Ok(usize)` - Number of rows written, excluding the header
/// * `Err(ShopmapError)` - The path does not end in `.csv` or writing failed
pub fn write_shops_csv(path: &Path, shops: &[ShopRecord]) -> Result<usize> {
    if !has_csv_extension(path) {
        return Err(ConfigError::Validation(format!(
            "output path must end in .csv: {}",
            path.display()
        ))
        .into());
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Always)
        .from_path(path)?;

    writer.write_record(ShopRecord::FIELDS)?;
    for shop in shops {
        writer.serialize(shop)?;
    }
    writer.flush()?;

    tracing::info!("Wrote {} stores to {}", shops.len(), path.display());
    Ok(shops.len())
}

/// Keeps the first record for every `id`, preserving order
pub fn dedup_by_id(shops: Vec<ShopRecord>) -> Vec<ShopRecord> {
    let mut seen = HashSet::with_capacity(shops.len());

    shops
        .into_iter()
        .filter(|shop| {
            let first = seen.insert(shop.id.clone());
            if !first {
                tracing::warn!("Dropping duplicate store {} ({})", shop.id, shop.name);
            }
            first
        })
        .collect()
}
