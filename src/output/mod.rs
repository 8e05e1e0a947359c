//! Output module for crawl results
//!
//! This module handles:
//! - Writing the shop list as CSV for downstream consumers
//! - Dropping duplicate stores before they are written
//! - Reading a shop CSV back as weighted map points

mod points;
mod shops;

pub use points::{centroid, load_points, ColumnMapping, Point, PointProvider, StaticPoints, Weight};
pub use shops::{dedup_by_id, write_shops_csv};
