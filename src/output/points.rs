//! Weighted map points read from a shop CSV
//!
//! A point provider is built once from a CSV file and then handed to whatever
//! draws the map. The column names for latitude, longitude and the optional
//! label are configurable so other CSV layouts can be plotted too.

use crate::config::has_csv_extension;
use crate::model::Coordinate;
use crate::{Result, ShopmapError};
use csv::{ReaderBuilder, StringRecord};
use std::path::Path;

/// A single weighted point
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub coordinate: Coordinate,
    pub weight: f64,
    pub label: Option<String>,
}

/// Source of points for a map layer
pub trait PointProvider {
    fn points(&self) -> &[Point];

    fn len(&self) -> usize {
        self.points().len()
    }

    fn is_empty(&self) -> bool {
        self.points().is_empty()
    }

    /// Mean coordinate of every point, `None` when there are none
    fn center(&self) -> Option<Coordinate> {
        centroid(self.points())
    }
}

/// Points loaded once and kept in memory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticPoints {
    points: Vec<Point>,
}

impl StaticPoints {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }
}

impl PointProvider for StaticPoints {
    fn points(&self) -> &[Point] {
        &self.points
    }
}

/// Which columns hold the coordinate and label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub lat: String,
    pub lon: String,
    pub label: Option<String>,
}

impl Default for ColumnMapping {
    /// The layout written by [`write_shops_csv`](crate::output::write_shops_csv)
    fn default() -> Self {
        Self {
            lat: "lat".to_string(),
            lon: "long".to_string(),
            label: Some("name".to_string()),
        }
    }
}

/// How much each point counts
#[derive(Debug, Clone, PartialEq)]
pub enum Weight {
    Constant(f64),
    /// Read from the named numeric column
    Column(String),
}

impl Default for Weight {
    fn default() -> Self {
        Weight::Constant(1.0)
    }
}

/// Column indices resolved against the header row
struct Columns {
    lat: usize,
    lon: usize,
    label: Option<usize>,
    weight: Option<usize>,
}

/// Reads every row of `path` into a [`StaticPoints`]
///
/// Rows whose fields are all blank are skipped. A path without a `.csv`
/// extension, a missing header, a missing mapped column, a row with the wrong
/// number of fields, or a non-numeric coordinate or weight all fail the whole
/// import.
pub fn load_points(path: &Path, mapping: &ColumnMapping, weight: &Weight) -> Result<StaticPoints> {
    let import_error = |message: String| ShopmapError::PointImport {
        path: path.display().to_string(),
        message,
    };

    if !has_csv_extension(path) {
        return Err(import_error("not a .csv file".to_string()));
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(import_error("missing header row".to_string()));
    }

    let find = |name: &str| {
        headers
            .iter()
            .position(|header| header.trim() == name)
            .ok_or_else(|| import_error(format!("no column named '{}'", name)))
    };

    let columns = Columns {
        lat: find(&mapping.lat)?,
        lon: find(&mapping.lon)?,
        label: mapping.label.as_deref().map(find).transpose()?,
        weight: match weight {
            Weight::Column(name) => Some(find(name)?),
            Weight::Constant(_) => None,
        },
    };

    let mut points = Vec::new();

    for row in reader.records() {
        let row = row.map_err(|e| import_error(e.to_string()))?;
        if row.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let number = |index: usize| parse_number(&row, index, &headers, &import_error);

        let coordinate = Coordinate::new(number(columns.lat)?, number(columns.lon)?);
        let point_weight = match (weight, columns.weight) {
            (Weight::Constant(value), _) => *value,
            (Weight::Column(_), Some(index)) => number(index)?,
            (Weight::Column(name), None) => {
                return Err(import_error(format!("no column named '{}'", name)))
            }
        };
        let label = columns
            .label
            .and_then(|index| row.get(index))
            .map(str::to_string);

        points.push(Point {
            coordinate,
            weight: point_weight,
            label,
        });
    }

    tracing::debug!("Loaded {} points from {}", points.len(), path.display());
    Ok(StaticPoints::new(points))
}

fn parse_number(
    row: &StringRecord,
    index: usize,
    headers: &StringRecord,
    import_error: &impl Fn(String) -> ShopmapError,
) -> Result<f64> {
    let line = row.position().map(|p| p.line()).unwrap_or_default();
    let column = headers.get(index).unwrap_or_default();
    let raw = row.get(index).unwrap_or_default();

    raw.trim().parse().map_err(|_| {
        import_error(format!(
            "line {}: '{}' is not a number in column '{}'",
            line, raw, column
        ))
    })
}

/// Mean latitude and longitude of `points`
pub fn centroid(points: &[Point]) -> Option<Coordinate> {
    if points.is_empty() {
        return None;
    }

    let count = points.len() as f64;
    let (lat_sum, lon_sum) = points.iter().fold((0.0, 0.0), |(lat, lon), point| {
        (lat + point.coordinate.latitude, lon + point.coordinate.longitude)
    });

    Some(Coordinate::new(lat_sum / count, lon_sum / count))
}
