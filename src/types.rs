use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::grid::LinearSpace;

/// Polarization channels carried by PALSAR image files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarization {
    HH,
    HV,
    VH,
    VV,
}

impl std::fmt::Display for Polarization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Polarization::HH => write!(f, "HH"),
            Polarization::HV => write!(f, "HV"),
            Polarization::VH => write!(f, "VH"),
            Polarization::VV => write!(f, "VV"),
        }
    }
}

impl std::str::FromStr for Polarization {
    type Err = SarError;

    fn from_str(s: &str) -> SarResult<Self> {
        match s.to_uppercase().as_str() {
            "HH" => Ok(Polarization::HH),
            "HV" => Ok(Polarization::HV),
            "VH" => Ok(Polarization::VH),
            "VV" => Ok(Polarization::VV),
            _ => Err(SarError::Format(format!("Invalid polarization: {}", s))),
        }
    }
}

/// Orbit state vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    pub position: [f64; 3],  // [x, y, z] in meters
    pub velocity: [f64; 3],  // [vx, vy, vz] in m/s
}

impl StateVector {
    pub fn new(position: [f64; 3], velocity: [f64; 3]) -> Self {
        Self { position, velocity }
    }

    /// Build from a `[x, y, z, vx, vy, vz]` tuple
    pub fn from_components(c: [f64; 6]) -> Self {
        Self {
            position: [c[0], c[1], c[2]],
            velocity: [c[3], c[4], c[5]],
        }
    }

    pub fn components(&self) -> [f64; 6] {
        let p = self.position;
        let v = self.velocity;
        [p[0], p[1], p[2], v[0], v[1], v[2]]
    }
}

/// Geospatial transformation parameters (GDAL ordering)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Build from the six-element GDAL geotransform array
    pub fn from_gdal(gt: [f64; 6]) -> Self {
        Self {
            top_left_x: gt[0],
            pixel_width: gt[1],
            rotation_x: gt[2],
            top_left_y: gt[3],
            rotation_y: gt[4],
            pixel_height: gt[5],
        }
    }

    /// Column axis of a north-up raster
    pub fn x_space(&self) -> LinearSpace<f64> {
        LinearSpace::new(self.top_left_x, self.pixel_width)
    }

    /// Row axis of a north-up raster (spacing is negative for north-up)
    pub fn y_space(&self) -> LinearSpace<f64> {
        LinearSpace::new(self.top_left_y, self.pixel_height)
    }

    pub fn is_north_up(&self) -> bool {
        self.rotation_x == 0.0 && self.rotation_y == 0.0
    }
}

/// Error types for SAR geolocation
#[derive(Debug, thiserror::Error)]
pub enum SarError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Field format error: {0}")]
    Format(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Product structure error: {0}")]
    ProductStructure(String),

    #[error("Root finding failed after {iterations} iterations: {reason}")]
    RootFinding { iterations: usize, reason: String },

    #[error("Invalid orbit: {0}")]
    InvalidOrbit(String),

    #[error("Processing error: {0}")]
    Processing(String),
}

/// Result type for SAR operations
pub type SarResult<T> = Result<T, SarError>;

/// UTC instant from a year, a 1-based day of year and seconds into that day.
pub(crate) fn utc_from_day_of_year(year: i32, day_of_year: u32, seconds_of_day: f64) -> SarResult<DateTime<Utc>> {
    let date = NaiveDate::from_yo_opt(year, day_of_year)
        .ok_or_else(|| SarError::Format(format!("Invalid day of year: {}-{:03}", year, day_of_year)))?;

    if !seconds_of_day.is_finite() || seconds_of_day < 0.0 {
        return Err(SarError::Format(format!("Invalid seconds of day: {}", seconds_of_day)));
    }

    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| SarError::Format(format!("Invalid date: {}", date)))?;
    let offset = Duration::nanoseconds((seconds_of_day * 1e9).round() as i64);

    Ok(DateTime::from_naive_utc_and_offset(midnight + offset, Utc))
}

/// Signed difference `later - earlier` in seconds
pub(crate) fn seconds_between(later: DateTime<Utc>, earlier: DateTime<Utc>) -> f64 {
    let delta = later - earlier;
    match delta.num_nanoseconds() {
        Some(ns) => ns as f64 / 1e9,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}
