//! Reference ellipsoids and geodetic to ECEF conversion

use serde::{Deserialize, Serialize};

/// WGS84 reference ellipsoid as used by PALSAR orbit products
pub const WGS84: Ellipsoid = Ellipsoid::new(6378137.0, 0.0066943799901);

/// Oblate spheroid described by its equatorial radius and squared eccentricity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipsoid {
    /// Equatorial radius in meters
    semi_major_axis: f64,
    /// First eccentricity squared
    squared_eccentricity: f64,
}

impl Default for Ellipsoid {
    fn default() -> Self {
        WGS84
    }
}

impl Ellipsoid {
    pub const fn new(semi_major_axis: f64, squared_eccentricity: f64) -> Self {
        Self {
            semi_major_axis,
            squared_eccentricity,
        }
    }

    /// Construct from the semi-major axis and the (first) flattening
    pub fn from_flattening(semi_major_axis: f64, flattening: f64) -> Self {
        Self::new(semi_major_axis, flattening * (2.0 - flattening))
    }

    pub fn semi_major_axis(&self) -> f64 {
        self.semi_major_axis
    }

    pub fn squared_eccentricity(&self) -> f64 {
        self.squared_eccentricity
    }

    /// Polar radius
    pub fn semi_minor_axis(&self) -> f64 {
        self.semi_major_axis * (1.0 - self.squared_eccentricity).sqrt()
    }

    pub fn flattening(&self) -> f64 {
        1.0 - (1.0 - self.squared_eccentricity).sqrt()
    }

    /// Radius of curvature in the prime vertical (east direction) at `lat` radians
    pub fn east_radius(&self, lat: f64) -> f64 {
        let sin_lat = lat.sin();
        self.semi_major_axis / (1.0 - self.squared_eccentricity * sin_lat * sin_lat).sqrt()
    }

    /// Convert geodetic coordinates (radians, meters above the ellipsoid) to ECEF meters.
    ///
    /// Only meaningful for `|lat| <= pi/2`.
    pub fn geodetic_to_ecef(&self, lon: f64, lat: f64, height: f64) -> [f64; 3] {
        let re = self.east_radius(lat);
        let (sin_lat, cos_lat) = lat.sin_cos();
        let (sin_lon, cos_lon) = lon.sin_cos();

        let x = (re + height) * cos_lat * cos_lon;
        let y = (re + height) * cos_lat * sin_lon;
        let z = (re * (1.0 - self.squared_eccentricity) + height) * sin_lat;

        [x, y, z]
    }

    /// Same as [`Ellipsoid::geodetic_to_ecef`] with longitude/latitude in degrees
    pub fn geodetic_degrees_to_ecef(&self, lon_deg: f64, lat_deg: f64, height: f64) -> [f64; 3] {
        self.geodetic_to_ecef(lon_deg.to_radians(), lat_deg.to_radians(), height)
    }
}
