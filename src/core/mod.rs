//! Core geolocation modules

pub mod ellipsoid;
pub mod geocode;
pub mod geolocation;
pub mod grid;
pub mod orbit;
pub mod range_doppler;

// Re-export main types
pub use ellipsoid::{Ellipsoid, WGS84};
pub use geocode::{
    CellOutcome, DemRaster, GeocodeConfig, GeocodeStats, GeocodedImage, Geocoder, OutputGrid, Resampling,
};
pub use geolocation::{PalsarProduct, RadarPixel, SPEED_OF_LIGHT};
pub use grid::{Interval, LinearSpace};
pub use orbit::Orbit;
pub use range_doppler::{RadarCoordinate, RangeDopplerSolver, SolverConfig, SolverMethod};
