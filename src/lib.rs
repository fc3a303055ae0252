//! sarloc: zero-Doppler geolocation for ALOS PALSAR CEOS products
//!
//! Decodes the leader and image records of a PALSAR level 1.1 product, builds a
//! continuous orbit model from its state vectors and maps ground points to
//! radar image coordinates (azimuth time and slant range, then line and sample).
//!
//! ```no_run
//! use sarloc::{PalsarProduct, RangeDopplerSolver};
//!
//! # fn main() -> sarloc::SarResult<()> {
//! let product = PalsarProduct::open("/data/ALPSRP176000660-H1.1__A")?;
//! let solver = RangeDopplerSolver::default();
//! let pixel = product.geolocate(&solver, 138.73, 35.36, 3776.0, None)?;
//! println!("line {:.1}, sample {:.1}", pixel.line, pixel.sample);
//! # Ok(())
//! # }
//! ```

pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{GeoTransform, Polarization, SarError, SarResult, StateVector};

pub use io::{ProductFiles, SignalDataRecord, PlatformPositionRecord, DatasetSummary, FileDescriptor};

pub use crate::core::{
    CellOutcome, DemRaster, Ellipsoid, GeocodeConfig, GeocodeStats, GeocodedImage, Geocoder, Interval,
    LinearSpace, Orbit, OutputGrid, PalsarProduct, RadarCoordinate, RadarPixel, RangeDopplerSolver,
    Resampling, SolverConfig, SolverMethod, WGS84,
};
