//! Backward geocoding of an SLC onto a regular longitude/latitude grid
//!
//! For every output cell the DEM height is looked up, the ground point is
//! converted to ECEF and solved for its zero-Doppler position in the image.
//! The solve is seeded with the azimuth time of the previous cell in the same
//! row, so rows are independent and can run in parallel.

use std::convert::Infallible;
use std::str::FromStr;

use ndarray::{Array2, ArrayView2};
use num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::core::geolocation::{PalsarProduct, RadarPixel};
use crate::core::grid::{Interval, LinearSpace};
use crate::core::range_doppler::{RangeDopplerSolver, SolverConfig};
use crate::types::{GeoTransform, SarError, SarResult};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// How the SLC is sampled at a fractional image position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resampling {
    Nearest,
    Bilinear,
}

impl Default for Resampling {
    fn default() -> Self {
        Resampling::Nearest
    }
}

/// Case-insensitive; unknown names fall back to nearest
impl FromStr for Resampling {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "nearest" | "nn" => Resampling::Nearest,
            "bilinear" | "linear" => Resampling::Bilinear,
            _ => Resampling::Nearest,
        })
    }
}

/// Geocoding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeConfig {
    pub resampling: Resampling,
    /// Process rows on the rayon pool (ignored without the `parallel` feature)
    pub parallel: bool,
    pub solver: SolverConfig,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            resampling: Resampling::Nearest,
            parallel: cfg!(feature = "parallel"),
            solver: SolverConfig::default(),
        }
    }
}

/// Regular geographic output grid, cell centres at `start + i * spacing` degrees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputGrid {
    pub lon_start: f64,
    pub lat_start: f64,
    pub lon_spacing: f64,
    /// Usually negative (north-up)
    pub lat_spacing: f64,
    pub width: usize,
    pub height: usize,
}

impl OutputGrid {
    pub fn lon_space(&self) -> LinearSpace<f64> {
        LinearSpace::new(self.lon_start, self.lon_spacing)
    }

    pub fn lat_space(&self) -> LinearSpace<f64> {
        LinearSpace::new(self.lat_start, self.lat_spacing)
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// GDAL-style transform of the cell corners
    pub fn geo_transform(&self) -> GeoTransform {
        GeoTransform {
            top_left_x: self.lon_start - 0.5 * self.lon_spacing,
            pixel_width: self.lon_spacing,
            rotation_x: 0.0,
            top_left_y: self.lat_start - 0.5 * self.lat_spacing,
            rotation_y: 0.0,
            pixel_height: self.lat_spacing,
        }
    }
}

/// Borrowed DEM raster with heights above the ellipsoid in meters
#[derive(Debug, Clone)]
pub struct DemRaster<'a> {
    heights: ArrayView2<'a, f32>,
    transform: GeoTransform,
    nodata: Option<f32>,
}

impl<'a> DemRaster<'a> {
    pub fn new(heights: ArrayView2<'a, f32>, transform: GeoTransform, nodata: Option<f32>) -> SarResult<Self> {
        if heights.is_empty() {
            return Err(SarError::Processing("DEM raster is empty".to_string()));
        }
        if !transform.is_north_up() {
            return Err(SarError::Processing(
                "Rotated DEM geotransforms are not supported".to_string(),
            ));
        }
        Ok(Self {
            heights,
            transform,
            nodata,
        })
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Height of the DEM cell containing (lon, lat)
    pub fn height_at(&self, lon: f64, lat: f64) -> Result<f64, CellOutcome> {
        let (rows, cols) = self.heights.dim();
        let col = self.transform.x_space().index_of(lon);
        let row = self.transform.y_space().index_of(lat);

        if !(Interval::extent(cols).half_open_contains(col) && Interval::extent(rows).half_open_contains(row)) {
            return Err(CellOutcome::OutsideDem);
        }

        let h = self.heights[[row.floor() as usize, col.floor() as usize]];
        if h.is_nan() || self.nodata == Some(h) {
            return Err(CellOutcome::NoData);
        }
        Ok(h as f64)
    }
}

/// What happened to one output cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellOutcome {
    Sampled,
    OutsideDem,
    NoData,
    /// Solved, but the image position is outside the image
    OutsideImage,
    NoConvergence,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeocodeStats {
    pub sampled: usize,
    pub outside_dem: usize,
    pub no_data: usize,
    pub outside_image: usize,
    pub no_convergence: usize,
}

impl GeocodeStats {
    fn record(&mut self, outcome: CellOutcome) {
        match outcome {
            CellOutcome::Sampled => self.sampled += 1,
            CellOutcome::OutsideDem => self.outside_dem += 1,
            CellOutcome::NoData => self.no_data += 1,
            CellOutcome::OutsideImage => self.outside_image += 1,
            CellOutcome::NoConvergence => self.no_convergence += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.sampled + self.outside_dem + self.no_data + self.outside_image + self.no_convergence
    }

    /// Fraction of cells with a sampled value, in percent
    pub fn coverage(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            n => self.sampled as f64 / n as f64 * 100.0,
        }
    }
}

/// Geocoded amplitude with per-cell validity
#[derive(Debug, Clone)]
pub struct GeocodedImage {
    /// SLC amplitude, 0.0 where not valid
    pub amplitude: Array2<f32>,
    pub valid: Array2<bool>,
    pub outcomes: Array2<CellOutcome>,
    pub stats: GeocodeStats,
}

/// Row of cell results
type RowResult = (Vec<f32>, Vec<CellOutcome>);

/// Backward geocoder for one product
pub struct Geocoder<'p> {
    product: &'p PalsarProduct,
    solver: RangeDopplerSolver,
    config: GeocodeConfig,
}

impl<'p> Geocoder<'p> {
    pub fn new(product: &'p PalsarProduct, config: GeocodeConfig) -> Self {
        Self {
            product,
            solver: RangeDopplerSolver::new(config.solver.clone()),
            config,
        }
    }

    pub fn config(&self) -> &GeocodeConfig {
        &self.config
    }

    /// Geocode `slc` (lines x samples) onto `grid` using heights from `dem`
    pub fn geocode(
        &self,
        dem: &DemRaster<'_>,
        slc: ArrayView2<'_, Complex<f32>>,
        grid: &OutputGrid,
    ) -> SarResult<GeocodedImage> {
        if grid.width == 0 || grid.height == 0 {
            return Err(SarError::Processing(format!(
                "Empty output grid {}x{}",
                grid.width, grid.height
            )));
        }
        if slc.is_empty() {
            return Err(SarError::Processing("SLC raster is empty".to_string()));
        }
        if slc.ncols() != self.product.samples_per_line() {
            return Err(SarError::Processing(format!(
                "SLC has {} samples per line, product declares {}",
                slc.ncols(),
                self.product.samples_per_line()
            )));
        }

        log::info!(
            "Geocoding {}x{} SLC onto {}x{} grid ({:?} resampling)",
            slc.nrows(),
            slc.ncols(),
            grid.height,
            grid.width,
            self.config.resampling
        );
        let start = std::time::Instant::now();

        let rows = self.process_rows(dem, &slc, grid);

        let mut amplitude = Array2::zeros(grid.shape());
        let mut outcomes = Array2::from_elem(grid.shape(), CellOutcome::NoConvergence);
        let mut stats = GeocodeStats::default();
        for (i, (values, row_outcomes)) in rows.into_iter().enumerate() {
            for (j, (value, outcome)) in values.into_iter().zip(row_outcomes).enumerate() {
                amplitude[[i, j]] = value;
                outcomes[[i, j]] = outcome;
                stats.record(outcome);
            }
        }
        let valid = outcomes.mapv(|o| o == CellOutcome::Sampled);

        log::info!(
            "Geocoding completed in {:.2}s: {:.1}% coverage ({} outside DEM, {} no data, {} outside image, {} unsolved)",
            start.elapsed().as_secs_f64(),
            stats.coverage(),
            stats.outside_dem,
            stats.no_data,
            stats.outside_image,
            stats.no_convergence
        );

        Ok(GeocodedImage {
            amplitude,
            valid,
            outcomes,
            stats,
        })
    }

    #[cfg(feature = "parallel")]
    fn process_rows(
        &self,
        dem: &DemRaster<'_>,
        slc: &ArrayView2<'_, Complex<f32>>,
        grid: &OutputGrid,
    ) -> Vec<RowResult> {
        if self.config.parallel {
            log::debug!("Processing {} rows on {} threads", grid.height, rayon::current_num_threads());
            (0..grid.height)
                .into_par_iter()
                .map(|i| self.geocode_row(dem, slc, grid, i))
                .collect()
        } else {
            (0..grid.height).map(|i| self.geocode_row(dem, slc, grid, i)).collect()
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn process_rows(
        &self,
        dem: &DemRaster<'_>,
        slc: &ArrayView2<'_, Complex<f32>>,
        grid: &OutputGrid,
    ) -> Vec<RowResult> {
        (0..grid.height).map(|i| self.geocode_row(dem, slc, grid, i)).collect()
    }

    fn geocode_row(
        &self,
        dem: &DemRaster<'_>,
        slc: &ArrayView2<'_, Complex<f32>>,
        grid: &OutputGrid,
        row: usize,
    ) -> RowResult {
        let lat = grid.lat_space().value_at(row as f64);
        let lon_space = grid.lon_space();

        let mut values = Vec::with_capacity(grid.width);
        let mut outcomes = Vec::with_capacity(grid.width);
        let mut seed = None;

        for col in 0..grid.width {
            let lon = lon_space.value_at(col as f64);
            match self.geocode_point(dem, slc, lon, lat, &mut seed) {
                Ok(value) => {
                    values.push(value);
                    outcomes.push(CellOutcome::Sampled);
                }
                Err(outcome) => {
                    values.push(0.0);
                    outcomes.push(outcome);
                }
            }
        }
        (values, outcomes)
    }

    /// Amplitude at one ground point; `seed` carries the last solved azimuth time
    fn geocode_point(
        &self,
        dem: &DemRaster<'_>,
        slc: &ArrayView2<'_, Complex<f32>>,
        lon: f64,
        lat: f64,
        seed: &mut Option<f64>,
    ) -> Result<f32, CellOutcome> {
        let height = dem.height_at(lon, lat)?;

        let pixel = match self.product.geolocate(&self.solver, lon, lat, height, *seed) {
            Ok(pixel) => pixel,
            Err(e) => {
                log::trace!("No zero-Doppler solution at ({:.6}, {:.6}): {}", lon, lat, e);
                return Err(CellOutcome::NoConvergence);
            }
        };
        *seed = Some(pixel.azimuth_time);

        sample_amplitude(slc, &pixel, self.config.resampling).ok_or(CellOutcome::OutsideImage)
    }
}

/// SLC amplitude at a fractional image position, `None` outside the image
pub fn sample_amplitude(
    slc: &ArrayView2<'_, Complex<f32>>,
    pixel: &RadarPixel,
    resampling: Resampling,
) -> Option<f32> {
    let (lines, samples) = slc.dim();
    if !(Interval::extent(lines).half_open_contains(pixel.line)
        && Interval::extent(samples).half_open_contains(pixel.sample))
    {
        return None;
    }

    match resampling {
        Resampling::Nearest => Some(slc[[pixel.line.floor() as usize, pixel.sample.floor() as usize]].norm()),
        Resampling::Bilinear => {
            let l0 = pixel.line.floor() as usize;
            let s0 = pixel.sample.floor() as usize;
            let l1 = (l0 + 1).min(lines - 1);
            let s1 = (s0 + 1).min(samples - 1);
            let dl = (pixel.line - l0 as f64) as f32;
            let ds = (pixel.sample - s0 as f64) as f32;

            let top = slc[[l0, s0]].norm() * (1.0 - ds) + slc[[l0, s1]].norm() * ds;
            let bottom = slc[[l1, s0]].norm() * (1.0 - ds) + slc[[l1, s1]].norm() * ds;
            Some(top * (1.0 - dl) + bottom * dl)
        }
    }
}
