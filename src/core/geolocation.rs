//! Product-level geolocation: one PALSAR product as an orbit plus radar grids

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::ellipsoid::{Ellipsoid, WGS84};
use crate::core::grid::LinearSpace;
use crate::core::orbit::Orbit;
use crate::core::range_doppler::{RadarCoordinate, RangeDopplerSolver};
use crate::io::leader::{parse_leader, DatasetSummary, FileDescriptor, PlatformPositionRecord};
use crate::io::product::ProductFiles;
use crate::io::signal_data::{
    parse_first_signal_record, SignalDataRecord, SIGNAL_DATA_OFFSET, SIGNAL_DATA_PREFIX_LENGTH,
};
use crate::types::{seconds_between, Polarization, SarResult};

/// Speed of light in vacuum, m/s
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Fractional image position of a ground point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadarPixel {
    /// Fractional line (azimuth) index
    pub line: f64,
    /// Fractional sample (range) index
    pub sample: f64,
    /// Seconds since the first image line
    pub azimuth_time: f64,
    /// Meters
    pub slant_range: f64,
}

/// Decoded PALSAR level 1.1 product ready for geolocation
#[derive(Debug, Clone)]
pub struct PalsarProduct {
    files: Option<ProductFiles>,
    image_path: Option<PathBuf>,
    file_descriptor: FileDescriptor,
    dataset_summary: DatasetSummary,
    platform: PlatformPositionRecord,
    signal_data: SignalDataRecord,
    sensing_start: DateTime<Utc>,
    orbit: Orbit,
    ellipsoid: Ellipsoid,
}

impl PalsarProduct {
    /// Open the product in `dir`, using the first image file by name
    pub fn open<P: AsRef<Path>>(dir: P) -> SarResult<Self> {
        let files = ProductFiles::discover(dir)?;
        let image = files.primary_image()?.clone();
        if files.images.len() > 1 {
            log::warn!(
                "Product has {} image files, using {}",
                files.images.len(),
                image.path.display()
            );
        }

        let mut product = Self::from_files(&files.leader, &image.path)?;
        product.files = Some(files);
        Ok(product)
    }

    /// Open the product in `dir`, using the image of one polarization
    pub fn open_polarization<P: AsRef<Path>>(dir: P, polarization: Polarization) -> SarResult<Self> {
        let files = ProductFiles::discover(dir)?;
        let image = files.image(polarization)?.clone();
        let mut product = Self::from_files(&files.leader, &image.path)?;
        product.files = Some(files);
        Ok(product)
    }

    /// Decode an explicit leader/image file pair.
    ///
    /// The leader is read completely; only the descriptor and the first
    /// signal data prefix of the image file are read.
    pub fn from_files<P: AsRef<Path>, Q: AsRef<Path>>(leader: P, image: Q) -> SarResult<Self> {
        log::info!("Loading PALSAR leader {}", leader.as_ref().display());
        let leader_bytes = std::fs::read(leader.as_ref())?;

        let mut image_bytes = Vec::with_capacity(SIGNAL_DATA_OFFSET + SIGNAL_DATA_PREFIX_LENGTH);
        File::open(image.as_ref())?
            .take((SIGNAL_DATA_OFFSET + SIGNAL_DATA_PREFIX_LENGTH) as u64)
            .read_to_end(&mut image_bytes)?;

        let mut product = Self::from_bytes(&leader_bytes, &image_bytes)?;
        product.image_path = Some(image.as_ref().to_path_buf());
        Ok(product)
    }

    /// Decode a product from in-memory leader and image file contents
    pub fn from_bytes(leader: &[u8], image: &[u8]) -> SarResult<Self> {
        let (file_descriptor, dataset_summary, platform) = parse_leader(leader)?;
        let signal_data = parse_first_signal_record(image)?;

        let sensing_start = signal_data.sensing_start()?;
        let epoch = platform.epoch()?;
        let orbit_start = seconds_between(epoch, sensing_start);
        let orbit = Orbit::new(orbit_start, platform.time_interval, platform.state_vectors.clone())?;

        let product = Self {
            files: None,
            image_path: None,
            file_descriptor,
            dataset_summary,
            platform,
            signal_data,
            sensing_start,
            orbit,
            ellipsoid: WGS84,
        };

        let (t0, t1) = product.orbit.time_bounds();
        log::info!(
            "PALSAR product: sensing start {}, PRF {:.3} Hz, range sampling {:.3} MHz, {} samples/line",
            product.sensing_start,
            product.prf(),
            product.dataset_summary.sampling_rate_mhz,
            product.signal_data.pixel_count
        );
        log::debug!(
            "Orbit: {} state vectors spanning [{:.3}, {:.3}] s around sensing start",
            product.orbit.len(),
            t0,
            t1
        );
        Ok(product)
    }

    pub fn files(&self) -> Option<&ProductFiles> {
        self.files.as_ref()
    }

    pub fn image_path(&self) -> Option<&Path> {
        self.image_path.as_deref()
    }

    pub fn file_descriptor(&self) -> &FileDescriptor {
        &self.file_descriptor
    }

    pub fn dataset_summary(&self) -> &DatasetSummary {
        &self.dataset_summary
    }

    pub fn platform(&self) -> &PlatformPositionRecord {
        &self.platform
    }

    pub fn signal_data(&self) -> &SignalDataRecord {
        &self.signal_data
    }

    pub fn orbit(&self) -> &Orbit {
        &self.orbit
    }

    pub fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }

    /// UTC time of the first image line
    pub fn sensing_start(&self) -> DateTime<Utc> {
        self.sensing_start
    }

    /// Pulse repetition frequency, Hz
    pub fn prf(&self) -> f64 {
        self.signal_data.prf_hz()
    }

    /// Range sampling rate, Hz
    pub fn range_sampling_rate(&self) -> f64 {
        self.dataset_summary.range_sampling_rate()
    }

    /// Slant range distance between adjacent samples, meters
    pub fn range_pixel_spacing(&self) -> f64 {
        SPEED_OF_LIGHT / (2.0 * self.range_sampling_rate())
    }

    /// Samples per image line
    pub fn samples_per_line(&self) -> usize {
        self.signal_data.pixel_count as usize
    }

    /// Azimuth time (s) to line index
    pub fn azimuth_grid(&self) -> LinearSpace<f64> {
        LinearSpace::new(0.0, 1.0 / self.prf())
    }

    /// Slant range (m) to sample index
    pub fn range_grid(&self) -> LinearSpace<f64> {
        LinearSpace::new(self.signal_data.range_first_sample as f64, self.range_pixel_spacing())
    }

    /// Image position of an ECEF target
    pub fn locate_ecef(
        &self,
        solver: &RangeDopplerSolver,
        target: &[f64; 3],
        initial_guess: Option<f64>,
    ) -> SarResult<RadarPixel> {
        let RadarCoordinate {
            azimuth_time,
            slant_range,
            ..
        } = solver.solve(target, &self.orbit, initial_guess)?;

        Ok(RadarPixel {
            line: self.azimuth_grid().index_of(azimuth_time),
            sample: self.range_grid().index_of(slant_range),
            azimuth_time,
            slant_range,
        })
    }

    /// Image position of a ground point given in degrees and meters above the ellipsoid
    pub fn geolocate(
        &self,
        solver: &RangeDopplerSolver,
        lon_deg: f64,
        lat_deg: f64,
        height: f64,
        initial_guess: Option<f64>,
    ) -> SarResult<RadarPixel> {
        let target = self.ellipsoid.geodetic_degrees_to_ecef(lon_deg, lat_deg, height);
        self.locate_ecef(solver, &target, initial_guess)
    }
}
