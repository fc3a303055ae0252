//! Synthetic PALSAR products for integration tests
#![allow(dead_code)]

use std::path::Path;

use sarloc::io::ceos::RecordHeader;
use sarloc::io::leader::{
    FieldLocator, DATASET_SUMMARY_LENGTH, FILE_DESCRIPTOR_LENGTH, PLATFORM_POSITION_LENGTH,
};
use sarloc::io::signal_data::IMAGE_FILE_DESCRIPTOR_LENGTH;
use sarloc::{DatasetSummary, FileDescriptor, PlatformPositionRecord, SignalDataRecord, StateVector};

pub const SCENE: &str = "ALPSRP999990010-H1.1__A";
pub const SATELLITE_X: f64 = 7.0e6;
pub const SATELLITE_SPEED: f64 = 7500.0;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn header(sequence_number: u32, codes: [u8; 4], record_length: u32) -> RecordHeader {
    RecordHeader {
        sequence_number,
        subtype_1: codes[0],
        type_code: codes[1],
        subtype_2: codes[2],
        subtype_3: codes[3],
        record_length,
    }
}

/// Identity-correct synthetic product.
///
/// The platform flies a straight line along +y at x = 7000 km: state vector
/// 14 sits at (7000 km, 0, 0), directly above lon 0, lat 0.
#[derive(Debug, Clone)]
pub struct ProductBuilder {
    pub year: i32,
    pub day_of_year: u32,
    /// Platform epoch, seconds of day
    pub epoch_seconds: f64,
    /// State vector spacing, seconds
    pub interval: f64,
    /// Image sensing start, milliseconds of day
    pub sensing_ms: u32,
    pub prf_mhz: u32,
    pub sampling_rate_mhz: f64,
    pub range_first_sample: u32,
    pub pixel_count: u32,
    pub state_vectors: Vec<StateVector>,
}

impl ProductBuilder {
    /// Sample 14 at 10 s after sensing start
    pub fn straight_line() -> Self {
        let mut builder = Self {
            year: 2009,
            day_of_year: 125,
            epoch_seconds: 3600.0,
            interval: 10.0,
            sensing_ms: 3_730_000,
            prf_mhz: 2_000_000,
            sampling_rate_mhz: 32.0,
            range_first_sample: 600_000,
            pixel_count: 10_000,
            state_vectors: Vec::new(),
        };
        builder.state_vectors = builder.straight_line_vectors();
        builder
    }

    /// Sample 14 at 10 ms after sensing start, 400 samples from 630 km;
    /// images a small patch around lat 0.9°, lon 0.003°
    pub fn small_scene() -> Self {
        let mut builder = Self {
            sensing_ms: 3_739_990,
            range_first_sample: 630_000,
            pixel_count: 400,
            ..Self::straight_line()
        };
        builder.state_vectors = builder.straight_line_vectors();
        builder
    }

    /// Time of state vector `i` relative to sensing start, seconds
    pub fn sample_time(&self, i: usize) -> f64 {
        self.epoch_seconds + i as f64 * self.interval - self.sensing_ms as f64 / 1000.0
    }

    fn straight_line_vectors(&self) -> Vec<StateVector> {
        let t14 = self.sample_time(14);
        (0..28)
            .map(|i| {
                let t = self.sample_time(i);
                StateVector::new(
                    [SATELLITE_X, SATELLITE_SPEED * (t - t14), 0.0],
                    [0.0, SATELLITE_SPEED, 0.0],
                )
            })
            .collect()
    }

    pub fn file_descriptor(&self) -> FileDescriptor {
        let locator = |flag: &str, location| FieldLocator {
            flag: flag.to_string(),
            location,
            length: 4,
        };
        FileDescriptor {
            header: header(1, [11, 192, 18, 18], FILE_DESCRIPTOR_LENGTH as u32),
            ascii_flag: "A".to_string(),
            continuation_flag: String::new(),
            document_id: "CEOS-SAR-CCT".to_string(),
            document_revision: "A".to_string(),
            descriptor_revision: "A".to_string(),
            software_version: "PRO1.1".to_string(),
            file_number: 1,
            file_name: format!("LED-{}", &SCENE[..12]),
            sequence_number_locator: locator("FSEQ", 1),
            record_code_locator: locator("FTYP", 5),
            record_length_locator: locator("FLGT", 9),
            dataset_summary_count: 1,
            dataset_summary_length: DATASET_SUMMARY_LENGTH as u32,
            map_projection_count: 0,
            map_projection_length: 0,
            platform_position_count: 1,
            platform_position_length: PLATFORM_POSITION_LENGTH as u32,
        }
    }

    pub fn dataset_summary(&self) -> DatasetSummary {
        DatasetSummary {
            header: header(2, [10, 10, 31, 20], DATASET_SUMMARY_LENGTH as u32),
            scene_center_line: Some(9216.0),
            scene_center_pixel: Some(self.pixel_count as f64 / 2.0),
            sampling_rate_mhz: self.sampling_rate_mhz,
        }
    }

    pub fn platform(&self) -> PlatformPositionRecord {
        PlatformPositionRecord {
            header: header(3, [18, 30, 18, 20], PLATFORM_POSITION_LENGTH as u32),
            orbital_elements_designator: 2,
            first_position_vector: String::new(),
            first_velocity_vector: String::new(),
            num_points: self.state_vectors.len() as u32,
            year: self.year,
            month: None,
            day: None,
            day_of_year: self.day_of_year,
            seconds_of_day: self.epoch_seconds,
            time_interval: self.interval,
            reference_coordinate_system: "EARTH CENTERED ROTATING".to_string(),
            greenwich_mean_hour_angle: None,
            along_track_position_error: None,
            across_track_position_error: None,
            radial_position_error: None,
            state_vectors: self.state_vectors.clone(),
        }
    }

    pub fn signal_data(&self) -> SignalDataRecord {
        SignalDataRecord {
            header: header(2, [50, 10, 18, 20], 412 + 8 * self.pixel_count),
            line_number: 1,
            record_index: 1,
            left_fill: 0,
            pixel_count: self.pixel_count,
            right_fill: 0,
            update_flag: 0,
            year: self.year as u32,
            day_of_year: self.day_of_year,
            ms_of_day: self.sensing_ms,
            channel_id: 1,
            channel_code: 0,
            tx_polarization: 0,
            rx_polarization: 0,
            prf: self.prf_mhz,
            scan_id: 0,
            range_compressed: 1,
            chirp_type: 0,
            chirp_length: 27_000,
            chirp_coefficients: [0, 0, 0],
            receiver_gain: 36,
            nought_line_flag: 0,
            range_first_sample: self.range_first_sample,
            sample_delay: 0,
        }
    }

    /// Complete leader file: descriptor, dataset summary, platform position
    pub fn leader_bytes(&self) -> Vec<u8> {
        let mut data = padded(
            self.file_descriptor().to_bytes().expect("encode file descriptor"),
            FILE_DESCRIPTOR_LENGTH,
        );
        data.extend(self.dataset_summary().to_bytes().expect("encode dataset summary"));
        data.extend(padded(
            self.platform().to_bytes().expect("encode platform record"),
            PLATFORM_POSITION_LENGTH,
        ));
        data
    }

    /// Image file descriptor plus the first signal data record
    pub fn image_bytes(&self) -> Vec<u8> {
        let mut data = vec![0u8; IMAGE_FILE_DESCRIPTOR_LENGTH];
        data[..12].copy_from_slice(&[0, 0, 0, 1, 50, 192, 18, 18, 0, 0, 0x02, 0xd0]);
        data.extend(self.signal_data().to_bytes().expect("encode signal data"));
        data.extend(vec![0u8; 288]);
        data
    }

    /// Write LED-, VOL- and one IMG- file per polarization into `dir`
    pub fn write_product(&self, dir: &Path, polarizations: &[&str]) {
        std::fs::write(dir.join(format!("LED-{}", SCENE)), self.leader_bytes()).expect("write leader");
        std::fs::write(dir.join(format!("VOL-{}", SCENE)), vec![0u8; 360]).expect("write volume");
        for pol in polarizations {
            let mut image = self.signal_data();
            let (tx, rx) = match *pol {
                "HV" => (0, 1),
                "VH" => (1, 0),
                "VV" => (1, 1),
                _ => (0, 0),
            };
            image.tx_polarization = tx;
            image.rx_polarization = rx;

            let mut data = self.image_bytes();
            data.truncate(IMAGE_FILE_DESCRIPTOR_LENGTH);
            data.extend(image.to_bytes().expect("encode signal data"));
            std::fs::write(dir.join(format!("IMG-{}-{}", pol, SCENE)), data).expect("write image");
        }
    }
}

fn padded(mut bytes: Vec<u8>, len: usize) -> Vec<u8> {
    bytes.resize(len, b' ');
    bytes
}
