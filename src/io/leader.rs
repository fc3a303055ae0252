//! Leader file records: file descriptor, dataset summary and platform position
//!
//! Layout of a PALSAR leader file:
//!
//! | record            | offset | length |
//! |-------------------|--------|--------|
//! | file descriptor   | 0      | 720    |
//! | dataset summary   | 720    | 4096   |
//! | platform position | 4816   | 4680   |

use chrono::{DateTime, Utc};

use crate::io::ceos::{
    blob, expect_field, parse_ascii_floats, spare, text, uint, Record, RecordHeader, RecordLayout,
    RecordWriter,
};
use crate::types::{utc_from_day_of_year, SarError, SarResult, StateVector};

pub const FILE_DESCRIPTOR_LENGTH: usize = 720;
pub const DATASET_SUMMARY_OFFSET: usize = FILE_DESCRIPTOR_LENGTH;
pub const DATASET_SUMMARY_LENGTH: usize = 4096;
pub const PLATFORM_POSITION_OFFSET: usize = DATASET_SUMMARY_OFFSET + DATASET_SUMMARY_LENGTH;
pub const PLATFORM_POSITION_LENGTH: usize = 4680;

/// State vectors carried by one platform position record
pub const STATE_VECTOR_COUNT: usize = 28;
/// Width of one ASCII state-vector component
pub const STATE_VECTOR_FIELD_WIDTH: usize = 22;

fn read_header(r: &Record<'_>) -> SarResult<RecordHeader> {
    Ok(RecordHeader {
        sequence_number: r.uint("sequence_number")?,
        subtype_1: r.uint("subtype_1")? as u8,
        type_code: r.uint("type_code")? as u8,
        subtype_2: r.uint("subtype_2")? as u8,
        subtype_3: r.uint("subtype_3")? as u8,
        record_length: r.uint("record_length")?,
    })
}

pub(crate) fn write_header(w: &mut RecordWriter, h: &RecordHeader) -> SarResult<()> {
    w.uint("sequence_number", h.sequence_number)?
        .uint("subtype_1", h.subtype_1 as u32)?
        .uint("type_code", h.type_code as u32)?
        .uint("subtype_2", h.subtype_2 as u32)?
        .uint("subtype_3", h.subtype_3 as u32)?
        .uint("record_length", h.record_length)?;
    Ok(())
}

/// Shortest text that parses back to `v`, in exponent form if it does not fit `width`
pub(crate) fn ascii_float(v: f64, width: usize) -> String {
    let plain = format!("{}", v);
    if plain.len() <= width {
        plain
    } else {
        format!("{:E}", v)
    }
}

fn optional_ascii<T: std::fmt::Display>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// File descriptor
// ---------------------------------------------------------------------------

pub static FILE_DESCRIPTOR_LAYOUT: RecordLayout = RecordLayout {
    name: "FileDescriptor",
    fields: &[
        uint("sequence_number", 4),
        uint("subtype_1", 1),
        uint("type_code", 1),
        uint("subtype_2", 1),
        uint("subtype_3", 1),
        uint("record_length", 4),
        text("ascii_flag", 2),
        text("continuation_flag", 2),
        text("document_id", 12),
        text("document_revision", 2),
        text("descriptor_revision", 2),
        text("software_version", 12),
        uint("file_number", 4),
        text("file_name", 16),
        text("sequence_number_flag", 4),
        text("sequence_number_location", 8),
        text("sequence_number_length", 4),
        text("record_code_flag", 4),
        text("record_code_location", 8),
        text("record_code_length", 4),
        text("record_length_flag", 4),
        text("record_length_location", 8),
        text("record_length_length", 4),
        spare(68),
        text("dataset_summary_count", 6),
        text("dataset_summary_length", 6),
        text("map_projection_count", 6),
        text("map_projection_length", 6),
        text("platform_position_count", 6),
        text("platform_position_length", 6),
    ],
};

/// Where a record keeps one of its self-describing fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLocator {
    pub flag: String,
    pub location: u32,
    pub length: u32,
}

/// Leader file descriptor record (decoded prefix)
#[derive(Debug, Clone, PartialEq)]
pub struct FileDescriptor {
    pub header: RecordHeader,
    pub ascii_flag: String,
    pub continuation_flag: String,
    pub document_id: String,
    pub document_revision: String,
    pub descriptor_revision: String,
    pub software_version: String,
    pub file_number: u32,
    pub file_name: String,
    pub sequence_number_locator: FieldLocator,
    pub record_code_locator: FieldLocator,
    pub record_length_locator: FieldLocator,
    pub dataset_summary_count: u32,
    pub dataset_summary_length: u32,
    pub map_projection_count: u32,
    pub map_projection_length: u32,
    pub platform_position_count: u32,
    pub platform_position_length: u32,
}

impl FileDescriptor {
    pub fn parse(data: &[u8]) -> SarResult<Self> {
        let r = FILE_DESCRIPTOR_LAYOUT.decode(data)?;
        let locator = |prefix: &str| -> SarResult<FieldLocator> {
            Ok(FieldLocator {
                flag: r.text(&format!("{}_flag", prefix))?.to_string(),
                location: r.number(&format!("{}_location", prefix))?,
                length: r.number(&format!("{}_length", prefix))?,
            })
        };

        Ok(Self {
            header: read_header(&r)?,
            ascii_flag: r.text("ascii_flag")?.to_string(),
            continuation_flag: r.text("continuation_flag")?.to_string(),
            document_id: r.text("document_id")?.to_string(),
            document_revision: r.text("document_revision")?.to_string(),
            descriptor_revision: r.text("descriptor_revision")?.to_string(),
            software_version: r.text("software_version")?.to_string(),
            file_number: r.uint("file_number")?,
            file_name: r.text("file_name")?.to_string(),
            sequence_number_locator: locator("sequence_number")?,
            record_code_locator: locator("record_code")?,
            record_length_locator: locator("record_length")?,
            dataset_summary_count: r.number("dataset_summary_count")?,
            dataset_summary_length: r.number("dataset_summary_length")?,
            map_projection_count: r.number("map_projection_count")?,
            map_projection_length: r.number("map_projection_length")?,
            platform_position_count: r.number("platform_position_count")?,
            platform_position_length: r.number("platform_position_length")?,
        })
    }

    pub fn to_bytes(&self) -> SarResult<Vec<u8>> {
        let mut w = RecordWriter::new(&FILE_DESCRIPTOR_LAYOUT);
        write_header(&mut w, &self.header)?;
        w.text_left("ascii_flag", &self.ascii_flag)?
            .text_left("continuation_flag", &self.continuation_flag)?
            .text_left("document_id", &self.document_id)?
            .text("document_revision", &self.document_revision)?
            .text("descriptor_revision", &self.descriptor_revision)?
            .text_left("software_version", &self.software_version)?
            .uint("file_number", self.file_number)?
            .text_left("file_name", &self.file_name)?;

        for (prefix, loc) in [
            ("sequence_number", &self.sequence_number_locator),
            ("record_code", &self.record_code_locator),
            ("record_length", &self.record_length_locator),
        ] {
            w.text(&format!("{}_flag", prefix), &loc.flag)?
                .text(&format!("{}_location", prefix), &loc.location.to_string())?
                .text(&format!("{}_length", prefix), &loc.length.to_string())?;
        }

        w.text("dataset_summary_count", &self.dataset_summary_count.to_string())?
            .text("dataset_summary_length", &self.dataset_summary_length.to_string())?
            .text("map_projection_count", &self.map_projection_count.to_string())?
            .text("map_projection_length", &self.map_projection_length.to_string())?
            .text("platform_position_count", &self.platform_position_count.to_string())?
            .text("platform_position_length", &self.platform_position_length.to_string())?;
        Ok(w.finish())
    }

    /// Check that this is a level 1.x PALSAR SAR leader file
    pub fn verify(&self) -> SarResult<()> {
        const NAME: &str = "FileDescriptor";
        expect_field(NAME, "sequence_number", self.header.sequence_number, 1)?;
        expect_field(NAME, "record_codes", self.header.codes(), [11, 192, 18, 18])?;
        expect_field(NAME, "record_length", self.header.record_length, FILE_DESCRIPTOR_LENGTH as u32)?;
        expect_field(NAME, "ascii_flag", self.ascii_flag.as_str(), "A")?;
        expect_field(NAME, "document_id", self.document_id.as_str(), "CEOS-SAR-CCT")?;
        expect_field(NAME, "sequence_number_locator", self.sequence_number_locator.clone(), locator("FSEQ", 1))?;
        expect_field(NAME, "record_code_locator", self.record_code_locator.clone(), locator("FTYP", 5))?;
        expect_field(NAME, "record_length_locator", self.record_length_locator.clone(), locator("FLGT", 9))?;
        expect_field(NAME, "dataset_summary_count", self.dataset_summary_count, 1)?;
        expect_field(NAME, "dataset_summary_length", self.dataset_summary_length, DATASET_SUMMARY_LENGTH as u32)?;
        expect_field(NAME, "map_projection_count", self.map_projection_count, 0)?;
        expect_field(NAME, "map_projection_length", self.map_projection_length, 0)?;
        expect_field(NAME, "platform_position_count", self.platform_position_count, 1)?;
        expect_field(NAME, "platform_position_length", self.platform_position_length, PLATFORM_POSITION_LENGTH as u32)?;
        Ok(())
    }
}

fn locator(flag: &str, location: u32) -> FieldLocator {
    FieldLocator {
        flag: flag.to_string(),
        location,
        length: 4,
    }
}

// ---------------------------------------------------------------------------
// Dataset summary
// ---------------------------------------------------------------------------

pub static DATASET_SUMMARY_LAYOUT: RecordLayout = RecordLayout {
    name: "DatasetSummary",
    fields: &[
        uint("sequence_number", 4),
        uint("subtype_1", 1),
        uint("type_code", 1),
        uint("subtype_2", 1),
        uint("subtype_3", 1),
        uint("record_length", 4),
        spare(312),
        text("scene_center_line", 8),
        text("scene_center_pixel", 8),
        spare(370),
        text("sampling_rate", 16),
        spare(3370),
    ],
};

/// Dataset summary record (the fields geolocation needs)
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub header: RecordHeader,
    pub scene_center_line: Option<f64>,
    pub scene_center_pixel: Option<f64>,
    /// Range sampling rate in MHz
    pub sampling_rate_mhz: f64,
}

impl DatasetSummary {
    pub fn parse(data: &[u8]) -> SarResult<Self> {
        let r = DATASET_SUMMARY_LAYOUT.decode(data)?;
        Ok(Self {
            header: read_header(&r)?,
            scene_center_line: r.optional_number("scene_center_line")?,
            scene_center_pixel: r.optional_number("scene_center_pixel")?,
            sampling_rate_mhz: r.number("sampling_rate")?,
        })
    }

    pub fn to_bytes(&self) -> SarResult<Vec<u8>> {
        let mut w = RecordWriter::new(&DATASET_SUMMARY_LAYOUT);
        write_header(&mut w, &self.header)?;
        w.text("scene_center_line", &optional_ascii(self.scene_center_line))?
            .text("scene_center_pixel", &optional_ascii(self.scene_center_pixel))?
            .text("sampling_rate", &ascii_float(self.sampling_rate_mhz, 16))?;
        Ok(w.finish())
    }

    /// Range sampling rate in Hz
    pub fn range_sampling_rate(&self) -> f64 {
        self.sampling_rate_mhz * 1e6
    }

    pub fn verify(&self) -> SarResult<()> {
        expect_field("DatasetSummary", "record_length", self.header.record_length, DATASET_SUMMARY_LENGTH as u32)?;
        if !(self.sampling_rate_mhz.is_finite() && self.sampling_rate_mhz > 0.0) {
            return Err(SarError::UnsupportedFormat(format!(
                "DatasetSummary.sampling_rate must be positive, got {} MHz",
                self.sampling_rate_mhz
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Platform position
// ---------------------------------------------------------------------------

pub static PLATFORM_POSITION_LAYOUT: RecordLayout = RecordLayout {
    name: "PlatformPosition",
    fields: &[
        uint("sequence_number", 4),
        uint("subtype_1", 1),
        uint("type_code", 1),
        uint("subtype_2", 1),
        uint("subtype_3", 1),
        uint("record_length", 4),
        text("orbital_elements_designator", 32),
        text("first_position_vector", 48),
        text("first_velocity_vector", 48),
        text("num_points", 4),
        text("year", 4),
        text("month", 4),
        text("day", 4),
        text("day_of_year", 4),
        text("seconds_of_day", 22),
        text("time_interval", 22),
        text("reference_coordinate_system", 64),
        text("greenwich_mean_hour_angle", 22),
        text("along_track_position_error", 16),
        text("across_track_position_error", 16),
        text("radial_position_error", 16),
        spare(48),
        blob("state_vectors", STATE_VECTOR_COUNT * 6 * STATE_VECTOR_FIELD_WIDTH),
    ],
};

/// Platform position data record
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformPositionRecord {
    pub header: RecordHeader,
    pub orbital_elements_designator: u32,
    pub first_position_vector: String,
    pub first_velocity_vector: String,
    pub num_points: u32,
    pub year: i32,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub day_of_year: u32,
    pub seconds_of_day: f64,
    /// Spacing between state vectors, seconds
    pub time_interval: f64,
    pub reference_coordinate_system: String,
    pub greenwich_mean_hour_angle: Option<f64>,
    pub along_track_position_error: Option<f64>,
    pub across_track_position_error: Option<f64>,
    pub radial_position_error: Option<f64>,
    pub state_vectors: Vec<StateVector>,
}

impl PlatformPositionRecord {
    pub fn parse(data: &[u8]) -> SarResult<Self> {
        let r = PLATFORM_POSITION_LAYOUT.decode(data)?;
        let num_points: u32 = r.number("num_points")?;

        let count = (num_points as usize).min(STATE_VECTOR_COUNT);
        let blob = r.blob("state_vectors")?;
        let values = parse_ascii_floats(
            &blob[..count * 6 * STATE_VECTOR_FIELD_WIDTH],
            STATE_VECTOR_FIELD_WIDTH,
            "PlatformPosition.state_vectors",
        )?;
        let state_vectors = values
            .chunks_exact(6)
            .map(|c| StateVector::from_components([c[0], c[1], c[2], c[3], c[4], c[5]]))
            .collect();

        let record = Self {
            header: read_header(&r)?,
            orbital_elements_designator: r.number("orbital_elements_designator")?,
            first_position_vector: r.text("first_position_vector")?.to_string(),
            first_velocity_vector: r.text("first_velocity_vector")?.to_string(),
            num_points,
            year: r.number("year")?,
            month: r.optional_number("month")?,
            day: r.optional_number("day")?,
            day_of_year: r.number("day_of_year")?,
            seconds_of_day: r.number("seconds_of_day")?,
            time_interval: r.number("time_interval")?,
            reference_coordinate_system: r.text("reference_coordinate_system")?.to_string(),
            greenwich_mean_hour_angle: r.optional_number("greenwich_mean_hour_angle")?,
            along_track_position_error: r.optional_number("along_track_position_error")?,
            across_track_position_error: r.optional_number("across_track_position_error")?,
            radial_position_error: r.optional_number("radial_position_error")?,
            state_vectors,
        };

        log::debug!(
            "Platform position record: {} state vectors every {} s from {}-{:03} +{} s",
            record.state_vectors.len(),
            record.time_interval,
            record.year,
            record.day_of_year,
            record.seconds_of_day
        );
        Ok(record)
    }

    pub fn to_bytes(&self) -> SarResult<Vec<u8>> {
        if self.state_vectors.len() > STATE_VECTOR_COUNT {
            return Err(SarError::Format(format!(
                "PlatformPosition holds at most {} state vectors, got {}",
                STATE_VECTOR_COUNT,
                self.state_vectors.len()
            )));
        }

        let mut vectors = vec![b' '; STATE_VECTOR_COUNT * 6 * STATE_VECTOR_FIELD_WIDTH];
        let values = self.state_vectors.iter().flat_map(|sv| sv.components());
        for (chunk, v) in vectors.chunks_mut(STATE_VECTOR_FIELD_WIDTH).zip(values) {
            let s = ascii_float(v, STATE_VECTOR_FIELD_WIDTH);
            if s.len() > STATE_VECTOR_FIELD_WIDTH {
                return Err(SarError::Format(format!("state vector component {} does not fit", v)));
            }
            chunk[STATE_VECTOR_FIELD_WIDTH - s.len()..].copy_from_slice(s.as_bytes());
        }

        let mut w = RecordWriter::new(&PLATFORM_POSITION_LAYOUT);
        write_header(&mut w, &self.header)?;
        w.text("orbital_elements_designator", &self.orbital_elements_designator.to_string())?
            .text_left("first_position_vector", &self.first_position_vector)?
            .text_left("first_velocity_vector", &self.first_velocity_vector)?
            .text("num_points", &self.num_points.to_string())?
            .text("year", &self.year.to_string())?
            .text("month", &optional_ascii(self.month))?
            .text("day", &optional_ascii(self.day))?
            .text("day_of_year", &self.day_of_year.to_string())?
            .text("seconds_of_day", &ascii_float(self.seconds_of_day, 22))?
            .text("time_interval", &ascii_float(self.time_interval, 22))?
            .text_left("reference_coordinate_system", &self.reference_coordinate_system)?
            .text("greenwich_mean_hour_angle", &optional_ascii(self.greenwich_mean_hour_angle))?
            .text("along_track_position_error", &optional_ascii(self.along_track_position_error))?
            .text("across_track_position_error", &optional_ascii(self.across_track_position_error))?
            .text("radial_position_error", &optional_ascii(self.radial_position_error))?
            .blob("state_vectors", &vectors)?;
        Ok(w.finish())
    }

    /// UTC time of the first state vector
    pub fn epoch(&self) -> SarResult<DateTime<Utc>> {
        utc_from_day_of_year(self.year, self.day_of_year, self.seconds_of_day)
    }

    /// Check the record identity against the PALSAR level 1.x constants
    pub fn verify(&self) -> SarResult<()> {
        const NAME: &str = "PlatformPosition";
        expect_field(NAME, "sequence_number", self.header.sequence_number, 3)?;
        expect_field(NAME, "record_codes", self.header.codes(), [18, 30, 18, 20])?;
        expect_field(NAME, "record_length", self.header.record_length, PLATFORM_POSITION_LENGTH as u32)?;
        expect_field(NAME, "orbital_elements_designator", self.orbital_elements_designator, 2)?;
        expect_field(NAME, "num_points", self.num_points, STATE_VECTOR_COUNT as u32)?;
        if !(self.time_interval.is_finite() && self.time_interval > 0.0) {
            return Err(SarError::UnsupportedFormat(format!(
                "PlatformPosition.time_interval must be positive, got {}",
                self.time_interval
            )));
        }
        Ok(())
    }
}

/// Decode and verify the three leader records from a complete leader file
pub fn parse_leader(data: &[u8]) -> SarResult<(FileDescriptor, DatasetSummary, PlatformPositionRecord)> {
    let end = PLATFORM_POSITION_OFFSET + PLATFORM_POSITION_LAYOUT.size();
    if data.len() < end {
        return Err(SarError::Format(format!(
            "Leader file too short: {} bytes, need at least {}",
            data.len(),
            end
        )));
    }

    let descriptor = FileDescriptor::parse(&data[..FILE_DESCRIPTOR_LENGTH])?;
    descriptor.verify()?;

    let summary = DatasetSummary::parse(&data[DATASET_SUMMARY_OFFSET..DATASET_SUMMARY_OFFSET + DATASET_SUMMARY_LENGTH])?;
    summary.verify()?;

    let platform = PlatformPositionRecord::parse(&data[PLATFORM_POSITION_OFFSET..])?;
    platform.verify()?;

    Ok((descriptor, summary, platform))
}
