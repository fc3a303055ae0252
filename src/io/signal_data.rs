//! Image file: descriptor header and the first signal data record
//!
//! Only the common 124-byte prefix of the signal data record is decoded; the
//! sample payload that follows is not needed for geolocation.

use chrono::{DateTime, Utc};

use crate::io::ceos::{expect_field, spare, uint, RecordHeader, RecordLayout, RecordWriter};
use crate::io::leader::write_header;
use crate::types::{utc_from_day_of_year, Polarization, SarError, SarResult};

/// Length of the image file descriptor record preceding the signal data
pub const IMAGE_FILE_DESCRIPTOR_LENGTH: usize = 720;
pub const SIGNAL_DATA_OFFSET: usize = IMAGE_FILE_DESCRIPTOR_LENGTH;
pub const SIGNAL_DATA_PREFIX_LENGTH: usize = 124;

pub static SIGNAL_DATA_LAYOUT: RecordLayout = RecordLayout {
    name: "SignalData",
    fields: &[
        uint("sequence_number", 4),
        uint("subtype_1", 1),
        uint("type_code", 1),
        uint("subtype_2", 1),
        uint("subtype_3", 1),
        uint("record_length", 4),
        uint("line_number", 4),
        uint("record_index", 4),
        uint("left_fill", 4),
        uint("pixel_count", 4),
        uint("right_fill", 4),
        uint("update_flag", 4),
        uint("year", 4),
        uint("day_of_year", 4),
        uint("ms_of_day", 4),
        uint("channel_id", 2),
        uint("channel_code", 2),
        uint("tx_polarization", 2),
        uint("rx_polarization", 2),
        uint("prf", 4),
        uint("scan_id", 4),
        uint("range_compressed", 2),
        uint("chirp_type", 2),
        uint("chirp_length", 4),
        uint("chirp_coefficient_0", 4),
        uint("chirp_coefficient_1", 4),
        uint("chirp_coefficient_2", 4),
        spare(8),
        uint("receiver_gain", 4),
        uint("nought_line_flag", 4),
        spare(16),
        uint("range_first_sample", 4),
        uint("sample_delay", 4),
    ],
};

/// Leading part of a signal data record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalDataRecord {
    pub header: RecordHeader,
    pub line_number: u32,
    pub record_index: u32,
    pub left_fill: u32,
    pub pixel_count: u32,
    pub right_fill: u32,
    pub update_flag: u32,
    pub year: u32,
    pub day_of_year: u32,
    /// Sensing time of this line, milliseconds of day
    pub ms_of_day: u32,
    pub channel_id: u16,
    pub channel_code: u16,
    /// 0 = H, 1 = V
    pub tx_polarization: u16,
    pub rx_polarization: u16,
    /// Pulse repetition frequency in mHz
    pub prf: u32,
    pub scan_id: u32,
    pub range_compressed: u16,
    pub chirp_type: u16,
    pub chirp_length: u32,
    pub chirp_coefficients: [u32; 3],
    pub receiver_gain: u32,
    pub nought_line_flag: u32,
    /// Slant range to the first sample, meters
    pub range_first_sample: u32,
    pub sample_delay: u32,
}

impl SignalDataRecord {
    pub fn parse(data: &[u8]) -> SarResult<Self> {
        let r = SIGNAL_DATA_LAYOUT.decode(data)?;
        let u16_field = |name: &str| -> SarResult<u16> { Ok(r.uint(name)? as u16) };

        Ok(Self {
            header: RecordHeader::parse(data)?,
            line_number: r.uint("line_number")?,
            record_index: r.uint("record_index")?,
            left_fill: r.uint("left_fill")?,
            pixel_count: r.uint("pixel_count")?,
            right_fill: r.uint("right_fill")?,
            update_flag: r.uint("update_flag")?,
            year: r.uint("year")?,
            day_of_year: r.uint("day_of_year")?,
            ms_of_day: r.uint("ms_of_day")?,
            channel_id: u16_field("channel_id")?,
            channel_code: u16_field("channel_code")?,
            tx_polarization: u16_field("tx_polarization")?,
            rx_polarization: u16_field("rx_polarization")?,
            prf: r.uint("prf")?,
            scan_id: r.uint("scan_id")?,
            range_compressed: u16_field("range_compressed")?,
            chirp_type: u16_field("chirp_type")?,
            chirp_length: r.uint("chirp_length")?,
            chirp_coefficients: [
                r.uint("chirp_coefficient_0")?,
                r.uint("chirp_coefficient_1")?,
                r.uint("chirp_coefficient_2")?,
            ],
            receiver_gain: r.uint("receiver_gain")?,
            nought_line_flag: r.uint("nought_line_flag")?,
            range_first_sample: r.uint("range_first_sample")?,
            sample_delay: r.uint("sample_delay")?,
        })
    }

    pub fn to_bytes(&self) -> SarResult<Vec<u8>> {
        let mut w = RecordWriter::new(&SIGNAL_DATA_LAYOUT);
        write_header(&mut w, &self.header)?;
        w.uint("line_number", self.line_number)?
            .uint("record_index", self.record_index)?
            .uint("left_fill", self.left_fill)?
            .uint("pixel_count", self.pixel_count)?
            .uint("right_fill", self.right_fill)?
            .uint("update_flag", self.update_flag)?
            .uint("year", self.year)?
            .uint("day_of_year", self.day_of_year)?
            .uint("ms_of_day", self.ms_of_day)?
            .uint("channel_id", self.channel_id as u32)?
            .uint("channel_code", self.channel_code as u32)?
            .uint("tx_polarization", self.tx_polarization as u32)?
            .uint("rx_polarization", self.rx_polarization as u32)?
            .uint("prf", self.prf)?
            .uint("scan_id", self.scan_id)?
            .uint("range_compressed", self.range_compressed as u32)?
            .uint("chirp_type", self.chirp_type as u32)?
            .uint("chirp_length", self.chirp_length)?
            .uint("chirp_coefficient_0", self.chirp_coefficients[0])?
            .uint("chirp_coefficient_1", self.chirp_coefficients[1])?
            .uint("chirp_coefficient_2", self.chirp_coefficients[2])?
            .uint("receiver_gain", self.receiver_gain)?
            .uint("nought_line_flag", self.nought_line_flag)?
            .uint("range_first_sample", self.range_first_sample)?
            .uint("sample_delay", self.sample_delay)?;
        Ok(w.finish())
    }

    /// Reject records this crate cannot geolocate (fill, update or delay set)
    pub fn verify(&self) -> SarResult<()> {
        const NAME: &str = "SignalData";
        expect_field(NAME, "left_fill", self.left_fill, 0)?;
        expect_field(NAME, "right_fill", self.right_fill, 0)?;
        expect_field(NAME, "update_flag", self.update_flag, 0)?;
        expect_field(NAME, "sample_delay", self.sample_delay, 0)?;
        if self.pixel_count == 0 {
            return Err(SarError::UnsupportedFormat(
                "SignalData.pixel_count must be positive".to_string(),
            ));
        }
        if self.prf == 0 {
            return Err(SarError::UnsupportedFormat(
                "SignalData.prf must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Pulse repetition frequency in Hz
    pub fn prf_hz(&self) -> f64 {
        self.prf as f64 / 1000.0
    }

    /// UTC sensing time of this line
    pub fn sensing_start(&self) -> SarResult<DateTime<Utc>> {
        let year = i32::try_from(self.year)
            .map_err(|_| SarError::Format(format!("SignalData.year out of range: {}", self.year)))?;
        utc_from_day_of_year(year, self.day_of_year, self.ms_of_day as f64 / 1000.0)
    }

    /// Polarization from the transmit/receive codes, if both are known
    pub fn polarization(&self) -> Option<Polarization> {
        match (self.tx_polarization, self.rx_polarization) {
            (0, 0) => Some(Polarization::HH),
            (0, 1) => Some(Polarization::HV),
            (1, 0) => Some(Polarization::VH),
            (1, 1) => Some(Polarization::VV),
            _ => None,
        }
    }
}

/// Decode and verify the first signal data record of an image file.
///
/// `data` needs to hold at least the image file descriptor and the 124-byte
/// signal data prefix; the rest of the file is not touched.
pub fn parse_first_signal_record(data: &[u8]) -> SarResult<SignalDataRecord> {
    let descriptor = RecordHeader::parse(data)?;
    expect_field(
        "ImageFileDescriptor",
        "record_length",
        descriptor.record_length,
        IMAGE_FILE_DESCRIPTOR_LENGTH as u32,
    )?;

    let end = SIGNAL_DATA_OFFSET + SIGNAL_DATA_PREFIX_LENGTH;
    if data.len() < end {
        return Err(SarError::Format(format!(
            "Image file too short: {} bytes, need at least {}",
            data.len(),
            end
        )));
    }

    let record = SignalDataRecord::parse(&data[SIGNAL_DATA_OFFSET..])?;
    record.verify()?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> SignalDataRecord {
        SignalDataRecord {
            header: RecordHeader {
                sequence_number: 2,
                subtype_1: 50,
                type_code: 11,
                subtype_2: 18,
                subtype_3: 20,
                record_length: 10_400,
            },
            line_number: 1,
            record_index: 1,
            left_fill: 0,
            pixel_count: 1_286,
            right_fill: 0,
            update_flag: 0,
            year: 2009,
            day_of_year: 125,
            ms_of_day: 3_730_500,
            channel_id: 1,
            channel_code: 0,
            tx_polarization: 0,
            rx_polarization: 1,
            prf: 2_159_827,
            scan_id: 0,
            range_compressed: 1,
            chirp_type: 0,
            chirp_length: 27_000,
            chirp_coefficients: [0, 0, 0],
            receiver_gain: 36,
            nought_line_flag: 0,
            range_first_sample: 847_354,
            sample_delay: 0,
        }
    }

    fn image_bytes(record: &SignalDataRecord) -> Vec<u8> {
        let mut data = vec![0u8; IMAGE_FILE_DESCRIPTOR_LENGTH];
        data[..12].copy_from_slice(&[0, 0, 0, 1, 63, 192, 18, 18, 0, 0, 0x02, 0xd0]);
        data.extend(record.to_bytes().unwrap());
        data
    }

    #[test]
    fn test_layout_offsets() {
        assert_eq!(SIGNAL_DATA_LAYOUT.size(), SIGNAL_DATA_PREFIX_LENGTH);
        assert_eq!(SIGNAL_DATA_LAYOUT.locate("prf").map(|l| l.0), Some(56));
        assert_eq!(SIGNAL_DATA_LAYOUT.locate("range_first_sample").map(|l| l.0), Some(116));
        assert_eq!(SIGNAL_DATA_LAYOUT.locate("sample_delay").map(|l| l.0), Some(120));
    }

    #[test]
    fn test_round_trip_and_derived_values() {
        let rec = record();
        let parsed = parse_first_signal_record(&image_bytes(&rec)).unwrap();
        assert_eq!(parsed, rec);
        assert_eq!(parsed.prf_hz(), 2159.827);
        assert_eq!(parsed.polarization(), Some(Polarization::HV));
        assert_eq!(
            parsed.sensing_start().unwrap().to_rfc3339(),
            "2009-05-05T01:02:10.500+00:00"
        );
    }

    #[test]
    fn test_rejects_wrong_descriptor_length() {
        let mut data = image_bytes(&record());
        data[11] = 0xd1;
        assert!(matches!(
            parse_first_signal_record(&data),
            Err(SarError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_rejects_unsupported_records() {
        let mut rec = record();
        rec.left_fill = 4;
        assert!(matches!(rec.verify(), Err(SarError::UnsupportedFormat(_))));

        let mut rec = record();
        rec.update_flag = 1;
        assert!(matches!(rec.verify(), Err(SarError::UnsupportedFormat(_))));

        let mut rec = record();
        rec.pixel_count = 0;
        assert!(matches!(rec.verify(), Err(SarError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_truncated_image() {
        let data = image_bytes(&record());
        assert!(matches!(
            parse_first_signal_record(&data[..800]),
            Err(SarError::Format(_))
        ));
    }
}
