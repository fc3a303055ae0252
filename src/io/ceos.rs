//! Fixed-layout CEOS record decoding
//!
//! CEOS records are flat sequences of fixed-width fields at fixed offsets.
//! Binary integers are unsigned big-endian; numbers may also be stored as
//! space-padded ASCII text. A [`RecordLayout`] is an explicit schema table,
//! [`RecordLayout::decode`] gives a [`Record`] view with typed accessors and
//! [`RecordWriter`] encodes values back into the same layout.

use std::str::FromStr;

use crate::types::{SarError, SarResult};

/// Interpretation of one field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Unsigned big-endian integer of 1, 2 or 4 bytes
    UInt(usize),
    /// Fixed-width ASCII text, possibly a padded number
    Text(usize),
    /// Opaque bytes for downstream segmentation
    Blob(usize),
    /// Reserved or undocumented bytes
    Spare(usize),
}

impl FieldKind {
    pub const fn width(&self) -> usize {
        match *self {
            FieldKind::UInt(w) | FieldKind::Text(w) | FieldKind::Blob(w) | FieldKind::Spare(w) => w,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

pub const fn uint(name: &'static str, width: usize) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::UInt(width) }
}

pub const fn text(name: &'static str, width: usize) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::Text(width) }
}

pub const fn blob(name: &'static str, width: usize) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::Blob(width) }
}

pub const fn spare(width: usize) -> FieldSpec {
    FieldSpec { name: "", kind: FieldKind::Spare(width) }
}

/// Ordered field table of one record kind
#[derive(Debug)]
pub struct RecordLayout {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

impl RecordLayout {
    /// Total encoded size in bytes
    pub fn size(&self) -> usize {
        self.fields.iter().map(|f| f.kind.width()).sum()
    }

    /// Byte offset and kind of a named field
    pub fn locate(&self, name: &str) -> Option<(usize, FieldKind)> {
        let mut offset = 0;
        for field in self.fields {
            if !name.is_empty() && field.name == name {
                return Some((offset, field.kind));
            }
            offset += field.kind.width();
        }
        None
    }

    /// View `data` through this layout. Trailing bytes beyond the layout are ignored.
    pub fn decode<'a>(&'static self, data: &'a [u8]) -> SarResult<Record<'a>> {
        let size = self.size();
        if data.len() < size {
            return Err(SarError::Format(format!(
                "{} record needs {} bytes, got {}",
                self.name,
                size,
                data.len()
            )));
        }
        Ok(Record {
            layout: self,
            data: &data[..size],
        })
    }
}

/// Decoded view over one record's bytes
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    layout: &'static RecordLayout,
    data: &'a [u8],
}

impl<'a> Record<'a> {
    pub fn layout(&self) -> &'static RecordLayout {
        self.layout
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.data
    }

    fn field(&self, name: &str) -> SarResult<(FieldKind, &'a [u8])> {
        let (offset, kind) = self.layout.locate(name).ok_or_else(|| {
            SarError::Format(format!("{} record has no field '{}'", self.layout.name, name))
        })?;
        Ok((kind, &self.data[offset..offset + kind.width()]))
    }

    /// Unsigned big-endian integer field
    pub fn uint(&self, name: &str) -> SarResult<u32> {
        match self.field(name)? {
            (FieldKind::UInt(1), b) => Ok(b[0] as u32),
            (FieldKind::UInt(2), b) => Ok(u16::from_be_bytes([b[0], b[1]]) as u32),
            (FieldKind::UInt(4), b) => Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]])),
            (kind, _) => Err(self.wrong_kind(name, kind, "an unsigned integer")),
        }
    }

    /// Raw text field, exactly as stored
    pub fn raw_text(&self, name: &str) -> SarResult<&'a [u8]> {
        match self.field(name)? {
            (FieldKind::Text(_), b) => Ok(b),
            (kind, _) => Err(self.wrong_kind(name, kind, "text")),
        }
    }

    /// Text field with surrounding blanks and NULs removed
    pub fn text(&self, name: &str) -> SarResult<&'a str> {
        let raw = self.raw_text(name)?;
        let s = std::str::from_utf8(raw).map_err(|_| {
            SarError::Format(format!("{}.{} is not ASCII: {:?}", self.layout.name, name, raw))
        })?;
        Ok(s.trim_matches(|c: char| c.is_ascii_whitespace() || c == '\0'))
    }

    /// Text field holding a base-10 integer or float
    pub fn number<T: FromStr>(&self, name: &str) -> SarResult<T> {
        let s = self.text(name)?;
        s.parse::<T>().map_err(|_| {
            SarError::Format(format!("{}.{} is not numeric: '{}'", self.layout.name, name, s))
        })
    }

    /// Like [`Record::number`] but a blank field yields `None`
    pub fn optional_number<T: FromStr>(&self, name: &str) -> SarResult<Option<T>> {
        if self.text(name)?.is_empty() {
            Ok(None)
        } else {
            self.number(name).map(Some)
        }
    }

    pub fn blob(&self, name: &str) -> SarResult<&'a [u8]> {
        match self.field(name)? {
            (FieldKind::Blob(_), b) => Ok(b),
            (kind, _) => Err(self.wrong_kind(name, kind, "a blob")),
        }
    }

    fn wrong_kind(&self, name: &str, kind: FieldKind, wanted: &str) -> SarError {
        SarError::Format(format!(
            "{}.{} is {:?}, not {}",
            self.layout.name, name, kind, wanted
        ))
    }
}

/// Encoder for a [`RecordLayout`]; unset text is blank, everything else zero
#[derive(Debug, Clone)]
pub struct RecordWriter {
    layout: &'static RecordLayout,
    data: Vec<u8>,
}

impl RecordWriter {
    pub fn new(layout: &'static RecordLayout) -> Self {
        let mut data = vec![0u8; layout.size()];
        let mut offset = 0;
        for field in layout.fields {
            let width = field.kind.width();
            if let FieldKind::Text(_) = field.kind {
                data[offset..offset + width].fill(b' ');
            }
            offset += width;
        }
        Self { layout, data }
    }

    fn slot(&mut self, name: &str) -> SarResult<(FieldKind, &mut [u8])> {
        let (offset, kind) = self.layout.locate(name).ok_or_else(|| {
            SarError::Format(format!("{} record has no field '{}'", self.layout.name, name))
        })?;
        Ok((kind, &mut self.data[offset..offset + kind.width()]))
    }

    pub fn uint(&mut self, name: &str, value: u32) -> SarResult<&mut Self> {
        let layout_name = self.layout.name;
        match self.slot(name)? {
            (FieldKind::UInt(1), b) if value <= u8::MAX as u32 => b[0] = value as u8,
            (FieldKind::UInt(2), b) if value <= u16::MAX as u32 => {
                b.copy_from_slice(&(value as u16).to_be_bytes())
            }
            (FieldKind::UInt(4), b) => b.copy_from_slice(&value.to_be_bytes()),
            (kind, _) => {
                return Err(SarError::Format(format!(
                    "cannot store {} in {}.{} ({:?})",
                    value, layout_name, name, kind
                )))
            }
        }
        Ok(self)
    }

    /// Store text right-aligned and blank-padded
    pub fn text(&mut self, name: &str, value: &str) -> SarResult<&mut Self> {
        let layout_name = self.layout.name;
        match self.slot(name)? {
            (FieldKind::Text(width), b) if value.is_ascii() && value.len() <= width => {
                b.fill(b' ');
                b[width - value.len()..].copy_from_slice(value.as_bytes());
            }
            (kind, _) => {
                return Err(SarError::Format(format!(
                    "cannot store '{}' in {}.{} ({:?})",
                    value, layout_name, name, kind
                )))
            }
        }
        Ok(self)
    }

    /// Store text left-aligned and blank-padded
    pub fn text_left(&mut self, name: &str, value: &str) -> SarResult<&mut Self> {
        let layout_name = self.layout.name;
        match self.slot(name)? {
            (FieldKind::Text(width), b) if value.is_ascii() && value.len() <= width => {
                b.fill(b' ');
                b[..value.len()].copy_from_slice(value.as_bytes());
            }
            (kind, _) => {
                return Err(SarError::Format(format!(
                    "cannot store '{}' in {}.{} ({:?})",
                    value, layout_name, name, kind
                )))
            }
        }
        Ok(self)
    }

    pub fn blob(&mut self, name: &str, value: &[u8]) -> SarResult<&mut Self> {
        let layout_name = self.layout.name;
        match self.slot(name)? {
            (FieldKind::Blob(width), b) if value.len() == width => b.copy_from_slice(value),
            (kind, _) => {
                return Err(SarError::Format(format!(
                    "cannot store {} bytes in {}.{} ({:?})",
                    value.len(),
                    layout_name,
                    name,
                    kind
                )))
            }
        }
        Ok(self)
    }

    pub fn finish(self) -> Vec<u8> {
        self.data
    }
}

/// Split `data` into consecutive `size`-byte chunks; a short tail is kept
pub fn segments(data: &[u8], size: usize) -> impl Iterator<Item = &[u8]> {
    data.chunks(size.max(1))
}

/// Parse every `size`-byte ASCII chunk of `data` as a float
pub fn parse_ascii_floats(data: &[u8], size: usize, what: &str) -> SarResult<Vec<f64>> {
    segments(data, size)
        .enumerate()
        .map(|(i, chunk)| {
            let s = std::str::from_utf8(chunk)
                .map(|s| s.trim_matches(|c: char| c.is_ascii_whitespace() || c == '\0'))
                .map_err(|_| SarError::Format(format!("{}[{}] is not ASCII", what, i)))?;
            s.parse::<f64>()
                .map_err(|_| SarError::Format(format!("{}[{}] is not numeric: '{}'", what, i, s)))
        })
        .collect()
}

/// Common 12-byte prefix of every CEOS record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub sequence_number: u32,
    pub subtype_1: u8,
    pub type_code: u8,
    pub subtype_2: u8,
    pub subtype_3: u8,
    pub record_length: u32,
}

pub static RECORD_HEADER_LAYOUT: RecordLayout = RecordLayout {
    name: "RecordHeader",
    fields: &[
        uint("sequence_number", 4),
        uint("subtype_1", 1),
        uint("type_code", 1),
        uint("subtype_2", 1),
        uint("subtype_3", 1),
        uint("record_length", 4),
    ],
};

impl RecordHeader {
    pub const SIZE: usize = 12;

    pub fn parse(data: &[u8]) -> SarResult<Self> {
        let r = RECORD_HEADER_LAYOUT.decode(data)?;
        Ok(Self {
            sequence_number: r.uint("sequence_number")?,
            subtype_1: r.uint("subtype_1")? as u8,
            type_code: r.uint("type_code")? as u8,
            subtype_2: r.uint("subtype_2")? as u8,
            subtype_3: r.uint("subtype_3")? as u8,
            record_length: r.uint("record_length")?,
        })
    }

    /// The four one-byte codes in stored order
    pub fn codes(&self) -> [u8; 4] {
        [self.subtype_1, self.type_code, self.subtype_2, self.subtype_3]
    }
}

/// Fail with `UnsupportedFormat` unless `actual == expected`
pub(crate) fn expect_field<T>(record: &str, field: &str, actual: T, expected: T) -> SarResult<()>
where
    T: PartialEq + std::fmt::Debug,
{
    if actual == expected {
        Ok(())
    } else {
        Err(SarError::UnsupportedFormat(format!(
            "{}.{} is {:?}, expected {:?}",
            record, field, actual, expected
        )))
    }
}
