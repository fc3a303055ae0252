//! I/O modules for reading PALSAR CEOS products

pub mod ceos;
pub mod leader;
pub mod product;
pub mod signal_data;

pub use ceos::{FieldKind, FieldSpec, Record, RecordHeader, RecordLayout, RecordWriter};
pub use leader::{DatasetSummary, FileDescriptor, PlatformPositionRecord};
pub use product::{ImageFile, ProductFiles};
pub use signal_data::SignalDataRecord;
