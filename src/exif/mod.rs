//! EXIF and IPTC reading and normalization.
//!
//! - [`MetadataReader`]: the decoding boundary; [`NomExifReader`] is the default implementation
//! - [`gps`]: rational parsing and degrees/minutes/seconds to decimal conversion
//! - [`iptc`]: APP13 dataset decoding and the dataset-identifier table
//! - [`ValueSanitizer`]: printable UTF-8 normalization and tag exclusion

pub mod gps;
pub mod iptc;
mod reader;
mod sanitize;

pub use gps::{COMPUTED_GPS_SECTION, GpsCoordinate, compute_gps_section, parse_rational, to_decimal};
pub use iptc::{IptcRecord, iptc_record};
pub use reader::{MetadataReader, NomExifReader, RawTagTable, RawValue, TagMap};
pub use sanitize::{UNDEFINED_TAG_PREFIX, ValueSanitizer, strip_non_printable, to_utf8};
