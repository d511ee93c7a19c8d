use img_parts::Bytes;
use img_parts::jpeg::Jpeg;
use nom_exif::*;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;
use crate::pipeline::ImageKind;
use super::sanitize::{UNDEFINED_TAG_PREFIX, to_utf8};

// XP* tag IDs (IFD0), stored as UTF-16LE byte arrays
const TAG_XP_TITLE: u16 = 0x9C9B;
const TAG_XP_SUBJECT: u16 = 0x9C9F;
const TAG_COPYRIGHT: u16 = 0x8298;

// IFD0 pointers to the Exif and GPS sub-IFDs
const TAG_EXIF_OFFSET: u16 = 0x8769;
const TAG_GPS_INFO: u16 = 0x8825;

/// JPEG APP13 marker (Photoshop resources / IPTC-IIM).
const MARKER_APP13: u8 = 0xED;

/// A raw tag value: a single scalar or an ordered list of scalars
/// (e.g. a GPS degree/minute/second triple).
///
/// Scalars are kept as text; rationals are rendered as `num/den`.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Scalar(String),
    List(Vec<String>),
}

/// Tags of one section, keyed by tag name.
pub type TagMap = BTreeMap<String, RawValue>;

/// Section name (`IFD0`, `EXIF`, `GPS`, ...) to the tags of that section.
pub type RawTagTable = BTreeMap<String, TagMap>;

/// Source of raw EXIF tag tables and IPTC segments.
///
/// `Ok(None)` means the file carries no such block, which is never an error.
/// `Err` is reserved for failing to read the file itself.
pub trait MetadataReader: Send + Sync {
    /// Whether EXIF decoding is available at all.
    fn supports_exif(&self) -> bool {
        true
    }

    /// Whether IPTC segment extraction is available at all.
    fn supports_iptc(&self) -> bool {
        true
    }

    /// Read the sectioned EXIF tag table of a file.
    fn read_exif(&self, path: &Path) -> Result<Option<RawTagTable>>;

    /// Read the raw APP13 segment contents of a file.
    fn read_iptc_segment(&self, path: &Path) -> Result<Option<Vec<u8>>>;
}

/// [`MetadataReader`] backed by nom-exif (EXIF) and img-parts (JPEG APP13).
#[derive(Debug, Default, Clone, Copy)]
pub struct NomExifReader;

impl NomExifReader {
    pub fn new() -> Self {
        Self
    }
}

impl MetadataReader for NomExifReader {
    fn read_exif(&self, path: &Path) -> Result<Option<RawTagTable>> {
        // Only opening the file is an I/O failure; anything nom-exif rejects
        // afterwards means the file has no usable EXIF.
        let file = std::fs::File::open(path)?;

        let mut parser = MediaParser::new();
        let ms = match MediaSource::seekable(file) {
            Ok(ms) => ms,
            Err(e) => {
                log::debug!("Unrecognized media in {}: {e}", path.display());
                return Ok(None);
            }
        };

        if !ms.has_exif() {
            log::debug!("No EXIF container in {}", path.display());
            return Ok(None);
        }

        let iter: ExifIter = match parser.parse(ms) {
            Ok(iter) => iter,
            Err(e) => {
                log::debug!("No EXIF data found in {}: {e}", path.display());
                return Ok(None);
            }
        };

        let mut table = RawTagTable::new();
        for entry in iter {
            let Some(value) = entry.get_value() else {
                continue;
            };
            let code = entry.tag_code();
            let name = match entry.tag() {
                Some(tag) => format!("{tag:?}"),
                None => format!("{UNDEFINED_TAG_PREFIX}0x{code:04X}"),
            };
            let section = section_name(entry.ifd_index(), code, &name);
            table
                .entry(section.to_string())
                .or_default()
                .insert(name, entry_to_raw(code, value));
        }

        if table.is_empty() {
            return Ok(None);
        }
        Ok(Some(table))
    }

    fn read_iptc_segment(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        // APP13 only exists in JPEG files
        if ImageKind::from_path(path) != Some(ImageKind::Jpeg) {
            return Ok(None);
        }

        let file_bytes = std::fs::read(path)?;
        let jpeg = match Jpeg::from_bytes(Bytes::from(file_bytes)) {
            Ok(jpeg) => jpeg,
            Err(e) => {
                log::debug!("Could not parse JPEG segments of {}: {e}", path.display());
                return Ok(None);
            }
        };

        Ok(jpeg
            .segments()
            .iter()
            .find(|s| s.marker() == MARKER_APP13)
            .map(|s| s.contents().to_vec()))
    }
}

/// Group an entry into a named section.
///
/// nom-exif reports Exif and GPS sub-IFD entries under their parent IFD, so
/// sections are derived from the IFD index plus the tag itself. The sub-IFD
/// pointers stay in `IFD0`.
fn section_name(ifd_index: usize, code: u16, name: &str) -> &'static str {
    if ifd_index >= 1 {
        return "THUMBNAIL";
    }
    if matches!(code, TAG_EXIF_OFFSET | TAG_GPS_INFO) {
        return "IFD0";
    }
    if name.starts_with("GPS") {
        return "GPS";
    }
    match code {
        TAG_COPYRIGHT | TAG_XP_TITLE..=TAG_XP_SUBJECT => "IFD0",
        c if c < 0x8000 => "IFD0",
        _ => "EXIF",
    }
}

fn entry_to_raw(code: u16, value: &EntryValue) -> RawValue {
    match value {
        EntryValue::Text(s) => RawValue::Scalar(s.clone()),
        EntryValue::URational(r) => RawValue::Scalar(format!("{}/{}", r.0, r.1)),
        EntryValue::IRational(r) => RawValue::Scalar(format!("{}/{}", r.0, r.1)),
        EntryValue::URationalArray(items) => {
            RawValue::List(items.iter().map(|r| format!("{}/{}", r.0, r.1)).collect())
        }
        EntryValue::IRationalArray(items) => {
            RawValue::List(items.iter().map(|r| format!("{}/{}", r.0, r.1)).collect())
        }
        EntryValue::U8Array(bytes) if (TAG_XP_TITLE..=TAG_XP_SUBJECT).contains(&code) => {
            RawValue::Scalar(decode_utf16le(bytes))
        }
        EntryValue::U8Array(items) => RawValue::List(items.iter().map(u8::to_string).collect()),
        EntryValue::U16Array(items) => RawValue::List(items.iter().map(u16::to_string).collect()),
        EntryValue::U32Array(items) => RawValue::List(items.iter().map(u32::to_string).collect()),
        EntryValue::Undefined(bytes) => RawValue::Scalar(to_utf8(bytes)),
        other => RawValue::Scalar(other.to_string()),
    }
}

/// Decode a NUL-terminated UTF-16LE buffer (XP* tags).
fn decode_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .take_while(|&u| u != 0)
        .collect();
    String::from_utf16_lossy(&units)
}
