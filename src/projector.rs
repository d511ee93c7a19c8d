use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::error::{MetaError, Result};
use crate::exif::{
    COMPUTED_GPS_SECTION, IptcRecord, MetadataReader, NomExifReader, RawValue, TagMap,
    ValueSanitizer, compute_gps_section, iptc_record,
};
use crate::fields::FieldDefinition;
use crate::pipeline::{ImageKind, is_inside_archive};

const GPS_SECTION: &str = "GPS";
const IPTC_SECTION: &str = "IPTC";

/// Every section of a file with printable UTF-8 values, ready for serialization.
pub type SanitizedTagTree = BTreeMap<String, BTreeMap<String, String>>;

/// Field key (`EXIF-Make`) to sanitized value.
pub type MergedMetadata = BTreeMap<String, String>;

/// Key/value store that receives projected fields.
///
/// Merging is additive: keys in `metadata` overwrite existing entries, every
/// other key is left untouched.
pub trait MetadataStore {
    fn merge_metadata(&mut self, metadata: &MergedMetadata);
}

impl MetadataStore for BTreeMap<String, String> {
    fn merge_metadata(&mut self, metadata: &MergedMetadata) {
        self.extend(metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}

impl MetadataStore for HashMap<String, String> {
    fn merge_metadata(&mut self, metadata: &MergedMetadata) {
        self.extend(metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}

/// The node a selective extraction targets.
///
/// `location` is the logical address used by the eligibility checks (it may
/// point inside an archive), `path` is the readable file behind it.
#[derive(Debug, Clone)]
pub struct ExtractionTarget {
    pub location: String,
    pub path: PathBuf,
    pub is_leaf: bool,
}

impl ExtractionTarget {
    pub fn new(location: impl Into<String>, path: impl Into<PathBuf>, is_leaf: bool) -> Self {
        Self {
            location: location.into(),
            path: path.into(),
            is_leaf,
        }
    }

    /// A plain file on disk.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            location: path.to_string_lossy().into_owned(),
            path,
            is_leaf: true,
        }
    }

    /// Whether this target may be read at all: a leaf, outside any archive,
    /// with a `jpg`/`jpeg`/`tif`/`tiff` extension.
    pub fn is_eligible(&self) -> bool {
        self.is_leaf
            && !is_inside_archive(&self.location)
            && ImageKind::from_path(Path::new(&self.location)).is_some()
    }
}

/// Fail when the reader cannot decode EXIF at all.
///
/// Hosts call this once when enabling the feature; it is distinct from a file
/// simply having no EXIF block.
pub fn perform_checks(reader: &dyn MetadataReader) -> Result<()> {
    if !reader.supports_exif() {
        return Err(MetaError::Capability(
            "EXIF decoding is not available in this runtime".to_string(),
        ));
    }
    Ok(())
}

/// Projects a file's EXIF/IPTC metadata either as a full sanitized dump or as
/// a configured subset merged into a [`MetadataStore`].
///
/// The projector holds no per-file state and can be shared across threads.
#[derive(Debug)]
pub struct ExifProjector<R: MetadataReader = NomExifReader> {
    reader: R,
    sanitizer: ValueSanitizer,
}

impl ExifProjector<NomExifReader> {
    /// Projector backed by the default nom-exif reader.
    pub fn with_default_reader(sanitizer: ValueSanitizer) -> Result<Self> {
        Self::new(NomExifReader::new(), sanitizer)
    }
}

impl<R: MetadataReader> ExifProjector<R> {
    /// Create a projector, failing fast with [`MetaError::Capability`] when
    /// the reader cannot decode EXIF.
    pub fn new(reader: R, sanitizer: ValueSanitizer) -> Result<Self> {
        perform_checks(&reader)?;
        Ok(Self { reader, sanitizer })
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    fn read_iptc(&self, path: &Path) -> Result<IptcRecord> {
        if !self.reader.supports_iptc() {
            return Ok(IptcRecord::new());
        }
        Ok(self
            .reader
            .read_iptc_segment(path)?
            .map(|segment| iptc_record(&segment))
            .unwrap_or_default())
    }

    /// Full sanitized view of a file's metadata.
    ///
    /// A `COMPUTED_GPS` section is added when a `GPS` section exists and an
    /// `IPTC` section when the file carries known IPTC datasets. Excluded tags
    /// are dropped. A file without EXIF yields an empty tree.
    pub fn dump(&self, path: &Path) -> Result<SanitizedTagTree> {
        let Some(mut exif) = self.reader.read_exif(path)? else {
            log::debug!("No EXIF in {}; nothing to dump", path.display());
            return Ok(SanitizedTagTree::new());
        };

        if let Some(gps) = exif.get(GPS_SECTION) {
            let computed = compute_gps_section(gps);
            exif.insert(COMPUTED_GPS_SECTION.to_string(), computed);
        }

        let iptc = self.read_iptc(path)?;
        if !iptc.is_empty() {
            let section: TagMap = iptc
                .into_iter()
                .map(|(label, value)| (label, RawValue::Scalar(value)))
                .collect();
            exif.insert(IPTC_SECTION.to_string(), section);
        }

        Ok(exif
            .into_iter()
            .map(|(section, tags)| {
                let sanitized: BTreeMap<String, String> = tags
                    .iter()
                    .filter_map(|(name, value)| {
                        self.sanitizer
                            .sanitize_tag(name, value)
                            .map(|v| (name.clone(), v))
                    })
                    .collect();
                (section, sanitized)
            })
            .collect())
    }

    /// Resolve the configured fields for a target without touching any store.
    ///
    /// Ineligible targets and empty field lists produce an empty result
    /// without reading the file.
    pub fn extract_fields(
        &self,
        target: &ExtractionTarget,
        fields: &[FieldDefinition],
    ) -> Result<MergedMetadata> {
        let mut merged = MergedMetadata::new();

        if fields.is_empty() || !target.is_eligible() {
            return Ok(merged);
        }
        if !self.reader.supports_exif() {
            return Ok(merged);
        }

        let path = target.path.as_path();
        let mut exif = self.reader.read_exif(path)?.unwrap_or_default();
        let mut iptc: Option<IptcRecord> = None;

        for field in fields {
            let Some((section, tag)) = field.section_and_tag() else {
                log::debug!("Field {} has no section prefix", field.key);
                continue;
            };

            if section == COMPUTED_GPS_SECTION && !exif.contains_key(COMPUTED_GPS_SECTION) {
                let computed = exif.get(GPS_SECTION).map(compute_gps_section).unwrap_or_default();
                exif.insert(COMPUTED_GPS_SECTION.to_string(), computed);
            }

            let value = match exif.get(section).and_then(|tags| tags.get(tag)) {
                Some(value) => Some(value.clone()),
                None if section == IPTC_SECTION => {
                    if iptc.is_none() {
                        iptc = Some(self.read_iptc(path)?);
                    }
                    iptc.as_ref()
                        .and_then(|record| record.get(tag))
                        .map(|v| RawValue::Scalar(v.clone()))
                }
                None => None,
            };

            if let Some(sanitized) = value.and_then(|v| self.sanitizer.sanitize_tag(tag, &v)) {
                merged.insert(field.key.clone(), sanitized);
            }
        }

        Ok(merged)
    }

    /// Extract the configured fields and merge them into `store`.
    ///
    /// Keys already in the store that this extraction does not produce are
    /// kept; produced keys overwrite previous values.
    pub fn extract_and_merge(
        &self,
        target: &ExtractionTarget,
        fields: &[FieldDefinition],
        store: &mut dyn MetadataStore,
    ) -> Result<()> {
        let merged = self.extract_fields(target, fields)?;
        if !merged.is_empty() {
            log::debug!("Merging {} field(s) for {}", merged.len(), target.location);
            store.merge_metadata(&merged);
        }
        Ok(())
    }
}
