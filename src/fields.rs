//! Field definitions: which tags get projected into a metadata store, and the
//! labels they are displayed under.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::error::{MetaError, Result};

/// A single configured field.
///
/// `key` has the form `<section>-<tagName>`, e.g. `EXIF-Make`, `IPTC-City`
/// or `COMPUTED_GPS-GPS_Latitude`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub key: String,
    pub label: String,
}

impl FieldDefinition {
    /// Split the key on its first `-` into `(section, tag_name)`.
    ///
    /// Returns `None` for keys that carry no section separator.
    pub fn section_and_tag(&self) -> Option<(&str, &str)> {
        self.key.split_once('-')
    }
}

/// Parse comma-separated field and label lists into ordered definitions.
///
/// The i-th field pairs with the i-th label; a missing or blank label falls
/// back to the field key. Dots in field tokens become dashes so that
/// `EXIF.Make` and `EXIF-Make` name the same field.
pub fn parse_field_definitions(fields_csv: &str, labels_csv: &str) -> Result<Vec<FieldDefinition>> {
    if fields_csv.trim().is_empty() {
        return Err(MetaError::Config("no metadata fields configured".to_string()));
    }

    let labels: Vec<&str> = labels_csv.split(',').map(str::trim).collect();

    let defs: Vec<FieldDefinition> = fields_csv
        .split(',')
        .enumerate()
        .filter_map(|(index, field)| {
            let key = field.trim().replace('.', "-");
            if key.is_empty() {
                return None;
            }
            let label = labels
                .get(index)
                .filter(|l| !l.is_empty())
                .map(|l| l.to_string())
                .unwrap_or_else(|| key.clone());
            Some(FieldDefinition { key, label })
        })
        .collect();

    if defs.is_empty() {
        return Err(MetaError::Config(format!(
            "metadata field list {fields_csv:?} contains no usable fields"
        )));
    }

    Ok(defs)
}

#[derive(Debug)]
struct CachedDefinitions {
    fields_csv: String,
    labels_csv: String,
    defs: Vec<FieldDefinition>,
}

/// Memoizing wrapper around [`parse_field_definitions`].
///
/// The first successful resolution is published once and is immutable
/// afterwards. Concurrent first callers block on the initializer instead of
/// seeing a partially built list.
#[derive(Debug, Default)]
pub struct FieldResolver {
    cache: OnceCell<CachedDefinitions>,
}

impl FieldResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the configured fields, reusing the cached list for identical input.
    ///
    /// Input that differs from the cached configuration is parsed on the fly and
    /// never replaces the cache.
    pub fn resolve(&self, fields_csv: &str, labels_csv: &str) -> Result<Vec<FieldDefinition>> {
        let cached = self.cache.get_or_try_init(|| {
            log::debug!("Resolving metadata field definitions from {fields_csv:?}");
            parse_field_definitions(fields_csv, labels_csv).map(|defs| CachedDefinitions {
                fields_csv: fields_csv.to_string(),
                labels_csv: labels_csv.to_string(),
                defs,
            })
        })?;

        if cached.fields_csv == fields_csv && cached.labels_csv == labels_csv {
            Ok(cached.defs.clone())
        } else {
            log::debug!("Field configuration differs from cached one; resolving without caching");
            parse_field_definitions(fields_csv, labels_csv)
        }
    }

    /// The cached definitions, if a resolution has already succeeded.
    pub fn cached(&self) -> Option<&[FieldDefinition]> {
        self.cache.get().map(|c| c.defs.as_slice())
    }
}
