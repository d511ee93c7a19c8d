//! IPTC-IIM decoding from JPEG APP13 segments.
//!
//! APP13 contents start with `"Photoshop 3.0\0"` followed by `8BIM` resource
//! blocks; resource `0x0404` carries the IIM datasets. Each dataset is
//! `0x1C, record, dataset, len (u16 BE), data`.

use std::collections::BTreeMap;

use super::sanitize::{strip_non_printable, to_utf8};

const IPTC_HEADER: &[u8] = b"Photoshop 3.0\0";
const IPTC_8BIM: &[u8] = b"8BIM";
const IPTC_RESOURCE_ID: u16 = 0x0404;
const DATASET_MARKER: u8 = 0x1C;

/// Dataset identifiers (`record#dataset`) mapped to the labels exposed in the
/// `IPTC` section. Anything not listed here is dropped.
pub const IPTC_DATASETS: [(&str, &str); 19] = [
    ("2#005", "DocumentTitle"),
    ("2#010", "Urgency"),
    ("2#015", "Category"),
    ("2#020", "Subcategories"),
    ("2#025", "Keywords"),
    ("2#040", "SpecialInstructions"),
    ("2#055", "CreationDate"),
    ("2#080", "AuthorByline"),
    ("2#085", "AuthorTitle"),
    ("2#090", "City"),
    ("2#095", "State"),
    ("2#101", "Country"),
    ("2#103", "OTR"),
    ("2#105", "Headline"),
    ("2#110", "Source"),
    ("2#115", "PhotoSource"),
    ("2#116", "Copyright"),
    ("2#120", "Caption"),
    ("2#122", "CaptionWriter"),
];

/// Raw datasets keyed by identifier; repeatable datasets keep every value in order.
pub type IptcDatasets = BTreeMap<String, Vec<Vec<u8>>>;

/// Semantic label (`City`, `Copyright`, ...) to sanitized value.
pub type IptcRecord = BTreeMap<String, String>;

/// Look up the label of a dataset identifier.
pub fn dataset_label(id: &str) -> Option<&'static str> {
    IPTC_DATASETS
        .iter()
        .find(|(known, _)| *known == id)
        .map(|(_, label)| *label)
}

/// Parse the datasets of an APP13 segment.
///
/// Returns `None` when the segment carries no IIM datasets at all.
pub fn parse_datasets(segment: &[u8]) -> Option<IptcDatasets> {
    let iim = find_iim_block(segment).unwrap_or(segment);

    let mut datasets = IptcDatasets::new();
    let mut pos = 0;
    while pos + 5 <= iim.len() {
        if iim[pos] != DATASET_MARKER {
            pos += 1;
            continue;
        }

        let record = iim[pos + 1];
        let dataset = iim[pos + 2];
        let len = u16::from_be_bytes([iim[pos + 3], iim[pos + 4]]) as usize;
        pos += 5;

        // Extended datasets (high bit set) are not used by the fields we map
        if len & 0x8000 != 0 || pos + len > iim.len() {
            break;
        }

        datasets
            .entry(format!("{record}#{dataset:03}"))
            .or_default()
            .push(iim[pos..pos + len].to_vec());
        pos += len;
    }

    if datasets.is_empty() { None } else { Some(datasets) }
}

/// Locate the IIM resource (`0x0404`) inside a Photoshop resource block.
fn find_iim_block(segment: &[u8]) -> Option<&[u8]> {
    let data = segment.strip_prefix(IPTC_HEADER)?;

    let mut pos = 0;
    while pos + 12 <= data.len() {
        if &data[pos..pos + 4] != IPTC_8BIM {
            break;
        }
        let resource_id = u16::from_be_bytes([data[pos + 4], data[pos + 5]]);
        // Pascal name: length byte + name, padded to even
        let pascal_len = data[pos + 6] as usize;
        let pascal_padded = if (pascal_len + 1) % 2 == 0 { pascal_len + 1 } else { pascal_len + 2 };
        let data_start = pos + 6 + pascal_padded;
        if data_start + 4 > data.len() {
            break;
        }
        let data_len = u32::from_be_bytes([
            data[data_start],
            data[data_start + 1],
            data[data_start + 2],
            data[data_start + 3],
        ]) as usize;
        let body_start = data_start + 4;
        let body_end = body_start + data_len;
        if body_end > data.len() {
            break;
        }

        if resource_id == IPTC_RESOURCE_ID {
            return Some(&data[body_start..body_end]);
        }

        pos = if data_len % 2 == 0 { body_end } else { body_end + 1 };
    }

    None
}

/// Build the labelled IPTC record from an APP13 segment.
///
/// Every value of a dataset is appended followed by a single space, then
/// non-printable characters are removed.
pub fn iptc_record(segment: &[u8]) -> IptcRecord {
    let Some(datasets) = parse_datasets(segment) else {
        return IptcRecord::new();
    };

    datasets
        .iter()
        .filter_map(|(id, values)| {
            let label = dataset_label(id)?;
            let joined: String = values.iter().map(|v| to_utf8(v) + " ").collect();
            Some((label.to_string(), strip_non_printable(&joined)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(record: u8, id: u8, value: &[u8]) -> Vec<u8> {
        let mut out = vec![DATASET_MARKER, record, id];
        out.extend_from_slice(&(value.len() as u16).to_be_bytes());
        out.extend_from_slice(value);
        out
    }

    fn app13(iim: &[u8]) -> Vec<u8> {
        let mut out = IPTC_HEADER.to_vec();
        // unrelated resource first, odd length to exercise padding
        out.extend_from_slice(IPTC_8BIM);
        out.extend_from_slice(&0x03EDu16.to_be_bytes());
        out.extend_from_slice(&[0, 0]);
        out.extend_from_slice(&3u32.to_be_bytes());
        out.extend_from_slice(&[1, 2, 3, 0]);
        // IIM resource
        out.extend_from_slice(IPTC_8BIM);
        out.extend_from_slice(&IPTC_RESOURCE_ID.to_be_bytes());
        out.extend_from_slice(&[0, 0]);
        out.extend_from_slice(&(iim.len() as u32).to_be_bytes());
        out.extend_from_slice(iim);
        if iim.len() % 2 != 0 {
            out.push(0);
        }
        out
    }

    // ── dataset table ────────────────────────────────────────────────

    #[test]
    fn table_has_nineteen_entries() {
        assert_eq!(IPTC_DATASETS.len(), 19);
        assert_eq!(dataset_label("2#090"), Some("City"));
        assert_eq!(dataset_label("2#116"), Some("Copyright"));
        assert_eq!(dataset_label("2#000"), None);
    }

    // ── parse_datasets ───────────────────────────────────────────────

    #[test]
    fn parses_photoshop_resource() {
        let mut iim = dataset(2, 0, &[0, 4]);
        iim.extend(dataset(2, 90, b"Paris"));
        iim.extend(dataset(2, 25, b"tower"));
        iim.extend(dataset(2, 25, b"night"));

        let datasets = parse_datasets(&app13(&iim)).unwrap();
        assert_eq!(datasets["2#090"], vec![b"Paris".to_vec()]);
        assert_eq!(datasets["2#025"], vec![b"tower".to_vec(), b"night".to_vec()]);
        assert!(datasets.contains_key("2#000"));
    }

    #[test]
    fn parses_bare_iim_data() {
        let iim = dataset(2, 5, b"Title");
        let datasets = parse_datasets(&iim).unwrap();
        assert_eq!(datasets["2#005"], vec![b"Title".to_vec()]);
    }

    #[test]
    fn segment_without_datasets_is_none() {
        assert!(parse_datasets(b"Photoshop 3.0\0").is_none());
        assert!(parse_datasets(&[]).is_none());
    }

    #[test]
    fn truncated_dataset_stops_parsing() {
        let mut iim = dataset(2, 90, b"Paris");
        iim.extend_from_slice(&[DATASET_MARKER, 2, 101, 0, 50, b'F']);
        let datasets = parse_datasets(&iim).unwrap();
        assert_eq!(datasets.len(), 1);
    }

    // ── iptc_record ──────────────────────────────────────────────────

    #[test]
    fn record_maps_known_datasets_only() {
        let mut iim = dataset(2, 0, &[0, 4]);
        iim.extend(dataset(2, 90, b"Paris"));
        iim.extend(dataset(2, 116, b"\xa9 Jane"));
        iim.extend(dataset(2, 200, b"custom"));

        let record = iptc_record(&app13(&iim));
        assert_eq!(record.len(), 2);
        assert_eq!(record["City"], "Paris ");
        assert_eq!(record["Copyright"], "© Jane ");
    }

    #[test]
    fn repeated_values_are_space_joined() {
        let mut iim = dataset(2, 25, b"tower");
        iim.extend(dataset(2, 25, b"night"));
        let record = iptc_record(&app13(&iim));
        assert_eq!(record["Keywords"], "tower night ");
    }

    #[test]
    fn control_characters_are_stripped() {
        let iim = dataset(2, 120, b"A\ncaption\x00");
        let record = iptc_record(&iim);
        assert_eq!(record["Caption"], "Acaption ");
    }
}
