use crate::error::{MetaError, Result};

use super::reader::{RawValue, TagMap};

/// Name of the synthetic section holding converted GPS values.
pub const COMPUTED_GPS_SECTION: &str = "COMPUTED_GPS";

// GPS IFD tag names as produced by the reader
const TAG_LATITUDE: &str = "GPSLatitude";
const TAG_LATITUDE_REF: &str = "GPSLatitudeRef";
const TAG_LONGITUDE: &str = "GPSLongitude";
const TAG_LONGITUDE_REF: &str = "GPSLongitudeRef";
const TAG_ALTITUDE: &str = "GPSAltitude";

/// A coordinate in degrees/minutes/seconds together with its signed decimal value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsCoordinate {
    pub degrees: f64,
    pub minutes: f64,
    pub seconds: f64,
    /// `N`, `S`, `E` or `W`; `None` when the reference tag is missing.
    pub hemisphere: Option<char>,
    pub decimal: f64,
}

impl GpsCoordinate {
    /// Convert three rational tokens plus a hemisphere reference.
    pub fn from_tokens(deg: &str, min: &str, sec: &str, hemisphere: &str) -> Result<Self> {
        let degrees = parse_rational(deg)?;
        let minutes = parse_rational(min)?;
        let seconds = parse_rational(sec)?;
        let hemisphere = hemisphere.trim().chars().next();
        Ok(Self {
            degrees,
            minutes,
            seconds,
            hemisphere,
            decimal: dms_to_decimal(degrees, minutes, seconds, hemisphere),
        })
    }

    /// Human-readable form: `40 deg 26' 46 N--40.4461`.
    pub fn display(&self) -> String {
        let hemisphere = self.hemisphere.map(String::from).unwrap_or_default();
        format!(
            "{} deg {}' {} {}--{}",
            self.degrees, self.minutes, self.seconds, hemisphere, self.decimal
        )
    }
}

/// Parse a rational token: `"12.5"` or `"4046/100"`.
///
/// Fractions use integer numerator and denominator and are rounded to four
/// decimal places. A zero denominator is a conversion error.
pub fn parse_rational(token: &str) -> Result<f64> {
    let token = token.trim();
    match token.split_once('/') {
        None => token
            .parse::<f64>()
            .map_err(|_| MetaError::Conversion(format!("invalid numeric value {token:?}"))),
        Some((num, den)) => {
            let num: i64 = num
                .trim()
                .parse()
                .map_err(|_| MetaError::Conversion(format!("invalid numerator in {token:?}")))?;
            let den: i64 = den
                .trim()
                .parse()
                .map_err(|_| MetaError::Conversion(format!("invalid denominator in {token:?}")))?;
            if den == 0 {
                return Err(MetaError::Conversion(format!("zero denominator in {token:?}")));
            }
            Ok(round4(num as f64 / den as f64))
        }
    }
}

/// Convert degrees/minutes/seconds tokens to signed decimal degrees,
/// rounded to four decimal places. `S` and `W` yield negative values.
pub fn to_decimal(deg: &str, min: &str, sec: &str, hemisphere: &str) -> Result<f64> {
    GpsCoordinate::from_tokens(deg, min, sec, hemisphere).map(|c| c.decimal)
}

fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64, hemisphere: Option<char>) -> f64 {
    let value = round4(degrees + minutes / 60.0 + seconds / 3600.0);
    match hemisphere.map(|h| h.to_ascii_uppercase()) {
        Some('S') | Some('W') => -value,
        _ => value,
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Read one coordinate (`GPSLatitude` + `GPSLatitudeRef`, or the longitude
/// pair) out of a GPS section.
///
/// `Ok(None)` when the coordinate tag is absent.
fn read_coordinate(gps: &TagMap, tag: &str, reference: &str) -> Result<Option<GpsCoordinate>> {
    let Some(value) = gps.get(tag) else {
        return Ok(None);
    };
    let RawValue::List(parts) = value else {
        return Err(MetaError::Conversion(format!("{tag} is not a degree/minute/second triple")));
    };
    let [deg, min, sec, ..] = parts.as_slice() else {
        return Err(MetaError::Conversion(format!(
            "{tag} has {} components, expected 3",
            parts.len()
        )));
    };
    let hemisphere = match gps.get(reference) {
        Some(RawValue::Scalar(h)) => h.as_str(),
        Some(RawValue::List(items)) => items.first().map(String::as_str).unwrap_or(""),
        None => "",
    };
    GpsCoordinate::from_tokens(deg, min, sec, hemisphere).map(Some)
}

/// Build the `COMPUTED_GPS` section from a raw `GPS` section.
///
/// Produces `GPS_Latitude`, `GPS_Longitude` and `GPS_Altitude` for whichever
/// source tags are present and convertible. Failed conversions are logged and
/// the affected entry is left out. The altitude token is passed through as-is:
/// neither its unit nor `GPSAltitudeRef` is applied.
pub fn compute_gps_section(gps: &TagMap) -> TagMap {
    let mut computed = TagMap::new();

    for (tag, reference, name) in [
        (TAG_LATITUDE, TAG_LATITUDE_REF, "GPS_Latitude"),
        (TAG_LONGITUDE, TAG_LONGITUDE_REF, "GPS_Longitude"),
    ] {
        match read_coordinate(gps, tag, reference) {
            Ok(Some(coord)) => {
                computed.insert(name.to_string(), RawValue::Scalar(coord.display()));
            }
            Ok(None) => log::debug!("No {tag} in GPS section"),
            Err(e) => log::warn!("Skipping {name}: {e}"),
        }
    }

    let altitude = match gps.get(TAG_ALTITUDE) {
        Some(RawValue::Scalar(a)) => Some(a.clone()),
        Some(RawValue::List(items)) => items.first().cloned(),
        None => None,
    };
    if let Some(altitude) = altitude {
        computed.insert("GPS_Altitude".to_string(), RawValue::Scalar(altitude));
    }

    computed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triple(a: &str, b: &str, c: &str) -> RawValue {
        RawValue::List(vec![a.into(), b.into(), c.into()])
    }

    fn scalar(s: &str) -> RawValue {
        RawValue::Scalar(s.to_string())
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-4
    }

    // ── parse_rational ───────────────────────────────────────────────

    #[test]
    fn rational_fraction() {
        assert_eq!(parse_rational("10/2").unwrap(), 5.0);
        assert_eq!(parse_rational("4046/100").unwrap(), 40.46);
    }

    #[test]
    fn rational_rounds_to_four_places() {
        assert_eq!(parse_rational("1/3").unwrap(), 0.3333);
        assert_eq!(parse_rational("2/3").unwrap(), 0.6667);
    }

    #[test]
    fn rational_plain_number() {
        assert_eq!(parse_rational("46").unwrap(), 46.0);
        assert_eq!(parse_rational("12.125").unwrap(), 12.125);
    }

    #[test]
    fn rational_zero_denominator_is_error() {
        assert!(matches!(parse_rational("5/0"), Err(MetaError::Conversion(_))));
    }

    #[test]
    fn rational_malformed_is_error() {
        assert!(matches!(parse_rational("abc"), Err(MetaError::Conversion(_))));
        assert!(matches!(parse_rational("1.5/2"), Err(MetaError::Conversion(_))));
        assert!(matches!(parse_rational(""), Err(MetaError::Conversion(_))));
    }

    // ── to_decimal ───────────────────────────────────────────────────

    #[test]
    fn decimal_from_fraction_degrees() {
        let value = to_decimal("10/2", "1", "0", "N").unwrap();
        assert!(approx(value, 5.0167), "got {value}");
    }

    #[test]
    fn decimal_north_and_south() {
        assert!(approx(to_decimal("40", "26", "46", "N").unwrap(), 40.4461));
        assert!(approx(to_decimal("40", "26", "46", "S").unwrap(), -40.4461));
    }

    #[test]
    fn decimal_east_and_west() {
        assert!(approx(to_decimal("79/1", "58/1", "56/1", "W").unwrap(), -79.9822));
        assert!(approx(to_decimal("79/1", "58/1", "56/1", "E").unwrap(), 79.9822));
    }

    #[test]
    fn missing_hemisphere_is_positive() {
        assert!(to_decimal("12", "0", "0", "").unwrap() > 0.0);
    }

    #[test]
    fn decimal_propagates_conversion_error() {
        assert!(to_decimal("40", "26/0", "46", "N").is_err());
    }

    #[test]
    fn coordinate_keeps_components() {
        let c = GpsCoordinate::from_tokens("40/1", "26/1", "4600/100", "N").unwrap();
        assert_eq!(c.degrees, 40.0);
        assert_eq!(c.minutes, 26.0);
        assert_eq!(c.seconds, 46.0);
        assert_eq!(c.hemisphere, Some('N'));
        assert_eq!(c.display(), "40 deg 26' 46 N--40.4461");
    }

    // ── compute_gps_section ──────────────────────────────────────────

    fn gps_section() -> TagMap {
        let mut gps = TagMap::new();
        gps.insert("GPSLatitude".into(), triple("40/1", "26/1", "46/1"));
        gps.insert("GPSLatitudeRef".into(), scalar("S"));
        gps.insert("GPSLongitude".into(), triple("79/1", "58/1", "56/1"));
        gps.insert("GPSLongitudeRef".into(), scalar("W"));
        gps.insert("GPSAltitude".into(), scalar("1234/10"));
        gps
    }

    #[test]
    fn computes_all_three_fields() {
        let computed = compute_gps_section(&gps_section());
        assert_eq!(computed.get("GPS_Latitude"), Some(&scalar("40 deg 26' 46 S---40.4461")));
        assert_eq!(computed.get("GPS_Longitude"), Some(&scalar("79 deg 58' 56 W---79.9822")));
        assert_eq!(computed.get("GPS_Altitude"), Some(&scalar("1234/10")));
    }

    #[test]
    fn missing_latitude_only_drops_latitude() {
        let mut gps = gps_section();
        gps.remove("GPSLatitude");
        let computed = compute_gps_section(&gps);
        assert!(!computed.contains_key("GPS_Latitude"));
        assert!(computed.contains_key("GPS_Longitude"));
        assert!(computed.contains_key("GPS_Altitude"));
    }

    #[test]
    fn bad_token_drops_only_that_coordinate() {
        let mut gps = gps_section();
        gps.insert("GPSLongitude".into(), triple("79/0", "58/1", "56/1"));
        let computed = compute_gps_section(&gps);
        assert!(computed.contains_key("GPS_Latitude"));
        assert!(!computed.contains_key("GPS_Longitude"));
    }

    #[test]
    fn short_triple_is_skipped() {
        let mut gps = TagMap::new();
        gps.insert("GPSLatitude".into(), RawValue::List(vec!["40/1".into()]));
        assert!(compute_gps_section(&gps).is_empty());
    }

    #[test]
    fn altitude_list_takes_first_element() {
        let mut gps = TagMap::new();
        gps.insert("GPSAltitude".into(), RawValue::List(vec!["50/1".into(), "1/1".into()]));
        assert_eq!(compute_gps_section(&gps).get("GPS_Altitude"), Some(&scalar("50/1")));
    }
}
