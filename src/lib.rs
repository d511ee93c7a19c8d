//! # exif-meta
//!
//! EXIF and IPTC metadata extraction for JPEG and TIFF images: a sanitized
//! dump of every tag, GPS coordinates converted to signed decimal degrees, and
//! selective projection of configured fields into a key/value metadata store.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use exif_meta::config::Config;
//! use exif_meta::fields::FieldResolver;
//! use exif_meta::projector::{ExifProjector, ExtractionTarget};
//! use std::collections::BTreeMap;
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load(Some("config.json".as_ref()))?;
//!     let projector = ExifProjector::with_default_reader(config.sanitizer())?;
//!
//!     // Full dump: every section, every tag, printable UTF-8
//!     let tree = projector.dump(Path::new("photo.jpg"))?;
//!     println!("{}", serde_json::to_string_pretty(&tree)?);
//!
//!     // Selective merge: only the configured fields
//!     let resolver = FieldResolver::new();
//!     let fields = resolver.resolve(&config.meta_fields, &config.meta_labels)?;
//!     let mut store: BTreeMap<String, String> = BTreeMap::new();
//!     projector.extract_and_merge(&ExtractionTarget::file("photo.jpg"), &fields, &mut store)?;
//!     for (key, value) in &store {
//!         println!("{key}: {value}");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Sections
//!
//! | Section | Content |
//! |---------|---------|
//! | `IFD0` | Main image tags (`Make`, `Model`, `Software`, ...) |
//! | `EXIF` | Exif sub-IFD (`ExposureTime`, `DateTimeOriginal`, ...) |
//! | `GPS` | Raw GPS tags |
//! | `THUMBNAIL` | IFD1 tags |
//! | `COMPUTED_GPS` | `GPS_Latitude`, `GPS_Longitude`, `GPS_Altitude` |
//! | `IPTC` | Labelled IPTC datasets (`City`, `Copyright`, `Keywords`, ...) |
//!
//! ## Modules
//!
//! - [`config`]: Configuration types and loading/saving
//! - [`exif`]: Reader boundary, GPS conversion, IPTC decoding, sanitization
//! - [`fields`]: Field definitions and the memoizing resolver
//! - [`pipeline`]: Eligible image kinds and image collection
//! - [`projector`]: Full-dump and selective-merge extraction

pub mod config;
pub mod error;
pub mod exif;
pub mod fields;
pub mod pipeline;
pub mod projector;

pub use error::{MetaError, Result};
