//! Identifier correspondence for building energy model documents
//!
//! Two RPD documents describing the same building use independently chosen
//! object ids. [`map_objects`] pairs the objects of a generated document with
//! those of a hand-authored reference so that their fields can be compared,
//! and [`evaluate_path`] extracts values from either tree with a small path
//! language.
//!
//! ```
//! use serde_json::json;
//!
//! let generated = json!({"buildings": [{"building_segments": [{"zones": [
//!     {"id": "Room 1"}, {"id": "Room 2"},
//! ]}]}]});
//! let reference = json!({"buildings": [{"building_segments": [{"zones": [
//!     {"id": "Zone 2"}, {"id": "Zone 1"},
//! ]}]}]});
//!
//! let (map, warnings, errors) = rpd_match::map_objects(&generated, &reference).into_parts();
//! assert_eq!(map.get("Room 1"), Some("Zone 1"));
//! assert!(warnings.is_empty() && errors.is_empty());
//! ```

mod config;
pub use config::{CategoryConfig, Config, ConfigError};

pub mod mapping;
pub use mapping::{CorrespondenceMap, Mapper, MappingOutcome, map_objects, map_objects_with};

pub mod matching;

pub mod model;
pub use model::load_document;

pub mod query;
pub use query::{Path, SyntaxError, evaluate_path};
