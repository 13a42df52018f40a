//! Document model.
//!
//! Model documents are parsed JSON trees that are only ever borrowed. This
//! module holds the typed views the mapper needs (zones and their surfaces),
//! the named object categories, and the per-document object reference graph.

mod document;
pub use document::{Category, LoadError, SURFACES, ZONES, load_document};

/// Typed views of zones and surfaces.
pub mod zone;
pub use zone::{
    AdjacentTo, Fingerprint, Geometry, MAX_FINGERPRINT_DECIMALS, Surface, Zone, ZoneSet,
};

/// Object reference graph used for propagation.
pub mod graph;
pub use graph::{EdgeLabel, ObjectGraph, ObjectNode};
