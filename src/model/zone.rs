use serde::Deserialize;
use serde_json::Value;

use crate::query::Path;

/// What lies on the far side of a surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjacentTo {
    /// Outdoor air.
    Exterior,
    /// Another zone, named by [`Surface::adjacent_zone`].
    Interior,
    /// Ground contact.
    Ground,
    /// A space with identical conditions.
    Identical,
    /// Not stated.
    #[default]
    Undefined,
    /// Any value this crate does not know about.
    #[serde(other)]
    Other,
}

/// A geometric boundary element of a zone.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Surface {
    /// Object identifier.
    pub id: String,
    /// Wall, ceiling, floor, ...
    #[serde(default)]
    pub classification: Option<String>,
    /// What the surface separates the zone from.
    #[serde(default)]
    pub adjacent_to: AdjacentTo,
    /// The zone on the far side, present for interior surfaces.
    #[serde(default)]
    pub adjacent_zone: Option<String>,
    /// Degrees clockwise from north, `[0, 360)`.
    #[serde(default)]
    pub azimuth: Option<f64>,
    /// Degrees from horizontal facing up, `[0, 180]`.
    #[serde(default)]
    pub tilt: Option<f64>,
    /// Gross area.
    #[serde(default)]
    pub area: Option<f64>,
}

/// A thermal zone and its boundary surfaces.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Zone {
    /// Object identifier.
    pub id: String,
    /// Boundary surfaces in document order.
    #[serde(default)]
    pub surfaces: Vec<Surface>,
}

/// The most decimals surface geometry is rounded to.
pub const MAX_FINGERPRINT_DECIMALS: u32 = 9;

/// Exact-match key for a surface within a zone.
///
/// Real-valued attributes are rounded to a fixed number of decimals so that
/// serialization noise does not break equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint {
    classification: Option<String>,
    adjacent_to: AdjacentTo,
    geometry: Geometry,
}

/// Rounded orientation and size of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Geometry {
    tilt: Option<i64>,
    area: Option<i64>,
    azimuth: Option<i64>,
    scale: i64,
}

impl Geometry {
    /// The same surface seen from the zone on the other side.
    ///
    /// Tilt becomes `180 - tilt` and azimuth turns by 180 degrees.
    #[must_use]
    pub fn mirrored(self) -> Self {
        let half_turn = 180 * self.scale;
        Self {
            tilt: self.tilt.map(|tilt| half_turn - tilt),
            azimuth: self
                .azimuth
                .map(|azimuth| (azimuth + half_turn).rem_euclid(2 * half_turn)),
            ..self
        }
    }
}

impl Surface {
    /// Whether the surface is an edge between two zones.
    #[must_use]
    pub fn is_interior(&self) -> bool {
        self.adjacent_to == AdjacentTo::Interior
    }

    /// Rounded tilt, area and azimuth.
    ///
    /// `decimals` is capped at [`MAX_FINGERPRINT_DECIMALS`].
    #[must_use]
    pub fn geometry(&self, decimals: u32) -> Geometry {
        let scale = 10_i64.pow(decimals.min(MAX_FINGERPRINT_DECIMALS));
        let quantize = |value: f64| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
            let quantized = (value * scale as f64).round() as i64;
            quantized
        };
        Geometry {
            tilt: self.tilt.map(quantize),
            area: self.area.map(quantize),
            azimuth: self
                .azimuth
                .map(|azimuth| quantize(azimuth).rem_euclid(360 * scale)),
            scale,
        }
    }

    /// The exact-match key used for exterior surfaces.
    #[must_use]
    pub fn fingerprint(&self, decimals: u32) -> Fingerprint {
        Fingerprint {
            classification: self.classification.clone(),
            adjacent_to: self.adjacent_to,
            geometry: self.geometry(decimals),
        }
    }
}

/// The zones located in one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneSet {
    /// Zones that could be read, in document order.
    pub zones: Vec<Zone>,
    /// Located zones that could not be read, named by their `id` or, when
    /// they have no string id, by JSON pointer.
    pub unreadable: Vec<String>,
    /// The name of every located zone, readable or not, in document order.
    pub ids: Vec<String>,
}

impl Zone {
    /// Collects every zone located by `paths`, in document order.
    ///
    /// A zone that cannot be read (no `id`, or a malformed surface) is kept
    /// in [`ZoneSet::unreadable`] so that callers can fail the zone stage.
    #[must_use]
    pub fn collect(document: &Value, paths: &[Path]) -> ZoneSet {
        let mut set = ZoneSet::default();
        for found in paths.iter().flat_map(|path| path.locate(document)) {
            let name = found
                .value
                .get("id")
                .and_then(Value::as_str)
                .map_or_else(|| found.pointer.clone(), ToString::to_string);
            match Self::deserialize(found.value) {
                Ok(zone) => set.zones.push(zone),
                Err(e) => {
                    tracing::warn!("Unreadable zone at '{}': {e}", found.pointer);
                    set.unreadable.push(name.clone());
                }
            }
            set.ids.push(name);
        }
        set
    }
}
