use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use tracing::instrument;

use super::{Fragment, MappingError, MappingOutcome};
use crate::model::{Fingerprint, SURFACES, Surface, Zone};

/// An unordered pair of zone ids.
type ZonePair<'a> = (&'a str, &'a str);

fn zone_pair<'a>(a: &'a str, b: &'a str) -> ZonePair<'a> {
    if a <= b { (a, b) } else { (b, a) }
}

/// The far zone of an interior surface, if it names one.
fn far_zone(surface: &Surface) -> Option<&str> {
    if surface.is_interior() {
        surface.adjacent_zone.as_deref()
    } else {
        None
    }
}

/// A reference interior surface and the zone that records it.
struct Wall<'a> {
    owner: &'a str,
    surface: &'a Surface,
}

struct SurfaceMatcher<'a> {
    /// Generated zone id to its anchored reference zone.
    anchors: HashMap<&'a str, &'a Zone>,
    /// Reference interior surfaces by the zones they separate.
    walls: HashMap<ZonePair<'a>, Vec<Wall<'a>>>,
    decimals: u32,
}

impl<'a> SurfaceMatcher<'a> {
    fn new(
        generated: &'a [Zone],
        reference: &'a [Zone],
        outcome: &MappingOutcome,
        decimals: u32,
    ) -> Self {
        let by_id: HashMap<&str, &Zone> = reference
            .iter()
            .map(|zone| (zone.id.as_str(), zone))
            .collect();

        let anchors = generated
            .iter()
            .filter_map(|zone| {
                let image = outcome.map.get(&zone.id)?;
                Some((zone.id.as_str(), *by_id.get(image)?))
            })
            .collect();

        let mut walls: HashMap<ZonePair<'a>, Vec<Wall<'a>>> = HashMap::new();
        for zone in reference {
            for surface in &zone.surfaces {
                if let Some(far) = far_zone(surface) {
                    walls
                        .entry(zone_pair(&zone.id, far))
                        .or_default()
                        .push(Wall {
                            owner: &zone.id,
                            surface,
                        });
                }
            }
        }

        Self {
            anchors,
            walls,
            decimals,
        }
    }

    /// Proposes a reference surface for every surface of a generated zone
    /// that has exactly one candidate.
    fn match_zone(&self, zone: &'a Zone) -> Vec<(&'a str, &'a str)> {
        let Some(&anchor) = self.anchors.get(zone.id.as_str()) else {
            return Vec::new();
        };

        let generated_keys = self.fingerprints(zone);
        let reference_keys = self.fingerprints(anchor);

        let pairs: Vec<_> = zone
            .surfaces
            .iter()
            .filter_map(|surface| {
                let image = match far_zone(surface) {
                    Some(far) => self.match_wall(&zone.id, surface, far)?,
                    None => {
                        let key = surface.fingerprint(self.decimals);
                        match (
                            generated_keys.get(&key)?.as_slice(),
                            reference_keys.get(&key)?.as_slice(),
                        ) {
                            ([_], [image]) => *image,
                            _ => return None,
                        }
                    }
                };
                Some((surface.id.as_str(), image))
            })
            .collect();

        tracing::trace!(
            "{} -> {}: {} of {} surfaces proposed",
            zone.id,
            anchor.id,
            pairs.len(),
            zone.surfaces.len()
        );
        pairs
    }

    /// Non-interior surfaces of a zone grouped by fingerprint.
    fn fingerprints(&self, zone: &'a Zone) -> HashMap<Fingerprint, Vec<&'a str>> {
        let mut keys: HashMap<Fingerprint, Vec<&'a str>> = HashMap::new();
        for surface in zone.surfaces.iter().filter(|s| far_zone(s).is_none()) {
            keys.entry(surface.fingerprint(self.decimals))
                .or_default()
                .push(surface.id.as_str());
        }
        keys
    }

    /// Finds the reference wall between the images of `owner` and `far`.
    ///
    /// Several walls between the same zones are told apart by geometry,
    /// mirrored when the reference records the wall from the other side.
    fn match_wall(&self, owner: &str, surface: &Surface, far: &str) -> Option<&'a str> {
        let near = self.anchors.get(owner)?.id.as_str();
        let far = self.anchors.get(far)?.id.as_str();
        let candidates = self.walls.get(&zone_pair(near, far))?;

        if let [only] = candidates.as_slice() {
            return Some(only.surface.id.as_str());
        }

        let geometry = surface.geometry(self.decimals);
        let mut same = candidates.iter().filter(|wall| {
            let theirs = wall.surface.geometry(self.decimals);
            let theirs = if wall.owner == near {
                theirs
            } else {
                theirs.mirrored()
            };
            theirs == geometry
        });
        match (same.next(), same.next()) {
            (Some(wall), None) => Some(wall.surface.id.as_str()),
            _ => None,
        }
    }
}

/// Maps every surface of the anchored zones.
///
/// The stage is all-or-nothing: if any surface in either document is left
/// without a unique counterpart, no surface pair is merged.
#[instrument(skip_all)]
pub fn map_surfaces(
    generated: &[Zone],
    reference: &[Zone],
    decimals: u32,
    mut outcome: MappingOutcome,
) -> MappingOutcome {
    let matcher = SurfaceMatcher::new(generated, reference, &outcome, decimals);

    let proposals: Vec<(&str, &str)> = generated
        .par_iter()
        .map(|zone| matcher.match_zone(zone))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect();

    let mut claims: HashMap<&str, usize> = HashMap::new();
    for &(_, image) in &proposals {
        *claims.entry(image).or_default() += 1;
    }
    let pairs: Vec<(&str, &str)> = proposals
        .into_iter()
        .filter(|(surface, image)| {
            let unique = claims[image] == 1;
            if !unique {
                tracing::debug!("Withholding '{surface}': '{image}' is claimed more than once");
            }
            unique
        })
        .collect();

    outcome.absorb(complete(generated, reference, &pairs));
    outcome
}

fn complete(
    generated: &[Zone],
    reference: &[Zone],
    pairs: &[(&str, &str)],
) -> Result<Fragment, MappingError> {
    let matched: HashSet<&str> = pairs.iter().map(|(surface, _)| *surface).collect();
    let claimed: HashSet<&str> = pairs.iter().map(|(_, image)| *image).collect();

    let unresolved = leftover(reference, &claimed);
    if !unresolved.is_empty() {
        return Err(MappingError::Unresolved {
            category: SURFACES.to_string(),
            unresolved,
            unmatched: leftover(reference, &HashSet::new()),
        });
    }
    let surplus = leftover(generated, &matched);
    if !surplus.is_empty() {
        return Err(MappingError::Surplus {
            category: SURFACES.to_string(),
            generated: surplus,
            unmatched: leftover(reference, &HashSet::new()),
        });
    }

    let mut fragment = Fragment::new(SURFACES);
    fragment.extend(
        pairs
            .iter()
            .map(|(surface, image)| ((*surface).to_string(), (*image).to_string())),
    );
    Ok(fragment)
}

/// Surface ids of `zones` not in `taken`, in document order.
fn leftover(zones: &[Zone], taken: &HashSet<&str>) -> Vec<String> {
    zones
        .iter()
        .flat_map(|zone| &zone.surfaces)
        .map(|surface| surface.id.as_str())
        .filter(|id| !taken.contains(id))
        .map(ToString::to_string)
        .collect()
}
