use std::collections::HashSet;

use tracing::instrument;

use super::{MappingError, MappingOutcome, Side};
use crate::{
    matching::{Scorer, solve},
    model::{ZONES, Zone, ZoneSet},
};

/// Pairs generated zones with reference zones by identifier similarity.
///
/// An unreadable zone or a duplicated zone id in either document fails the
/// stage before any scoring happens.
#[instrument(skip_all, fields(generated = generated.ids.len(), reference = reference.ids.len()))]
pub fn map_zones(
    generated: &ZoneSet,
    reference: &ZoneSet,
    scorer: &dyn Scorer,
    tolerance: f64,
    mut outcome: MappingOutcome,
) -> MappingOutcome {
    let generated_ids = ids(&generated.zones);
    let reference_ids = ids(&reference.zones);

    let result = check_readable(generated, Side::Generated)
        .and_then(|()| check_readable(reference, Side::Reference))
        .and_then(|()| check_unique(&generated_ids, Side::Generated))
        .and_then(|()| check_unique(&reference_ids, Side::Reference))
        .and_then(|()| solve(ZONES, &generated_ids, &reference_ids, scorer, tolerance))
        .map_err(|error| error.naming(reference.ids.clone()));

    if outcome.absorb(result) {
        tracing::debug!("Anchored {} zones", generated_ids.len());
    }
    outcome
}

fn ids(zones: &[Zone]) -> Vec<&str> {
    zones.iter().map(|zone| zone.id.as_str()).collect()
}

fn check_readable(set: &ZoneSet, document: Side) -> Result<(), MappingError> {
    if set.unreadable.is_empty() {
        Ok(())
    } else {
        Err(MappingError::Unreadable {
            category: ZONES.to_string(),
            document,
            objects: set.unreadable.clone(),
            unmatched: Vec::new(),
        })
    }
}

fn check_unique(ids: &[&str], document: Side) -> Result<(), MappingError> {
    let mut seen = HashSet::new();
    let mut duplicates: Vec<String> = Vec::new();
    for &id in ids {
        if !seen.insert(id) && !duplicates.iter().any(|d| d == id) {
            duplicates.push(id.to_string());
        }
    }
    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(MappingError::DuplicateIds {
            category: ZONES.to_string(),
            document,
            ids: duplicates,
            unmatched: Vec::new(),
        })
    }
}
