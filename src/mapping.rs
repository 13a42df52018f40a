//! Identifier correspondence between a generated and a reference document.
//!
//! Mapping runs in three stages, each receiving and returning the same
//! [`MappingOutcome`] accumulator:
//!
//! 1. [`zones`]: identifier similarity over zones. Every later stage is
//!    anchored on this result; if it fails nothing else runs.
//! 2. [`surfaces`]: exterior surfaces by exact geometric fingerprint within
//!    each zone pair, interior surfaces as edges between zone pairs.
//! 3. [`propagate`]: every other category, by following object references
//!    out from the anchored objects, falling back to identifier similarity.
//!
//! Each category either contributes a complete bijection or nothing at all
//! plus one error naming the reference ids left unmatched.

use serde_json::Value;
use tracing::instrument;

use crate::{
    config::{Config, ConfigError},
    matching::{Levenshtein, Scorer},
    model::{Category, SURFACES, ZONES, Zone},
    query::{Path, Step},
};

mod correspondence;
pub use correspondence::{CorrespondenceMap, Fragment, MergeError};

mod diagnostic;
pub use diagnostic::{Diagnostic, LowConfidence, MappingError, Side};

/// Zone anchoring.
pub mod zones;

/// Exterior and interior surface matching.
pub mod surfaces;

/// Reference-graph propagation to the remaining categories.
pub mod propagate;

/// The correspondence map built so far and the diagnostics raised on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingOutcome {
    /// Generated id to reference id.
    pub map: CorrespondenceMap,
    /// Warnings and errors in the order they were raised.
    pub diagnostics: Vec<Diagnostic>,
}

impl MappingOutcome {
    /// Merges a category result into the map.
    ///
    /// A failed category, or a fragment that would break injectivity,
    /// contributes nothing and is recorded as an error. A fragment always
    /// covers its whole category, so a clash leaves every reference id in
    /// it unmatched.
    pub fn absorb(&mut self, result: Result<Fragment, MappingError>) -> bool {
        let error = match result {
            Ok(fragment) => {
                let category = fragment.category().to_string();
                let unmatched = fragment.pairs().iter().map(|(_, r)| r.clone()).collect();
                match self.map.merge(fragment) {
                    Ok(()) => return true,
                    Err(source) => MappingError::Conflict {
                        category,
                        source,
                        unmatched,
                    },
                }
            }
            Err(error) => error,
        };
        tracing::debug!("{error}");
        self.diagnostics.push(Diagnostic::Error(error));
        false
    }

    /// Records a low-confidence pairing.
    pub fn warn(&mut self, warning: LowConfidence) {
        self.diagnostics.push(Diagnostic::Warning(warning));
    }

    /// Warning messages in order.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::Warning(_)))
            .map(ToString::to_string)
            .collect()
    }

    /// Error messages in order.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::Error(_)))
            .map(ToString::to_string)
            .collect()
    }

    /// Whether any category failed.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::Error(_)))
    }

    /// Splits the outcome into `(map, warnings, errors)`.
    #[must_use]
    pub fn into_parts(self) -> (CorrespondenceMap, Vec<String>, Vec<String>) {
        let warnings = self.warnings();
        let errors = self.errors();
        (self.map, warnings, errors)
    }
}

/// Maps generated objects onto reference objects.
pub struct Mapper {
    zones: Category,
    surfaces: Category,
    categories: Vec<Category>,
    reference_fields: Vec<String>,
    fingerprint_decimals: u32,
    tie_tolerance: f64,
    scorer: Box<dyn Scorer>,
}

impl std::fmt::Debug for Mapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapper")
            .field("zones", &self.zones)
            .field("categories", &self.categories)
            .field("reference_fields", &self.reference_fields)
            .field("fingerprint_decimals", &self.fingerprint_decimals)
            .field("tie_tolerance", &self.tie_tolerance)
            .finish_non_exhaustive()
    }
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new(&Config::default()).expect("default configuration paths are valid")
    }
}

impl Mapper {
    /// Creates a mapper from a configuration, scoring identifiers with
    /// [`Levenshtein`].
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any configured path is malformed or the
    /// fingerprint precision is out of range.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let zone_paths = config.parsed_zone_paths()?;
        let surface_paths = zone_paths
            .iter()
            .map(|path| {
                path.then(Step::Field("surfaces".to_string()))
                    .then(Step::Wildcard)
            })
            .collect();

        Ok(Self {
            zones: Category::new(ZONES, zone_paths),
            surfaces: Category::new(SURFACES, surface_paths),
            categories: config.parsed_categories()?,
            reference_fields: config.reference_fields().to_vec(),
            fingerprint_decimals: config.fingerprint_decimals(),
            tie_tolerance: config.tie_tolerance(),
            scorer: Box::new(Levenshtein),
        })
    }

    /// Replaces the identifier scorer.
    #[must_use]
    pub fn with_scorer(mut self, scorer: impl Scorer + 'static) -> Self {
        self.scorer = Box::new(scorer);
        self
    }

    /// Builds the correspondence map between two documents.
    #[instrument(skip_all)]
    pub fn map(&self, generated: &Value, reference: &Value) -> MappingOutcome {
        let generated_zones = Zone::collect(generated, self.zones.paths());
        let reference_zones = Zone::collect(reference, self.zones.paths());

        let outcome = zones::map_zones(
            &generated_zones,
            &reference_zones,
            self.scorer.as_ref(),
            self.tie_tolerance,
            MappingOutcome::default(),
        );
        if outcome.has_errors() {
            tracing::warn!("Zones could not be mapped; skipping surfaces and other objects");
            return outcome;
        }

        let outcome = surfaces::map_surfaces(
            &generated_zones.zones,
            &reference_zones.zones,
            self.fingerprint_decimals,
            outcome,
        );

        let outcome = propagate::propagate(generated, reference, self, outcome);

        tracing::info!(
            "Mapped {} objects with {} warnings and {} errors",
            outcome.map.len(),
            outcome.warnings().len(),
            outcome.errors().len()
        );
        outcome
    }

    fn zone_paths(&self) -> &[Path] {
        self.zones.paths()
    }
}

/// Maps `generated` onto `reference` using the default configuration.
#[must_use]
pub fn map_objects(generated: &Value, reference: &Value) -> MappingOutcome {
    Mapper::default().map(generated, reference)
}

/// Maps `generated` onto `reference` using `config`.
///
/// # Errors
///
/// Returns a [`ConfigError`] if `config` does not pass
/// [`Config::validate`].
pub fn map_objects_with(
    generated: &Value,
    reference: &Value,
    config: &Config,
) -> Result<MappingOutcome, ConfigError> {
    Ok(Mapper::new(config)?.map(generated, reference))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absorb_records_failed_categories() {
        let mut outcome = MappingOutcome::default();
        let mut zones = Fragment::new(ZONES);
        zones.push("Room 1", "Zone 1");
        assert!(outcome.absorb(Ok(zones)));

        let mut clash = Fragment::new("Systems");
        clash.push("Room 1", "System 1");
        assert!(!outcome.absorb(Ok(clash)));

        assert_eq!(outcome.map.len(), 1);
        assert_eq!(
            outcome.errors(),
            vec![
                "Systems: generated id 'Room 1' is already mapped; unmatched reference ids: System 1"
                    .to_string()
            ]
        );
        assert!(outcome.warnings().is_empty());
    }

    #[test]
    fn into_parts_separates_warnings_from_errors() {
        let mut outcome = MappingOutcome::default();
        outcome.warn(LowConfidence {
            category: "Pumps".to_string(),
            generated: "P".to_string(),
            reference: "Pump".to_string(),
        });
        outcome.absorb(Err(MappingError::Unresolved {
            category: "Boilers".to_string(),
            unresolved: vec!["B1".to_string()],
            unmatched: vec!["B1".to_string(), "B2".to_string()],
        }));

        let (map, warnings, errors) = outcome.into_parts();
        assert!(map.is_empty());
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            errors,
            vec!["Boilers: could not resolve reference ids: B1; unmatched reference ids: B1, B2".to_string()]
        );
    }

    #[test]
    fn mapper_rejects_malformed_config_paths() {
        let mut config = Config::default();
        config.set_zone_paths(&["$.zones["]);
        assert!(matches!(Mapper::new(&config), Err(ConfigError::Syntax(_))));
    }

    #[test]
    fn mapper_rejects_excessive_fingerprint_precision() {
        let mut config = Config::default();
        config.set_fingerprint_decimals(19);
        assert_eq!(
            Mapper::new(&config).unwrap_err(),
            ConfigError::FingerprintDecimals(19)
        );
    }

    #[test]
    fn surface_paths_extend_zone_paths() {
        let mut config = Config::default();
        config.set_zone_paths(&["$.zones[*]"]);
        let mapper = Mapper::new(&config).unwrap();
        assert_eq!(mapper.surfaces.paths()[0].to_string(), "$.zones[*].surfaces[*]");
        assert_eq!(mapper.zone_paths()[0].to_string(), "$.zones[*]");
    }
}
