use std::fmt;

use super::correspondence::MergeError;

/// A category that could not be mapped.
///
/// The category contributes nothing to the correspondence map, so every
/// reference id of the category is left unmatched. Each variant carries
/// those ids in `unmatched` and the rendered message names them all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    /// The documents hold different numbers of objects in the category.
    #[error(
        "{category}: {generated} generated but {reference} reference objects; unmatched reference ids: {}",
        list(.unmatched)
    )]
    CountMismatch {
        /// Category name.
        category: String,
        /// Number of generated objects.
        generated: usize,
        /// Number of reference objects.
        reference: usize,
        /// Every reference id in the category.
        unmatched: Vec<String>,
    },

    /// Identifier similarity cannot tell the remaining objects apart.
    #[error(
        "{category}: identifiers are indistinguishable; unmatched reference ids: {}",
        list(.unmatched)
    )]
    Tied {
        /// Category name.
        category: String,
        /// Every reference id in the category.
        unmatched: Vec<String>,
    },

    /// Reference objects without a unique counterpart after every strategy
    /// was tried.
    #[error(
        "{category}: could not resolve reference ids: {}; unmatched reference ids: {}",
        list(.unresolved),
        list(.unmatched)
    )]
    Unresolved {
        /// Category name.
        category: String,
        /// Reference ids no generated object claimed.
        unresolved: Vec<String>,
        /// Every reference id in the category.
        unmatched: Vec<String>,
    },

    /// Generated objects left over once every reference object was paired.
    #[error(
        "{category}: no reference counterpart for generated ids: {}; unmatched reference ids: {}",
        list(.generated),
        list(.unmatched)
    )]
    Surplus {
        /// Category name.
        category: String,
        /// Generated ids without a counterpart.
        generated: Vec<String>,
        /// Every reference id in the category.
        unmatched: Vec<String>,
    },

    /// An id occurs more than once within one document.
    #[error(
        "{category}: duplicate ids in the {document} document: {}; unmatched reference ids: {}",
        list(.ids),
        list(.unmatched)
    )]
    DuplicateIds {
        /// Category name.
        category: String,
        /// Which document (`generated` or `reference`).
        document: Side,
        /// The duplicated ids.
        ids: Vec<String>,
        /// Every reference id in the category.
        unmatched: Vec<String>,
    },

    /// Located objects that could not be read.
    #[error(
        "{category}: unreadable objects in the {document} document: {}; unmatched reference ids: {}",
        list(.objects),
        list(.unmatched)
    )]
    Unreadable {
        /// Category name.
        category: String,
        /// Which document (`generated` or `reference`).
        document: Side,
        /// The id of each unreadable object, or its JSON pointer when it
        /// has no string id.
        objects: Vec<String>,
        /// Every reference id in the category.
        unmatched: Vec<String>,
    },

    /// The fragment clashed with pairs merged by an earlier stage.
    #[error("{category}: {source}; unmatched reference ids: {}", list(.unmatched))]
    Conflict {
        /// Category name.
        category: String,
        /// The clash.
        source: MergeError,
        /// Every reference id in the category.
        unmatched: Vec<String>,
    },
}

impl MappingError {
    /// The category the error belongs to.
    #[must_use]
    pub fn category(&self) -> &str {
        match self {
            Self::CountMismatch { category, .. }
            | Self::Tied { category, .. }
            | Self::Unresolved { category, .. }
            | Self::Surplus { category, .. }
            | Self::DuplicateIds { category, .. }
            | Self::Unreadable { category, .. }
            | Self::Conflict { category, .. } => category,
        }
    }

    /// The reference ids left unmatched by the failure.
    #[must_use]
    pub fn unmatched(&self) -> &[String] {
        match self {
            Self::CountMismatch { unmatched, .. }
            | Self::Tied { unmatched, .. }
            | Self::Unresolved { unmatched, .. }
            | Self::Surplus { unmatched, .. }
            | Self::DuplicateIds { unmatched, .. }
            | Self::Unreadable { unmatched, .. }
            | Self::Conflict { unmatched, .. } => unmatched,
        }
    }

    /// Replaces the unmatched reference ids.
    ///
    /// Used when a solver only saw part of a category but the whole category
    /// is being discarded.
    #[must_use]
    pub fn naming(mut self, ids: Vec<String>) -> Self {
        match &mut self {
            Self::CountMismatch { unmatched, .. }
            | Self::Tied { unmatched, .. }
            | Self::Unresolved { unmatched, .. }
            | Self::Surplus { unmatched, .. }
            | Self::DuplicateIds { unmatched, .. }
            | Self::Unreadable { unmatched, .. }
            | Self::Conflict { unmatched, .. } => *unmatched = ids,
        }
        self
    }
}

/// Which of the two documents a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The automatically generated candidate.
    Generated,
    /// The hand-authored reference.
    Reference,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generated => f.write_str("generated"),
            Self::Reference => f.write_str("reference"),
        }
    }
}

/// A pairing made by identifier similarity alone.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{category}: mapped '{generated}' to '{reference}' by identifier similarity only")]
pub struct LowConfidence {
    /// Category name.
    pub category: String,
    /// Generated id.
    pub generated: String,
    /// Reference id.
    pub reference: String,
}

/// A warning or error produced while mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The mapping was made, with reduced confidence.
    Warning(LowConfidence),
    /// The category could not be mapped.
    Error(MappingError),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning(warning) => fmt::Display::fmt(warning, f),
            Self::Error(error) => fmt::Display::fmt(error, f),
        }
    }
}

fn list(ids: &[String]) -> String {
    ids.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tied_error_lists_every_reference_id() {
        let error = MappingError::Tied {
            category: "Zones".to_string(),
            unmatched: vec!["Zone 1".to_string(), "Zone 2".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "Zones: identifiers are indistinguishable; unmatched reference ids: Zone 1, Zone 2"
        );
        assert_eq!(error.category(), "Zones");
    }

    #[test]
    fn naming_replaces_the_unmatched_ids() {
        let error = MappingError::Tied {
            category: "Pumps".to_string(),
            unmatched: vec!["P2".to_string(), "P3".to_string()],
        }
        .naming(vec!["P1".to_string(), "P2".to_string(), "P3".to_string()]);
        assert_eq!(error.unmatched(), ["P1", "P2", "P3"]);
        assert_eq!(
            error.to_string(),
            "Pumps: identifiers are indistinguishable; unmatched reference ids: P1, P2, P3"
        );
    }

    #[test]
    fn warning_names_both_ids() {
        let warning = Diagnostic::Warning(LowConfidence {
            category: "Pumps".to_string(),
            generated: "HW Pump".to_string(),
            reference: "Hot Water Pump".to_string(),
        });
        assert_eq!(
            warning.to_string(),
            "Pumps: mapped 'HW Pump' to 'Hot Water Pump' by identifier similarity only"
        );
    }
}
