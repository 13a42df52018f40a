use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

/// One category's contribution to a [`CorrespondenceMap`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    category: String,
    pairs: Vec<(String, String)>,
}

impl Fragment {
    /// Creates an empty fragment for `category`.
    #[must_use]
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            pairs: Vec::new(),
        }
    }

    /// Adds a `generated → reference` pair.
    pub fn push(&mut self, generated: impl Into<String>, reference: impl Into<String>) {
        self.pairs.push((generated.into(), reference.into()));
    }

    /// The category this fragment belongs to.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// The `(generated, reference)` pairs in insertion order.
    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the fragment has no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl Extend<(String, String)> for Fragment {
    fn extend<T: IntoIterator<Item = (String, String)>>(&mut self, iter: T) {
        self.pairs.extend(iter);
    }
}

/// Errors that can occur when merging a fragment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    /// The generated id already has an image.
    #[error("generated id '{0}' is already mapped")]
    GeneratedAlreadyMapped(String),
    /// The reference id is already the image of another generated id.
    #[error("reference id '{0}' is already the image of another object")]
    ReferenceAlreadyMapped(String),
}

/// Injective mapping from generated-object ids to reference-object ids.
///
/// The map is built one category at a time by merging [`Fragment`]s. A merge
/// either succeeds entirely or leaves the map untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CorrespondenceMap {
    forward: BTreeMap<String, String>,

    #[serde(skip)]
    inverse: BTreeMap<String, String>,

    /// Generated ids grouped by the category that contributed them.
    #[serde(skip)]
    categories: BTreeMap<String, Vec<String>>,
}

impl CorrespondenceMap {
    /// Merges a category fragment.
    ///
    /// # Errors
    ///
    /// Returns a [`MergeError`] if any pair would make the map non-injective,
    /// either against existing entries or within the fragment. The map is not
    /// modified in that case.
    pub fn merge(&mut self, fragment: Fragment) -> Result<(), MergeError> {
        let mut generated = HashSet::new();
        let mut reference = HashSet::new();
        for (g, r) in &fragment.pairs {
            if self.forward.contains_key(g) || !generated.insert(g) {
                return Err(MergeError::GeneratedAlreadyMapped(g.clone()));
            }
            if self.inverse.contains_key(r) || !reference.insert(r) {
                return Err(MergeError::ReferenceAlreadyMapped(r.clone()));
            }
        }

        if fragment.pairs.is_empty() {
            return Ok(());
        }
        let members = self.categories.entry(fragment.category).or_default();
        for (g, r) in fragment.pairs {
            members.push(g.clone());
            self.inverse.insert(r.clone(), g.clone());
            self.forward.insert(g, r);
        }
        Ok(())
    }

    /// The reference id a generated id maps to.
    #[must_use]
    pub fn get(&self, generated: &str) -> Option<&str> {
        self.forward.get(generated).map(String::as_str)
    }

    /// The generated id mapping onto a reference id.
    #[must_use]
    pub fn preimage(&self, reference: &str) -> Option<&str> {
        self.inverse.get(reference).map(String::as_str)
    }

    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Whether the map has no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// All `(generated, reference)` pairs, ordered by generated id.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.forward.iter().map(|(g, r)| (g.as_str(), r.as_str()))
    }

    /// The pairs contributed by one category, in merge order.
    pub fn category(&self, name: &str) -> impl Iterator<Item = (&str, &str)> {
        self.categories
            .get(name)
            .into_iter()
            .flatten()
            .filter_map(|g| Some((g.as_str(), self.get(g)?)))
    }

    /// Names of the categories that contributed pairs.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }
}
