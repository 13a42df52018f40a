//! Object reference graph for one document.
//!
//! The [`ObjectGraph`] knows nothing about the other document or about any
//! mapping. It records which categorized objects exist and how they refer to
//! one another.
//!
//! Nodes are stored in an arena (`petgraph`'s [`DiGraph`]) and addressed by
//! stable [`NodeIndex`] handles, so cyclic references (a loop naming its pump
//! and the pump naming its loop) need no special treatment.
//!
//! Two kinds of edges are recorded:
//! - [`EdgeLabel::Reference`]: a string field under an object whose value is
//!   the id of another object. The edge points from the referring object to
//!   the referenced one and is labelled with the dotted field path relative to
//!   the referring object (array indices are dropped).
//! - [`EdgeLabel::Contained`]: an object nested inside another categorized
//!   object. The edge points from the child to its nearest categorized
//!   ancestor.

use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
};
use serde_json::Value;
use tracing::instrument;

use crate::{model::Category, query::child_pointer};

/// A categorized object in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectNode {
    /// Object identifier.
    pub id: String,
    /// Name of the category the object belongs to.
    pub category: String,
}

/// How two objects are related.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdgeLabel {
    /// The source object names the target in the given field.
    Reference(String),
    /// The source object is nested in the target under the given field.
    Contained(String),
}

impl fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reference(field) => f.write_str(field),
            Self::Contained(field) => write!(f, "^{field}"),
        }
    }
}

/// Categorized objects of one document and the references between them.
#[derive(Debug, Default)]
pub struct ObjectGraph {
    graph: DiGraph<ObjectNode, EdgeLabel>,

    /// Lookup from object id to node.
    by_id: HashMap<String, NodeIndex>,

    /// Members of each category, in document order.
    members: HashMap<String, Vec<NodeIndex>>,
}

impl ObjectGraph {
    /// Builds the graph of `document`.
    ///
    /// Objects are the values located by the category paths that carry a
    /// string `id`. An object located by more than one category belongs to
    /// the first. Ids must be unique within a document; later duplicates are
    /// skipped with a warning.
    ///
    /// If `reference_fields` is non-empty, only fields with one of these names
    /// are treated as references. Otherwise any string equal to the id of
    /// another object is a reference.
    #[instrument(skip_all)]
    pub fn build(document: &Value, categories: &[Category], reference_fields: &[String]) -> Self {
        let mut graph = Self::default();
        let mut by_pointer = HashMap::new();

        for category in categories {
            for path in category.paths() {
                for found in path.locate(document) {
                    if by_pointer.contains_key(&found.pointer) {
                        continue;
                    }
                    let Some(id) = found.value.get("id").and_then(Value::as_str) else {
                        tracing::debug!(
                            "Ignoring {} object without an id at '{}'",
                            category.name(),
                            found.pointer
                        );
                        continue;
                    };
                    if let Some(node) = graph.insert(id, category.name()) {
                        by_pointer.insert(found.pointer, node);
                    }
                }
            }
        }

        let mut walker = Walker {
            by_pointer: &by_pointer,
            reference_fields,
            references: Vec::new(),
            containment: Vec::new(),
        };
        walker.visit(document, "", None);

        let Walker {
            references,
            containment,
            ..
        } = walker;

        for (child, parent, field) in containment {
            graph
                .graph
                .add_edge(child, parent, EdgeLabel::Contained(field));
        }

        let mut seen = HashSet::new();
        for (source, field, target_id) in references {
            let Some(&target) = graph.by_id.get(&target_id) else {
                continue;
            };
            if target == source {
                continue;
            }
            let label = EdgeLabel::Reference(field);
            if seen.insert((source, target, label.clone())) {
                graph.graph.add_edge(source, target, label);
            }
        }

        tracing::debug!(
            "Built object graph with {} objects and {} edges",
            graph.graph.node_count(),
            graph.graph.edge_count()
        );

        graph
    }

    fn insert(&mut self, id: &str, category: &str) -> Option<NodeIndex> {
        if self.by_id.contains_key(id) {
            tracing::warn!("Duplicate object id '{id}' in {category}; keeping the first occurrence");
            return None;
        }
        let node = self.graph.add_node(ObjectNode {
            id: id.to_string(),
            category: category.to_string(),
        });
        self.by_id.insert(id.to_string(), node);
        self.members
            .entry(category.to_string())
            .or_default()
            .push(node);
        Some(node)
    }

    /// Retrieves an object by handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle does not belong to this graph.
    #[must_use]
    pub fn node(&self, node: NodeIndex) -> &ObjectNode {
        &self.graph[node]
    }

    /// Finds an object by id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<NodeIndex> {
        self.by_id.get(id).copied()
    }

    /// Members of a category in document order.
    #[must_use]
    pub fn members(&self, category: &str) -> &[NodeIndex] {
        self.members.get(category).map_or(&[], Vec::as_slice)
    }

    /// Number of objects in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether the graph has no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Edges leaving `node` as `(label, target)`.
    pub fn outgoing(&self, node: NodeIndex) -> impl Iterator<Item = (&EdgeLabel, NodeIndex)> + '_ {
        self.graph
            .edges_directed(node, Direction::Outgoing)
            .map(|edge| (edge.weight(), edge.target()))
    }

    /// Edges entering `node` as `(label, source)`.
    pub fn incoming(&self, node: NodeIndex) -> impl Iterator<Item = (&EdgeLabel, NodeIndex)> + '_ {
        self.graph
            .edges_directed(node, Direction::Incoming)
            .map(|edge| (edge.weight(), edge.source()))
    }
}

/// Nearest categorized ancestor of the value being visited, and the field
/// path leading from it.
struct Owner {
    node: NodeIndex,
    path: Vec<String>,
}

impl Owner {
    fn descend(&self, key: &str) -> Self {
        let mut path = self.path.clone();
        path.push(key.to_string());
        Self {
            node: self.node,
            path,
        }
    }

    fn label(&self) -> String {
        self.path.join(".")
    }
}

struct Walker<'a> {
    by_pointer: &'a HashMap<String, NodeIndex>,
    reference_fields: &'a [String],
    references: Vec<(NodeIndex, String, String)>,
    containment: Vec<(NodeIndex, NodeIndex, String)>,
}

impl Walker<'_> {
    fn visit(&mut self, value: &Value, pointer: &str, owner: Option<&Owner>) {
        match value {
            Value::Object(fields) => {
                let here;
                let owner = match self.by_pointer.get(pointer) {
                    Some(&node) => {
                        if let Some(parent) = owner {
                            self.containment.push((node, parent.node, parent.label()));
                        }
                        here = Owner {
                            node,
                            path: Vec::new(),
                        };
                        Some(&here)
                    }
                    None => owner,
                };

                for (key, child) in fields {
                    if key == "id" {
                        continue;
                    }
                    let pointer = child_pointer(pointer, key);
                    match owner {
                        Some(owner) => self.visit(child, &pointer, Some(&owner.descend(key))),
                        None => self.visit(child, &pointer, None),
                    }
                }
            }
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    self.visit(item, &child_pointer(pointer, &i.to_string()), owner);
                }
            }
            Value::String(text) => {
                if let Some(owner) = owner {
                    self.reference(owner, text);
                }
            }
            _ => {}
        }
    }

    fn reference(&mut self, owner: &Owner, target: &str) {
        let Some(field) = owner.path.last() else {
            return;
        };
        if !self.reference_fields.is_empty() && !self.reference_fields.contains(field) {
            return;
        }
        self.references
            .push((owner.node, owner.label(), target.to_string()));
    }
}
