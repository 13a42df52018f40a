use std::collections::{HashMap, HashSet};

use petgraph::graph::NodeIndex;
use rayon::prelude::*;
use serde_json::Value;
use tracing::instrument;

use super::{Fragment, LowConfidence, Mapper, MappingError, MappingOutcome};
use crate::{
    matching::solve,
    model::{Category, ObjectGraph},
};

/// What happens to one configured category.
enum Plan<'c> {
    /// Neither document has members.
    Skip,
    /// The member counts differ.
    Reject(MappingError),
    /// Propagate, then fall back to identifier similarity.
    Resolve(&'c str),
}

type Resolution = Result<(Fragment, Vec<LowConfidence>), MappingError>;

/// Maps the configured categories by following references from objects
/// already in `outcome`.
///
/// Results are merged in configured category order.
#[instrument(skip_all)]
pub fn propagate(
    generated: &Value,
    reference: &Value,
    mapper: &Mapper,
    mut outcome: MappingOutcome,
) -> MappingOutcome {
    let categories: Vec<Category> = [mapper.zones.clone(), mapper.surfaces.clone()]
        .into_iter()
        .chain(mapper.categories.iter().cloned())
        .collect();
    let (generated, reference) = rayon::join(
        || ObjectGraph::build(generated, &categories, &mapper.reference_fields),
        || ObjectGraph::build(reference, &categories, &mapper.reference_fields),
    );

    let mut propagator = Propagator::new(generated, reference, &outcome);

    let plans: Vec<Plan> = mapper
        .categories
        .iter()
        .map(|category| propagator.plan(category.name()))
        .collect();
    let open: Vec<&str> = plans
        .iter()
        .filter_map(|plan| match plan {
            Plan::Resolve(name) => Some(*name),
            _ => None,
        })
        .collect();

    propagator.run(&open);

    let resolutions: Vec<Option<Resolution>> = plans
        .par_iter()
        .map(|plan| match plan {
            Plan::Skip => None,
            Plan::Reject(error) => Some(Err(error.clone())),
            Plan::Resolve(name) => Some(propagator.resolve(name, mapper)),
        })
        .collect();

    for resolution in resolutions.into_iter().flatten() {
        match resolution {
            Ok((fragment, warnings)) => {
                if outcome.absorb(Ok(fragment)) {
                    for warning in warnings {
                        outcome.warn(warning);
                    }
                }
            }
            Err(error) => {
                outcome.absorb(Err(error));
            }
        }
    }
    outcome
}

/// Object graphs of both documents and the node pairs mapped so far.
struct Propagator {
    generated: ObjectGraph,
    reference: ObjectGraph,
    forward: HashMap<NodeIndex, NodeIndex>,
    taken: HashSet<NodeIndex>,
}

impl Propagator {
    fn new(generated: ObjectGraph, reference: ObjectGraph, seed: &MappingOutcome) -> Self {
        let mut propagator = Self {
            generated,
            reference,
            forward: HashMap::new(),
            taken: HashSet::new(),
        };
        for (g, r) in seed.map.iter() {
            if let (Some(g), Some(r)) = (propagator.generated.find(g), propagator.reference.find(r)) {
                propagator.commit(g, r);
            }
        }
        tracing::debug!("Seeded propagation with {} objects", propagator.forward.len());
        propagator
    }

    fn commit(&mut self, generated: NodeIndex, reference: NodeIndex) {
        self.forward.insert(generated, reference);
        self.taken.insert(reference);
    }

    fn plan<'c>(&self, category: &'c str) -> Plan<'c> {
        let generated = self.generated.members(category);
        let reference = self.reference.members(category);
        if generated.len() != reference.len() {
            Plan::Reject(MappingError::CountMismatch {
                category: category.to_string(),
                generated: generated.len(),
                reference: reference.len(),
                unmatched: self.reference_ids(reference),
            })
        } else if generated.is_empty() {
            Plan::Skip
        } else {
            Plan::Resolve(category)
        }
    }

    fn reference_ids(&self, nodes: &[NodeIndex]) -> Vec<String> {
        nodes
            .iter()
            .map(|&node| self.reference.node(node).id.clone())
            .collect()
    }

    /// Commits unique structural proposals until a round adds nothing.
    fn run(&mut self, categories: &[&str]) {
        for round in 1_u32.. {
            let proposals: Vec<(NodeIndex, NodeIndex)> = categories
                .iter()
                .flat_map(|category| self.generated.members(category))
                .filter(|&&node| !self.forward.contains_key(&node))
                .filter_map(|&node| Some((node, self.candidate(node)?)))
                .collect();

            let mut claims: HashMap<NodeIndex, usize> = HashMap::new();
            for &(_, image) in &proposals {
                *claims.entry(image).or_default() += 1;
            }
            let accepted: Vec<_> = proposals
                .into_iter()
                .filter(|(_, image)| claims[image] == 1)
                .collect();

            tracing::debug!("Propagation round {round}: {} objects mapped", accepted.len());
            if accepted.is_empty() {
                break;
            }
            for (node, image) in accepted {
                self.commit(node, image);
            }
        }
    }

    /// The single untaken reference object related to the images of
    /// `node`'s mapped neighbours exactly as `node` is related to them.
    fn candidate(&self, node: NodeIndex) -> Option<NodeIndex> {
        let category = &self.generated.node(node).category;
        let same_category = |other: &NodeIndex| self.reference.node(*other).category == *category;
        let mut survivors: Option<HashSet<NodeIndex>> = None;

        for (label, target) in self.generated.outgoing(node) {
            let Some(&image) = self.forward.get(&target) else {
                continue;
            };
            let found = self
                .reference
                .incoming(image)
                .filter(|&(other, _)| other == label)
                .map(|(_, source)| source)
                .filter(same_category)
                .collect();
            narrow(&mut survivors, found);
        }

        for (label, source) in self.generated.incoming(node) {
            let Some(&image) = self.forward.get(&source) else {
                continue;
            };
            let found = self
                .reference
                .outgoing(image)
                .filter(|&(other, _)| other == label)
                .map(|(_, target)| target)
                .filter(same_category)
                .collect();
            narrow(&mut survivors, found);
        }

        let mut open = survivors?
            .into_iter()
            .filter(|image| !self.taken.contains(image));
        match (open.next(), open.next()) {
            (Some(image), None) => Some(image),
            _ => None,
        }
    }

    /// Collects the propagated pairs of a category and resolves the rest by
    /// identifier similarity.
    fn resolve(&self, category: &str, mapper: &Mapper) -> Resolution {
        let mut fragment = Fragment::new(category);
        let mut generated_open = Vec::new();
        for &node in self.generated.members(category) {
            let id = self.generated.node(node).id.as_str();
            match self.forward.get(&node) {
                Some(&image) => fragment.push(id, self.reference.node(image).id.as_str()),
                None => generated_open.push(id),
            }
        }
        let reference_open: Vec<&str> = self
            .reference
            .members(category)
            .iter()
            .filter(|&&node| !self.taken.contains(&node))
            .map(|&node| self.reference.node(node).id.as_str())
            .collect();

        if generated_open.is_empty() && reference_open.is_empty() {
            return Ok((fragment, Vec::new()));
        }
        tracing::debug!(
            "{category}: {} objects left for identifier fallback",
            generated_open.len()
        );

        // a rejected fallback discards the propagated pairs too
        let fallback = solve(
            category,
            &generated_open,
            &reference_open,
            mapper.scorer.as_ref(),
            mapper.tie_tolerance,
        )
        .map_err(|error| error.naming(self.reference_ids(self.reference.members(category))))?;
        let warnings = fallback
            .pairs()
            .iter()
            .map(|(generated, reference)| LowConfidence {
                category: category.to_string(),
                generated: generated.clone(),
                reference: reference.clone(),
            })
            .collect();
        fragment.extend(fallback.pairs().iter().cloned());
        Ok((fragment, warnings))
    }
}

fn narrow(survivors: &mut Option<HashSet<NodeIndex>>, found: HashSet<NodeIndex>) {
    *survivors = Some(match survivors.take() {
        Some(previous) => previous.intersection(&found).copied().collect(),
        None => found,
    });
}
