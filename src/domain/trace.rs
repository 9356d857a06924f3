//! Requirements traceability.
//!
//! A [`Trace`] is a read-only index built in one pass over everything
//! reachable from a namespace. Relationships become edges of a directed graph
//! from client to supplier, so the relationships touching a requirement are
//! found from its neighbours rather than by rescanning the model.

use std::collections::{BTreeMap, HashMap, HashSet};

use petgraph::{algo::tarjan_scc, graphmap::DiGraphMap, Direction};
use tracing::{debug, instrument, trace};
use uuid::Uuid;

use crate::domain::{
    registry::Registry,
    relationship::{RelationshipKind, Role},
    ElementRef, ModelElement, Relationship, Requirement,
};

/// One relationship touching a requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    /// The relationship itself.
    pub relationship: ElementRef,
    /// The role the requirement plays in it.
    pub role: Role,
    /// The element at the other end.
    pub counterpart: ElementRef,
    /// Whether the counterpart is no longer reachable from the traced
    /// namespace.
    pub dangling: bool,
}

/// One row of the requirements traceability matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixRow<'a> {
    /// The traced requirement.
    pub requirement: &'a Requirement,
    /// Relationships touching it, grouped by kind.
    pub links: BTreeMap<RelationshipKind, Vec<TraceEntry>>,
}

/// Traceability index over a namespace.
///
/// The index borrows the namespace, so it reflects the model as it was when
/// built and the model cannot change while it is alive.
#[derive(Debug)]
pub struct Trace<'a> {
    /// Edges run client → supplier, weighted with every relationship between
    /// that pair in walk order.
    links: DiGraphMap<Uuid, Vec<&'a Relationship>>,
    /// `DeriveReqt` edges only, derived → source.
    derivations: DiGraphMap<Uuid, ()>,
    requirements: Vec<&'a Requirement>,
    endpoints: HashMap<Uuid, &'a ElementRef>,
    reachable: HashSet<Uuid>,
    relationship_count: usize,
}

impl<'a> Trace<'a> {
    /// Indexes every relationship and requirement reachable from `registry`.
    #[instrument(skip(registry), fields(bindings = registry.len()))]
    pub fn build(registry: &'a Registry) -> Self {
        let views = registry.walk();
        let reachable: HashSet<Uuid> = views.iter().map(ModelElement::id).collect();
        let mut requirements = Vec::new();
        let mut relationships = Vec::new();
        for view in views {
            if let Some(requirement) = view.as_requirement() {
                requirements.push(requirement);
            } else if let Some(relationship) = view.as_relationship() {
                relationships.push(relationship);
            }
        }

        let mut links: DiGraphMap<Uuid, Vec<&'a Relationship>> =
            DiGraphMap::with_capacity(relationships.len() * 2, relationships.len());
        let mut derivations = DiGraphMap::new();
        let mut endpoints = HashMap::new();

        for &relationship in &relationships {
            let client = relationship.client();
            let supplier = relationship.supplier();
            trace!(%relationship, %client, %supplier, "indexing relationship");

            for endpoint in [client, supplier] {
                if !reachable.contains(&endpoint.id()) {
                    debug!(%relationship, %endpoint, "dangling endpoint");
                }
                endpoints.insert(endpoint.id(), endpoint);
            }

            if let Some(existing) = links.edge_weight_mut(client.id(), supplier.id()) {
                existing.push(relationship);
            } else {
                links.add_edge(client.id(), supplier.id(), vec![relationship]);
            }

            if relationship.relationship_kind() == RelationshipKind::DeriveReqt {
                derivations.add_edge(client.id(), supplier.id(), ());
            }
        }

        debug!(
            requirements = requirements.len(),
            relationships = relationships.len(),
            "built trace"
        );

        Self {
            links,
            derivations,
            requirements,
            endpoints,
            reachable,
            relationship_count: relationships.len(),
        }
    }

    /// The number of indexed relationships.
    #[must_use]
    pub const fn relationship_count(&self) -> usize {
        self.relationship_count
    }

    /// The relationships touching the element with identity `id`, grouped by
    /// kind.
    ///
    /// Within a kind, relationships where the element is the client come
    /// first. A relationship from an element to itself appears once in each
    /// role.
    #[must_use]
    pub fn matrix_for(&self, id: Uuid) -> BTreeMap<RelationshipKind, Vec<TraceEntry>> {
        let mut matrix: BTreeMap<RelationshipKind, Vec<TraceEntry>> = BTreeMap::new();
        if !self.links.contains_node(id) {
            return matrix;
        }

        for (direction, role) in [
            (Direction::Outgoing, Role::Client),
            (Direction::Incoming, Role::Supplier),
        ] {
            for neighbour in self.links.neighbors_directed(id, direction) {
                let (from, to) = match direction {
                    Direction::Outgoing => (id, neighbour),
                    Direction::Incoming => (neighbour, id),
                };
                let Some(relationships) = self.links.edge_weight(from, to) else {
                    continue;
                };
                for relationship in relationships {
                    let counterpart = relationship.endpoint(role.opposite());
                    matrix
                        .entry(relationship.relationship_kind())
                        .or_default()
                        .push(TraceEntry {
                            relationship: relationship.handle(),
                            role,
                            counterpart: counterpart.clone(),
                            dangling: !self.reachable.contains(&counterpart.id()),
                        });
                }
            }
        }

        matrix
    }

    /// The full traceability matrix: one row per reachable requirement,
    /// ordered by identifier.
    #[must_use]
    pub fn matrix(&self) -> Vec<MatrixRow<'a>> {
        let mut rows: Vec<MatrixRow<'a>> = self
            .requirements
            .iter()
            .map(|&requirement| MatrixRow {
                requirement,
                links: self.matrix_for(requirement.id()),
            })
            .collect();
        rows.sort_by(|a, b| {
            a.requirement
                .identifier()
                .cmp(b.requirement.identifier())
                .then_with(|| a.requirement.name().cmp(b.requirement.name()))
        });
        rows
    }

    /// Requirements that derive from themselves, directly or transitively.
    ///
    /// Each cycle is sorted by name, and the cycles are sorted among
    /// themselves.
    #[must_use]
    pub fn derivation_cycles(&self) -> Vec<Vec<&'a ElementRef>> {
        let mut cycles = Vec::new();

        for component in tarjan_scc(&self.derivations) {
            if component.len() == 1 {
                let Some(&node) = component.first() else {
                    continue;
                };
                if !self.derivations.contains_edge(node, node) {
                    continue;
                }
            }
            let mut members: Vec<&'a ElementRef> = component
                .iter()
                .filter_map(|id| self.endpoints.get(id).copied())
                .collect();
            members.sort_by(|a, b| a.name().cmp(b.name()).then(a.id().cmp(&b.id())));
            cycles.push(members);
        }

        cycles.sort_by(|a, b| a.iter().map(|r| r.name()).cmp(b.iter().map(|r| r.name())));
        cycles
    }
}
