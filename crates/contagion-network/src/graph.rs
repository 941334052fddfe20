//! Trust graph: agents as nodes, provider-to-receiver edges with trust weights.
//!
//! The [`TrustGraph`] is immutable once built. An edge `p -> r` says that
//! agent `p` is an information provider of agent `r`; its weight is how much
//! `r` trusts `p`. The weights of all in-edges of one receiver sum to 1.
//!
//! Internally two adjacency maps are kept: inbound weights per receiver
//! (`BTreeMap<AgentId, BTreeMap<AgentId, f64>>`) and outbound neighbors per
//! provider. Both are ordered so iteration is deterministic.
//!
//! Graph *generation* lives outside this crate. Callers either hand in an
//! edge list, or implement [`GraphGenerator`] to synthesize a topology on
//! demand.

use std::collections::{BTreeMap, BTreeSet};

use contagion_types::AgentId;
use serde::{Deserialize, Serialize};

use crate::error::NetworkError;

/// Tolerance when checking that in-edge weights of a receiver sum to 1.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// One weighted provider-to-receiver edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrustEdge {
    /// The agent passing information on.
    pub provider: AgentId,
    /// The agent receiving it.
    pub receiver: AgentId,
    /// Trust the receiver places in the provider.
    pub weight: f64,
}

impl TrustEdge {
    /// Create an edge.
    pub const fn new(provider: AgentId, receiver: AgentId, weight: f64) -> Self {
        Self {
            provider,
            receiver,
            weight,
        }
    }
}

/// How raw edge weights are assigned before per-receiver normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeWeighting {
    /// Use the weights given with each edge (any positive values).
    Explicit,
    /// Every provider of a receiver gets the same weight.
    #[default]
    Uniform,
    /// Each edge is weighted by the out-degree of its provider, so
    /// well-connected agents are trusted more.
    OutDegree,
}

/// Source of synthesized topologies (power-law, small-world, ...).
///
/// Implementations live outside the core; the network only requires that
/// the returned graph spans exactly `agent_count` agents.
pub trait GraphGenerator {
    /// Build a trust graph over agents `0..agent_count`.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError`] if the generated edges are inconsistent.
    fn generate(&mut self, agent_count: u32) -> Result<TrustGraph, NetworkError>;
}

/// Immutable directed graph of trust relations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrustGraph {
    /// Number of agents; valid ids are `0..agent_count`.
    agent_count: u32,
    /// Inbound adjacency: receiver -> provider -> normalized weight.
    inbound: BTreeMap<AgentId, BTreeMap<AgentId, f64>>,
    /// Outbound adjacency: provider -> receivers.
    outbound: BTreeMap<AgentId, BTreeSet<AgentId>>,
    /// Total number of edges.
    edge_count: usize,
}

impl TrustGraph {
    /// Create a graph with `agent_count` agents and no edges.
    pub fn empty(agent_count: u32) -> Self {
        let mut inbound = BTreeMap::new();
        let mut outbound = BTreeMap::new();
        for raw in 0..agent_count {
            inbound.insert(AgentId::new(raw), BTreeMap::new());
            outbound.insert(AgentId::new(raw), BTreeSet::new());
        }
        Self {
            agent_count,
            inbound,
            outbound,
            edge_count: 0,
        }
    }

    /// Build a graph from already-normalized weighted edges.
    ///
    /// # Errors
    ///
    /// - [`NetworkError::InconsistentTopology`] if an edge names an agent
    ///   outside `0..agent_count`, is a self-loop, is duplicated, or if the
    ///   in-edge weights of some receiver do not sum to 1 within
    ///   [`WEIGHT_TOLERANCE`].
    /// - [`NetworkError::InvalidArgument`] if a weight is not in `(0, 1]`.
    pub fn new(
        agent_count: u32,
        edges: impl IntoIterator<Item = TrustEdge>,
    ) -> Result<Self, NetworkError> {
        let mut graph = Self::empty(agent_count);
        for edge in edges {
            if !(edge.weight > 0.0 && edge.weight <= 1.0) {
                return Err(NetworkError::invalid(format!(
                    "trust weight on edge {} -> {} must be in (0, 1], got {}",
                    edge.provider, edge.receiver, edge.weight
                )));
            }
            graph.insert_edge(edge)?;
        }
        graph.check_normalized()?;
        Ok(graph)
    }

    /// Build a graph from `(provider, receiver, raw weight)` triples,
    /// normalizing the weights over each receiver's in-edges.
    ///
    /// The raw weight is only read for [`EdgeWeighting::Explicit`]; the
    /// other schemes derive it from the topology.
    ///
    /// # Errors
    ///
    /// Same conditions as [`TrustGraph::new`]; additionally
    /// [`NetworkError::InvalidArgument`] if an explicit raw weight is not a
    /// positive finite number.
    pub fn from_raw_edges(
        agent_count: u32,
        edges: &[(AgentId, AgentId, f64)],
        weighting: EdgeWeighting,
    ) -> Result<Self, NetworkError> {
        // Insert with placeholder weights first so topology errors surface
        // before any weighting arithmetic.
        let mut topology = Self::empty(agent_count);
        for &(provider, receiver, _) in edges {
            topology.insert_edge(TrustEdge::new(provider, receiver, 1.0))?;
        }

        let mut raw: Vec<TrustEdge> = Vec::with_capacity(edges.len());
        for &(provider, receiver, weight) in edges {
            let raw_weight = match weighting {
                EdgeWeighting::Explicit => {
                    if !(weight.is_finite() && weight > 0.0) {
                        return Err(NetworkError::invalid(format!(
                            "raw weight on edge {provider} -> {receiver} must be positive, got {weight}"
                        )));
                    }
                    weight
                }
                EdgeWeighting::Uniform => 1.0,
                EdgeWeighting::OutDegree => {
                    let degree = u32::try_from(topology.out_degree(provider)).unwrap_or(u32::MAX);
                    f64::from(degree)
                }
            };
            raw.push(TrustEdge::new(provider, receiver, raw_weight));
        }

        let mut totals: BTreeMap<AgentId, f64> = BTreeMap::new();
        for edge in &raw {
            *totals.entry(edge.receiver).or_insert(0.0) += edge.weight;
        }
        let normalized = raw.into_iter().map(|edge| {
            let total = totals.get(&edge.receiver).copied().unwrap_or(1.0);
            TrustEdge::new(edge.provider, edge.receiver, edge.weight / total)
        });
        Self::new(agent_count, normalized)
    }

    /// Insert one edge, checking endpoints and uniqueness.
    fn insert_edge(&mut self, edge: TrustEdge) -> Result<(), NetworkError> {
        for endpoint in [edge.provider, edge.receiver] {
            if endpoint.into_inner() >= self.agent_count {
                return Err(NetworkError::topology(format!(
                    "edge {} -> {} references agent {endpoint} outside 0..{}",
                    edge.provider, edge.receiver, self.agent_count
                )));
            }
        }
        if edge.provider == edge.receiver {
            return Err(NetworkError::topology(format!(
                "self-loop on agent {}",
                edge.provider
            )));
        }
        let providers = self.inbound.entry(edge.receiver).or_default();
        if providers.insert(edge.provider, edge.weight).is_some() {
            return Err(NetworkError::topology(format!(
                "duplicate edge {} -> {}",
                edge.provider, edge.receiver
            )));
        }
        self.outbound
            .entry(edge.provider)
            .or_default()
            .insert(edge.receiver);
        self.edge_count = self.edge_count.saturating_add(1);
        Ok(())
    }

    /// Check that every receiver with providers has weights summing to 1.
    fn check_normalized(&self) -> Result<(), NetworkError> {
        for (receiver, providers) in &self.inbound {
            if providers.is_empty() {
                continue;
            }
            let total: f64 = providers.values().sum();
            if (total - 1.0).abs() > WEIGHT_TOLERANCE {
                return Err(NetworkError::topology(format!(
                    "in-edge weights of agent {receiver} sum to {total}, expected 1"
                )));
            }
        }
        Ok(())
    }

    /// Return the number of agents the graph spans.
    pub const fn agent_count(&self) -> u32 {
        self.agent_count
    }

    /// Return the number of edges.
    pub const fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Iterate over all agent ids in ascending order.
    pub fn agent_ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.inbound.keys().copied()
    }

    /// Whether `agent` is a node of this graph.
    pub fn contains(&self, agent: AgentId) -> bool {
        agent.into_inner() < self.agent_count
    }

    /// Iterate over `(provider, weight)` pairs of a receiver.
    pub fn providers(&self, receiver: AgentId) -> impl Iterator<Item = (AgentId, f64)> + '_ {
        self.inbound
            .get(&receiver)
            .into_iter()
            .flat_map(|providers| providers.iter().map(|(id, weight)| (*id, *weight)))
    }

    /// Iterate over the receivers of a provider.
    pub fn receivers(&self, provider: AgentId) -> impl Iterator<Item = AgentId> + '_ {
        self.outbound
            .get(&provider)
            .into_iter()
            .flat_map(|receivers| receivers.iter().copied())
    }

    /// Inbound weights of a receiver.
    pub fn inbound_weights(&self, receiver: AgentId) -> Option<&BTreeMap<AgentId, f64>> {
        self.inbound.get(&receiver)
    }

    /// Outbound neighbors of a provider.
    pub fn outbound_neighbors(&self, provider: AgentId) -> Option<&BTreeSet<AgentId>> {
        self.outbound.get(&provider)
    }

    /// Trust weight of the edge `provider -> receiver`, if present.
    pub fn weight(&self, provider: AgentId, receiver: AgentId) -> Option<f64> {
        self.inbound
            .get(&receiver)
            .and_then(|providers| providers.get(&provider))
            .copied()
    }

    /// Number of receivers of `agent`.
    pub fn out_degree(&self, agent: AgentId) -> usize {
        self.outbound.get(&agent).map_or(0, BTreeSet::len)
    }

    /// Number of providers of `agent`.
    pub fn in_degree(&self, agent: AgentId) -> usize {
        self.inbound.get(&agent).map_or(0, BTreeMap::len)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn id(raw: u32) -> AgentId {
        AgentId::new(raw)
    }

    #[test]
    fn empty_graph_has_nodes_but_no_edges() {
        let graph = TrustGraph::empty(4);
        assert_eq!(graph.agent_count(), 4);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.agent_ids().count(), 4);
        assert_eq!(graph.providers(id(2)).count(), 0);
    }

    #[test]
    fn normalized_edges_are_accepted() {
        let graph = TrustGraph::new(
            3,
            [
                TrustEdge::new(id(0), id(2), 0.25),
                TrustEdge::new(id(1), id(2), 0.75),
                TrustEdge::new(id(2), id(0), 1.0),
            ],
        )
        .unwrap();
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.in_degree(id(2)), 2);
        assert_eq!(graph.out_degree(id(2)), 1);
        assert_eq!(graph.weight(id(1), id(2)), Some(0.75));
        assert_eq!(graph.weight(id(2), id(1)), None);
        assert_eq!(graph.receivers(id(0)).collect::<Vec<_>>(), vec![id(2)]);
    }

    #[test]
    fn unnormalized_inbound_is_rejected() {
        let result = TrustGraph::new(
            3,
            [
                TrustEdge::new(id(0), id(2), 0.5),
                TrustEdge::new(id(1), id(2), 0.3),
            ],
        );
        assert!(matches!(
            result,
            Err(NetworkError::InconsistentTopology { .. })
        ));
    }

    #[test]
    fn weight_out_of_range_is_invalid_argument() {
        let result = TrustGraph::new(2, [TrustEdge::new(id(0), id(1), 1.5)]);
        assert!(matches!(result, Err(NetworkError::InvalidArgument { .. })));
        let result = TrustGraph::new(2, [TrustEdge::new(id(0), id(1), 0.0)]);
        assert!(matches!(result, Err(NetworkError::InvalidArgument { .. })));
    }

    #[test]
    fn missing_agent_is_inconsistent() {
        let result = TrustGraph::new(2, [TrustEdge::new(id(0), id(5), 1.0)]);
        assert!(matches!(
            result,
            Err(NetworkError::InconsistentTopology { .. })
        ));
    }

    #[test]
    fn self_loop_and_duplicate_are_inconsistent() {
        let looped = TrustGraph::new(2, [TrustEdge::new(id(1), id(1), 1.0)]);
        assert!(matches!(
            looped,
            Err(NetworkError::InconsistentTopology { .. })
        ));
        let duplicated = TrustGraph::from_raw_edges(
            2,
            &[(id(0), id(1), 1.0), (id(0), id(1), 1.0)],
            EdgeWeighting::Uniform,
        );
        assert!(matches!(
            duplicated,
            Err(NetworkError::InconsistentTopology { .. })
        ));
    }

    #[test]
    fn uniform_weighting_splits_trust_evenly() {
        let graph = TrustGraph::from_raw_edges(
            4,
            &[
                (id(0), id(3), 0.0),
                (id(1), id(3), 0.0),
                (id(2), id(3), 0.0),
            ],
            EdgeWeighting::Uniform,
        )
        .unwrap();
        for provider in 0..3 {
            let weight = graph.weight(id(provider), id(3)).unwrap();
            assert!((weight - 1.0 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn out_degree_weighting_favours_hubs() {
        // Agent 0 reaches 1, 2 and 3; agent 1 reaches only 3.
        let graph = TrustGraph::from_raw_edges(
            4,
            &[
                (id(0), id(1), 0.0),
                (id(0), id(2), 0.0),
                (id(0), id(3), 0.0),
                (id(1), id(3), 0.0),
            ],
            EdgeWeighting::OutDegree,
        )
        .unwrap();
        let hub = graph.weight(id(0), id(3)).unwrap();
        let leaf = graph.weight(id(1), id(3)).unwrap();
        assert!((hub - 0.75).abs() < 1e-12);
        assert!((leaf - 0.25).abs() < 1e-12);
        assert!((graph.weight(id(0), id(1)).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn explicit_weighting_normalizes() {
        let graph = TrustGraph::from_raw_edges(
            3,
            &[(id(0), id(2), 2.0), (id(1), id(2), 6.0)],
            EdgeWeighting::Explicit,
        )
        .unwrap();
        assert!((graph.weight(id(0), id(2)).unwrap() - 0.25).abs() < 1e-12);
        assert!((graph.weight(id(1), id(2)).unwrap() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn explicit_weighting_rejects_non_positive_raw_weight() {
        let result = TrustGraph::from_raw_edges(
            2,
            &[(id(0), id(1), -3.0)],
            EdgeWeighting::Explicit,
        );
        assert!(matches!(result, Err(NetworkError::InvalidArgument { .. })));
    }
}
