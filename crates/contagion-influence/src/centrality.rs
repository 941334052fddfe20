//! Out-degree seeding heuristic.

use std::collections::BTreeSet;

use contagion_network::TrustGraph;
use contagion_types::AgentId;

use crate::error::InfluenceError;

/// The `k` agents with the most receivers, skipping `excluded`.
///
/// Ordered by out-degree descending, then by id ascending.
///
/// # Errors
///
/// Returns [`InfluenceError::InvalidArgument`] if fewer than `k` agents are
/// left after exclusion.
pub fn degree_seeds(
    graph: &TrustGraph,
    k: usize,
    excluded: &BTreeSet<AgentId>,
) -> Result<Vec<AgentId>, InfluenceError> {
    let mut ranked: Vec<(usize, AgentId)> = graph
        .agent_ids()
        .filter(|agent| !excluded.contains(agent))
        .map(|agent| (graph.out_degree(agent), agent))
        .collect();
    if k > ranked.len() {
        return Err(InfluenceError::invalid(format!(
            "cannot select {k} seeds from {} candidate agents",
            ranked.len()
        )));
    }
    ranked.sort_by(|(a_degree, a_id), (b_degree, b_id)| b_degree.cmp(a_degree).then(a_id.cmp(b_id)));
    Ok(ranked.into_iter().take(k).map(|(_, agent)| agent).collect())
}
