//! Reachability over a live-edge sample.

use std::collections::VecDeque;

use contagion_types::AgentId;

use crate::sampling::LiveEdgeSample;

/// Count the agents reachable from `seeds` over the live edges of `sample`.
///
/// Seeds count as reached. Duplicate seeds and seeds outside the sample are
/// ignored.
pub fn reach(sample: &LiveEdgeSample, seeds: &[AgentId]) -> usize {
    let mut visited = vec![false; sample.agent_count()];
    let mut queue: VecDeque<AgentId> = VecDeque::new();
    let mut reached: usize = 0;

    for seed in seeds {
        if let Some(slot) = visited.get_mut(seed.index()) {
            if !*slot {
                *slot = true;
                reached = reached.saturating_add(1);
                queue.push_back(*seed);
            }
        }
    }

    while let Some(agent) = queue.pop_front() {
        for child in sample.children(agent) {
            if let Some(slot) = visited.get_mut(child.index()) {
                if !*slot {
                    *slot = true;
                    reached = reached.saturating_add(1);
                    queue.push_back(*child);
                }
            }
        }
    }
    reached
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::ProviderChoice;

    fn id(raw: u32) -> AgentId {
        AgentId::new(raw)
    }

    /// 0 -> 1 -> 2, 0 -> 3, agent 4 isolated.
    fn tree() -> LiveEdgeSample {
        LiveEdgeSample::from_parents(vec![
            ProviderChoice::None,
            ProviderChoice::Provider(id(0)),
            ProviderChoice::Provider(id(1)),
            ProviderChoice::Provider(id(0)),
            ProviderChoice::None,
        ])
    }

    #[test]
    fn reach_follows_live_edges() {
        let sample = tree();
        assert_eq!(reach(&sample, &[id(0)]), 4);
        assert_eq!(reach(&sample, &[id(1)]), 2);
        assert_eq!(reach(&sample, &[id(4)]), 1);
    }

    #[test]
    fn overlapping_seeds_count_once() {
        let sample = tree();
        assert_eq!(reach(&sample, &[id(0), id(2), id(2)]), 4);
        assert_eq!(reach(&sample, &[id(3), id(4)]), 2);
    }

    #[test]
    fn empty_and_unknown_seeds() {
        let sample = tree();
        assert_eq!(reach(&sample, &[]), 0);
        assert_eq!(reach(&sample, &[id(42)]), 0);
    }

    #[test]
    fn cycles_terminate() {
        let sample = LiveEdgeSample::from_parents(vec![
            ProviderChoice::Provider(id(2)),
            ProviderChoice::Provider(id(0)),
            ProviderChoice::Provider(id(1)),
        ]);
        assert_eq!(reach(&sample, &[id(1)]), 3);
    }
}
