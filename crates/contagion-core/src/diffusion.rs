//! The per-agent decision rule of the diffusion model.
//!
//! [`decide`] is a pure function of one agent and the committed network
//! state. It never mutates anything, so the tick cycle can evaluate every
//! agent against the same start-of-tick snapshot (sequentially or on a
//! rayon pool) and commit the results afterwards.
//!
//! # Rule
//!
//! 1. **Excitement.** Every provider that is active for some news item `m`
//!    adds `(1 - independence) * trust` to the agent's score for `m` and
//!    makes the agent aware of `m`.
//! 2. **Candidacy.** The agent is a candidate for `n` when it is aware of
//!    `n` and its score reaches `threshold * (1 - sensationalism(n))`.
//! 3. **Resolution.** A challenger displaces the item the agent is active
//!    for only with a strictly higher score; the incumbent keeps its place
//!    on a tie. An incumbent that is not displaced but falls below its own
//!    bar reverts to inactive, leaving nothing active. Without an incumbent,
//!    the best candidate (highest score, then lowest id) becomes active.

use std::collections::BTreeMap;

use contagion_network::{Agent, InfluenceNetwork, StateDelta};
use contagion_types::{BeliefState, NewsId};

/// Excitement received by one agent, per news item.
pub type Excitement = BTreeMap<NewsId, f64>;

/// Compute the excitement an agent receives from its active providers.
///
/// A provider contributes only to the one item it is active for.
pub fn excitement(agent: &Agent, network: &InfluenceNetwork) -> Excitement {
    let susceptibility = agent.personality().susceptibility();
    let mut scores = Excitement::new();
    for (provider, weight) in agent.inbound_weights() {
        let Some(news) = network.agent(*provider).and_then(Agent::active_news) else {
            continue;
        };
        *scores.entry(news).or_insert(0.0) += susceptibility * weight;
    }
    scores
}

/// The bar an agent's excitement must reach to activate for an item.
pub const fn adjusted_threshold(threshold: f64, sensationalism: f64) -> f64 {
    threshold * (1.0 - sensationalism)
}

/// Compute the next state vector of `agent` from the committed network state.
pub fn decide(agent: &Agent, network: &InfluenceNetwork) -> BTreeMap<NewsId, BeliefState> {
    let scores = excitement(agent, network);
    let mut next = agent.states().clone();

    // Awareness precedes belief.
    for news in scores.keys() {
        if let Some(state) = next.get_mut(news) {
            if *state == BeliefState::Ignorant {
                *state = BeliefState::Inactive;
            }
        }
    }

    let score_of = |news: NewsId| scores.get(&news).copied().unwrap_or(0.0);
    let clears_bar = |news: NewsId| {
        network.news_item(news).is_some_and(|item| {
            score_of(news) >= adjusted_threshold(agent.threshold(), item.sensationalism())
        })
    };

    // The incumbent is compared by score whether or not it clears its bar.
    let incumbent = agent.active_news();

    // Ascending id order plus a strict comparison keeps the lowest id on ties.
    let mut challenger: Option<(NewsId, f64)> = None;
    for (news, state) in &next {
        if Some(*news) == incumbent || !state.is_aware() || !clears_bar(*news) {
            continue;
        }
        let score = score_of(*news);
        if challenger.is_none_or(|(_, best)| score > best) {
            challenger = Some((*news, score));
        }
    }

    let winner = match (incumbent, challenger) {
        (Some(held), Some((news, score))) if score > score_of(held) => Some(news),
        (Some(held), _) => clears_bar(held).then_some(held),
        (None, Some((news, _))) => Some(news),
        (None, None) => None,
    };

    for (news, state) in &mut next {
        if Some(*news) == winner {
            *state = BeliefState::Active;
        } else if *state == BeliefState::Active {
            *state = BeliefState::Inactive;
        }
    }
    next
}

/// Decide `agent` and return a delta only if its states change.
pub fn delta_for(agent: &Agent, network: &InfluenceNetwork) -> Option<StateDelta> {
    let states = decide(agent, network);
    (states != *agent.states()).then(|| StateDelta {
        agent: agent.id(),
        states,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use contagion_network::{GraphSource, NewsItem, Population, TrustEdge, TrustGraph};
    use contagion_types::AgentId;

    use super::*;

    fn id(raw: u32) -> AgentId {
        AgentId::new(raw)
    }

    /// Agents 0 and 1 feed agent 2 with trust 0.6 and 0.4.
    fn competing_network(threshold: f64, sensationalism: f64) -> InfluenceNetwork {
        let graph = TrustGraph::new(
            3,
            [
                TrustEdge::new(id(0), id(2), 0.6),
                TrustEdge::new(id(1), id(2), 0.4),
            ],
        )
        .unwrap();
        let news = [
            NewsItem::new(NewsId::new(0), sensationalism, 0.0).unwrap(),
            NewsItem::new(NewsId::new(1), sensationalism, 0.0).unwrap(),
        ];
        InfluenceNetwork::with_constant_parameters(3, threshold, 0.0, news, GraphSource::Prebuilt(graph))
            .unwrap()
    }

    #[test]
    fn excitement_sums_per_news() {
        let mut network = competing_network(0.3, 0.0);
        network.activate(id(0), NewsId::new(0)).unwrap();
        network.activate(id(1), NewsId::new(1)).unwrap();
        let scores = excitement(network.agent(id(2)).unwrap(), &network);
        assert!((scores.get(&NewsId::new(0)).copied().unwrap() - 0.6).abs() < 1e-12);
        assert!((scores.get(&NewsId::new(1)).copied().unwrap() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn independence_scales_provider_weight() {
        let graph = TrustGraph::new(2, [TrustEdge::new(id(0), id(1), 1.0)]).unwrap();
        let news = [NewsItem::new(NewsId::new(0), 0.0, 0.0).unwrap()];
        let population = Population::from_parameters(&[0.5, 0.5], &[0.0, 0.75]).unwrap();
        let mut network = InfluenceNetwork::new(&population, news, GraphSource::Prebuilt(graph)).unwrap();
        network.activate(id(0), NewsId::new(0)).unwrap();

        let agent = network.agent(id(1)).unwrap();
        let scores = excitement(agent, &network);
        assert!((scores.get(&NewsId::new(0)).copied().unwrap() - 0.25).abs() < 1e-12);
        // 0.25 < 0.5: aware but not active.
        let next = decide(agent, &network);
        assert_eq!(next.get(&NewsId::new(0)), Some(&BeliefState::Inactive));
    }

    #[test]
    fn stronger_item_wins_between_two_candidates() {
        let mut network = competing_network(0.3, 0.0);
        network.activate(id(0), NewsId::new(0)).unwrap();
        network.activate(id(1), NewsId::new(1)).unwrap();
        let next = decide(network.agent(id(2)).unwrap(), &network);
        assert_eq!(next.get(&NewsId::new(0)), Some(&BeliefState::Active));
        assert_eq!(next.get(&NewsId::new(1)), Some(&BeliefState::Inactive));
    }

    #[test]
    fn equal_candidates_go_to_lowest_news_id() {
        let graph = TrustGraph::new(
            3,
            [
                TrustEdge::new(id(0), id(2), 0.5),
                TrustEdge::new(id(1), id(2), 0.5),
            ],
        )
        .unwrap();
        let news = [
            NewsItem::new(NewsId::new(0), 0.0, 0.0).unwrap(),
            NewsItem::new(NewsId::new(1), 0.0, 0.0).unwrap(),
        ];
        let mut network =
            InfluenceNetwork::with_constant_parameters(3, 0.3, 0.0, news, GraphSource::Prebuilt(graph)).unwrap();
        network.activate(id(0), NewsId::new(1)).unwrap();
        network.activate(id(1), NewsId::new(0)).unwrap();
        let next = decide(network.agent(id(2)).unwrap(), &network);
        assert_eq!(next.get(&NewsId::new(0)), Some(&BeliefState::Active));
    }

    #[test]
    fn incumbent_defends_against_weaker_challenger() {
        let mut network = competing_network(0.3, 0.0);
        network.activate(id(0), NewsId::new(0)).unwrap();
        network.activate(id(1), NewsId::new(1)).unwrap();
        network.activate(id(2), NewsId::new(0)).unwrap();
        let next = decide(network.agent(id(2)).unwrap(), &network);
        assert_eq!(next.get(&NewsId::new(0)), Some(&BeliefState::Active));
    }

    #[test]
    fn stronger_challenger_replaces_incumbent() {
        let mut network = competing_network(0.3, 0.0);
        network.activate(id(0), NewsId::new(0)).unwrap();
        network.activate(id(1), NewsId::new(1)).unwrap();
        network.activate(id(2), NewsId::new(1)).unwrap();
        let next = decide(network.agent(id(2)).unwrap(), &network);
        assert_eq!(next.get(&NewsId::new(0)), Some(&BeliefState::Active));
        assert_eq!(next.get(&NewsId::new(1)), Some(&BeliefState::Inactive));
    }

    #[test]
    fn incumbent_keeps_a_tie() {
        let graph = TrustGraph::new(
            3,
            [
                TrustEdge::new(id(0), id(2), 0.5),
                TrustEdge::new(id(1), id(2), 0.5),
            ],
        )
        .unwrap();
        let news = [
            NewsItem::new(NewsId::new(0), 0.0, 0.0).unwrap(),
            NewsItem::new(NewsId::new(1), 0.0, 0.0).unwrap(),
        ];
        let mut network =
            InfluenceNetwork::with_constant_parameters(3, 0.3, 0.0, news, GraphSource::Prebuilt(graph)).unwrap();
        network.activate(id(0), NewsId::new(0)).unwrap();
        network.activate(id(1), NewsId::new(1)).unwrap();
        network.activate(id(2), NewsId::new(1)).unwrap();
        let next = decide(network.agent(id(2)).unwrap(), &network);
        assert_eq!(next.get(&NewsId::new(1)), Some(&BeliefState::Active));
        assert_eq!(next.get(&NewsId::new(0)), Some(&BeliefState::Inactive));
    }

    #[test]
    fn unsupported_active_agent_reverts() {
        let mut network = competing_network(0.3, 0.0);
        network.activate(id(0), NewsId::new(0)).unwrap();
        let next = decide(network.agent(id(0)).unwrap(), &network);
        assert_eq!(next.get(&NewsId::new(0)), Some(&BeliefState::Inactive));
    }

    #[test]
    fn weaker_challenger_cannot_take_over_a_failing_incumbent() {
        // Threshold 0.7, sensationalism 0.5 on item 1 only: item 0 scores 0.6
        // against a bar of 0.7, item 1 scores 0.4 against a bar of 0.35.
        let graph = TrustGraph::new(
            3,
            [
                TrustEdge::new(id(0), id(2), 0.6),
                TrustEdge::new(id(1), id(2), 0.4),
            ],
        )
        .unwrap();
        let news = [
            NewsItem::new(NewsId::new(0), 0.0, 0.0).unwrap(),
            NewsItem::new(NewsId::new(1), 0.5, 0.0).unwrap(),
        ];
        let mut network =
            InfluenceNetwork::with_constant_parameters(3, 0.7, 0.0, news, GraphSource::Prebuilt(graph)).unwrap();
        network.activate(id(0), NewsId::new(0)).unwrap();
        network.activate(id(1), NewsId::new(1)).unwrap();
        network.activate(id(2), NewsId::new(0)).unwrap();

        let next = decide(network.agent(id(2)).unwrap(), &network);
        assert_eq!(next.get(&NewsId::new(0)), Some(&BeliefState::Inactive));
        assert_eq!(next.get(&NewsId::new(1)), Some(&BeliefState::Inactive));
    }

    #[test]
    fn stronger_challenger_takes_over_a_failing_incumbent() {
        // Item 0 scores 0.4 against a bar of 0.7; item 1 scores 0.6 against 0.35.
        let graph = TrustGraph::new(
            3,
            [
                TrustEdge::new(id(0), id(2), 0.4),
                TrustEdge::new(id(1), id(2), 0.6),
            ],
        )
        .unwrap();
        let news = [
            NewsItem::new(NewsId::new(0), 0.0, 0.0).unwrap(),
            NewsItem::new(NewsId::new(1), 0.5, 0.0).unwrap(),
        ];
        let mut network =
            InfluenceNetwork::with_constant_parameters(3, 0.7, 0.0, news, GraphSource::Prebuilt(graph)).unwrap();
        network.activate(id(0), NewsId::new(0)).unwrap();
        network.activate(id(1), NewsId::new(1)).unwrap();
        network.activate(id(2), NewsId::new(0)).unwrap();

        let next = decide(network.agent(id(2)).unwrap(), &network);
        assert_eq!(next.get(&NewsId::new(0)), Some(&BeliefState::Inactive));
        assert_eq!(next.get(&NewsId::new(1)), Some(&BeliefState::Active));
    }

    #[test]
    fn sensationalism_lowers_the_bar() {
        // Score 0.4 against threshold 0.6: plain news fails, sensational news passes.
        let mut dull = competing_network(0.6, 0.0);
        dull.activate(id(1), NewsId::new(1)).unwrap();
        let next = decide(dull.agent(id(2)).unwrap(), &dull);
        assert_eq!(next.get(&NewsId::new(1)), Some(&BeliefState::Inactive));

        let mut loud = competing_network(0.6, 0.5);
        loud.activate(id(1), NewsId::new(1)).unwrap();
        let next = decide(loud.agent(id(2)).unwrap(), &loud);
        assert_eq!(next.get(&NewsId::new(1)), Some(&BeliefState::Active));
    }

    #[test]
    fn ignorant_agent_without_active_providers_stays_put() {
        let network = competing_network(0.0, 1.0);
        let agent = network.agent(id(2)).unwrap();
        assert!(delta_for(agent, &network).is_none());
    }

    #[test]
    fn at_most_one_item_is_active() {
        let mut network = competing_network(0.0, 1.0);
        network.activate(id(0), NewsId::new(0)).unwrap();
        network.activate(id(1), NewsId::new(1)).unwrap();
        let next = decide(network.agent(id(2)).unwrap(), &network);
        let active = next.values().filter(|state| state.is_active()).count();
        assert_eq!(active, 1);
    }
}
