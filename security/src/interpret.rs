//! Human-readable reading of coalition strategies
//!
//! Each set bit of a mask is mapped through the vulnerability list to the
//! subsystem it lives in. Also bridges the combinatorial game into an engine
//! [`Game`] so the generic solvers can run on it.

use crate::nash::{NashOutcome, SecurityEquilibria};
use crate::payoff::{is_set, Mask};
use crate::vulnerability::VulnerabilityDetail;
use equilibrium_engine::{Game, GameError};
use serde::Serialize;

/// Mixed-strategy entries at or below this probability are not listed.
pub const DISPLAY_THRESHOLD: f64 = 0.01;

/// Subsystem index (0-based) of every set bit, in bit order.
pub fn mask_subsystems(mask: Mask, details: &[VulnerabilityDetail]) -> Vec<usize> {
    details
        .iter()
        .enumerate()
        .filter(|(bit, _)| is_set(mask, *bit))
        .map(|(_, vul)| vul.subsystem_index)
        .collect()
}

/// `"{verb} Subsystem {s+1}"` per set bit.
pub fn mask_actions(verb: &str, mask: Mask, details: &[VulnerabilityDetail]) -> Vec<String> {
    mask_subsystems(mask, details)
        .into_iter()
        .map(|s| format!("{} Subsystem {}", verb, s + 1))
        .collect()
}

/// `"Patch Subsystem 1, Subsystem 3"`, or `"Patch nothing"` for the empty mask.
pub fn mask_label(verb: &str, mask: Mask, details: &[VulnerabilityDetail]) -> String {
    let subsystems = mask_subsystems(mask, details);
    if subsystems.is_empty() {
        return format!("{} nothing", verb);
    }
    let list: Vec<String> = subsystems
        .iter()
        .map(|s| format!("Subsystem {}", s + 1))
        .collect();
    format!("{} {}", verb, list.join(", "))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PureInterpretation {
    pub defender_actions: Vec<String>,
    pub attacker_actions: Vec<String>,
    pub defender_payoff: f64,
    pub attacker_payoff: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightedStrategy {
    pub strategy: String,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MixedInterpretation {
    #[serde(rename = "defenderStrategyDistribution")]
    pub defender: Vec<WeightedStrategy>,
    #[serde(rename = "attackerStrategyDistribution")]
    pub attacker: Vec<WeightedStrategy>,
    pub defender_payoff: f64,
    pub attacker_payoff: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyInterpretation {
    pub pure_strategies: Vec<PureInterpretation>,
    pub mixed_strategy: MixedInterpretation,
}

/// `None` when the outcome carries no equilibria.
pub fn interpret_nash_equilibrium_strategies(
    outcome: &NashOutcome,
    details: &[VulnerabilityDetail],
) -> Option<StrategyInterpretation> {
    let eq = outcome.solved()?;
    let pure_strategies = eq
        .pure
        .iter()
        .map(|p| PureInterpretation {
            defender_actions: mask_actions("Patch", p.defender_strategy, details),
            attacker_actions: mask_actions("Exploit", p.attacker_strategy, details),
            defender_payoff: p.defender_payoff,
            attacker_payoff: p.attacker_payoff,
        })
        .collect();
    let mixed_strategy = MixedInterpretation {
        defender: weighted("Patch", &eq.mixed.defender_strategy, details),
        attacker: weighted("Exploit", &eq.mixed.attacker_strategy, details),
        defender_payoff: eq.mixed.defender_payoff,
        attacker_payoff: eq.mixed.attacker_payoff,
    };
    Some(StrategyInterpretation {
        pure_strategies,
        mixed_strategy,
    })
}

fn weighted(verb: &str, distribution: &[f64], details: &[VulnerabilityDetail]) -> Vec<WeightedStrategy> {
    distribution
        .iter()
        .enumerate()
        .filter(|&(_, &p)| p > DISPLAY_THRESHOLD)
        .map(|(mask, &probability)| WeightedStrategy {
            strategy: mask_label(verb, mask, details),
            probability,
        })
        .collect()
}

impl SecurityEquilibria {
    /// The combinatorial game as a 2-player engine game: player 0 is the
    /// defender coalition, player 1 the attacker coalition, and action `m`
    /// is mask `m`. Fails for matrices too large for the engine to enumerate.
    pub fn to_game(&self, details: &[VulnerabilityDetail]) -> Result<Game, GameError> {
        let names = (0..self.payoff_matrix.size())
            .map(|mask| {
                let subsystems = mask_subsystems(mask, details);
                if subsystems.is_empty() {
                    "None".to_string()
                } else {
                    let list: Vec<String> = subsystems.iter().map(|s| (s + 1).to_string()).collect();
                    format!("S{}", list.join("+S"))
                }
            })
            .collect();
        Game::bimatrix(
            "Security Game",
            [self.payoff_matrix.defender_matrix(), self.payoff_matrix.attacker_matrix()],
            names,
        )
    }
}
