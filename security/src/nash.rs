//! Defender-coalition vs attacker-coalition equilibria
//!
//! The exact search tests every cell of the payoff matrix against unilateral
//! deviations of either coalition, with the same ε tolerance as the engine's
//! exact solver. The approximate search runs a fixed number of replicator
//! dynamics steps from uniform mixed strategies; it has no early exit.

use crate::payoff::{Mask, PayoffMatrix, MAX_VULNERABILITIES};
use crate::roster::{active_members, Group, Participant};
use crate::vulnerability::VulnerabilityDetail;
use equilibrium_engine::exact::EPSILON;
use equilibrium_engine::strategy::normalize;
use rayon::prelude::*;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PureEquilibrium {
    pub defender_strategy: Mask,
    pub attacker_strategy: Mask,
    pub defender_payoff: f64,
    pub attacker_payoff: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MixedEquilibrium {
    /// Probability per defender mask.
    pub defender_strategy: Vec<f64>,
    /// Probability per attacker mask.
    pub attacker_strategy: Vec<f64>,
    pub defender_payoff: f64,
    pub attacker_payoff: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReplicatorConfig {
    pub iterations: usize,
    /// Step size α of the multiplicative update.
    pub rate: f64,
}

impl Default for ReplicatorConfig {
    fn default() -> Self {
        ReplicatorConfig {
            iterations: 10_000,
            rate: 0.1,
        }
    }
}

/// Every cell from which neither coalition gains more than ε by switching
/// its own strategy, in row-major order.
pub fn find_pure_equilibria(matrix: &PayoffMatrix) -> Vec<PureEquilibrium> {
    let n = matrix.size();
    // best defender payoff in each column, best attacker payoff in each row
    let column_best: Vec<f64> = (0..n)
        .map(|att| {
            (0..n)
                .map(|def| matrix.cell(def, att).defender())
                .fold(f64::NEG_INFINITY, f64::max)
        })
        .collect();
    let row_best: Vec<f64> = matrix
        .rows()
        .iter()
        .map(|row| row.iter().map(|c| c.attacker()).fold(f64::NEG_INFINITY, f64::max))
        .collect();

    (0..n)
        .into_par_iter()
        .flat_map_iter(|def| {
            let column_best = &column_best;
            let row_best = row_best[def];
            (0..n).filter_map(move |att| {
                let cell = matrix.cell(def, att);
                let stable = column_best[att] <= cell.defender() + EPSILON
                    && row_best <= cell.attacker() + EPSILON;
                stable.then_some(PureEquilibrium {
                    defender_strategy: def,
                    attacker_strategy: att,
                    defender_payoff: cell.defender(),
                    attacker_payoff: cell.attacker(),
                })
            })
        })
        .collect()
}

/// Replicator dynamics from uniform strategies for `config.iterations` steps:
/// `x[i] <- x[i] * (1 + α (u[i] - ū))`, then renormalize. Mass pushed below
/// zero by a large negative advantage is clipped to 0.
pub fn replicator_dynamics(matrix: &PayoffMatrix, config: ReplicatorConfig) -> MixedEquilibrium {
    let n = matrix.size();
    let mut defender = vec![1.0 / n as f64; n];
    let mut attacker = vec![1.0 / n as f64; n];
    let mut def_expected = vec![0.0_f64; n];
    let mut att_expected = vec![0.0_f64; n];

    for _ in 0..config.iterations {
        def_expected.iter_mut().for_each(|u| *u = 0.0);
        att_expected.iter_mut().for_each(|u| *u = 0.0);
        for (i, row) in matrix.rows().iter().enumerate() {
            for (j, cell) in row.iter().enumerate() {
                def_expected[i] += attacker[j] * cell.defender();
                att_expected[j] += defender[i] * cell.attacker();
            }
        }
        replicate(&mut defender, &def_expected, config.rate);
        replicate(&mut attacker, &att_expected, config.rate);
    }

    let mut defender_payoff = 0.0;
    let mut attacker_payoff = 0.0;
    for (i, row) in matrix.rows().iter().enumerate() {
        for (j, cell) in row.iter().enumerate() {
            let weight = defender[i] * attacker[j];
            defender_payoff += weight * cell.defender();
            attacker_payoff += weight * cell.attacker();
        }
    }
    MixedEquilibrium {
        defender_strategy: defender,
        attacker_strategy: attacker,
        defender_payoff,
        attacker_payoff,
    }
}

fn replicate(distribution: &mut [f64], expected: &[f64], rate: f64) {
    let average: f64 = distribution.iter().zip(expected).map(|(p, u)| p * u).sum();
    let next: Vec<f64> = distribution
        .iter()
        .zip(expected)
        .map(|(p, u)| (p * (1.0 + rate * (u - average))).max(0.0))
        .collect();
    let sum: f64 = next.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        distribution.copy_from_slice(&next);
        normalize(distribution);
    }
}

/// Why the combinatorial game was not solved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unavailable {
    NoAttackers,
    NoDefenders,
    NoVulnerabilities,
    TooManyVulnerabilities(usize),
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unavailable::NoAttackers | Unavailable::NoDefenders | Unavailable::NoVulnerabilities => {
                write!(f, "Cannot calculate Nash equilibrium: Missing players or vulnerabilities")
            }
            Unavailable::TooManyVulnerabilities(k) => write!(
                f,
                "Cannot calculate Nash equilibrium: {} vulnerabilities exceed the limit of {}",
                k, MAX_VULNERABILITIES
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SecurityEquilibria {
    pub pure: Vec<PureEquilibrium>,
    pub mixed: MixedEquilibrium,
    pub payoff_matrix: PayoffMatrix,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NashOutcome {
    Unavailable(Unavailable),
    Solved(SecurityEquilibria),
}

impl NashOutcome {
    pub fn has_nash(&self) -> bool {
        matches!(self, NashOutcome::Solved(_))
    }

    pub fn solved(&self) -> Option<&SecurityEquilibria> {
        match self {
            NashOutcome::Solved(eq) => Some(eq),
            NashOutcome::Unavailable(_) => None,
        }
    }
}

/// `{hasNash: false, message}` or `{hasNash: true, pureNashEquilibria, mixedNash, payoffMatrix}`.
impl Serialize for NashOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            NashOutcome::Unavailable(reason) => {
                let mut s = serializer.serialize_struct("NashOutcome", 2)?;
                s.serialize_field("hasNash", &false)?;
                s.serialize_field("message", &reason.to_string())?;
                s.end()
            }
            NashOutcome::Solved(eq) => {
                let mut s = serializer.serialize_struct("NashOutcome", 4)?;
                s.serialize_field("hasNash", &true)?;
                s.serialize_field("pureNashEquilibria", &eq.pure)?;
                s.serialize_field("mixedNash", &eq.mixed)?;
                s.serialize_field("payoffMatrix", &eq.payoff_matrix)?;
                s.end()
            }
        }
    }
}

pub fn calculate_nash_equilibrium(details: &[VulnerabilityDetail], players: &[Participant]) -> NashOutcome {
    calculate_nash_equilibrium_with(details, players, ReplicatorConfig::default())
}

/// Checks the inputs before anything of size `2^k` is allocated.
pub fn calculate_nash_equilibrium_with(
    details: &[VulnerabilityDetail],
    players: &[Participant],
    config: ReplicatorConfig,
) -> NashOutcome {
    let unavailable = if active_members(players, Group::Attackers).is_empty() {
        Some(Unavailable::NoAttackers)
    } else if active_members(players, Group::Defenders).is_empty() {
        Some(Unavailable::NoDefenders)
    } else if details.is_empty() {
        Some(Unavailable::NoVulnerabilities)
    } else {
        None
    };
    if let Some(reason) = unavailable {
        log::warn!("{} ({:?})", reason, reason);
        return NashOutcome::Unavailable(reason);
    }

    let Some(payoff_matrix) = PayoffMatrix::build(details) else {
        let reason = Unavailable::TooManyVulnerabilities(details.len());
        log::warn!("{}", reason);
        return NashOutcome::Unavailable(reason);
    };
    log::info!(
        "security game over {} vulnerabilities ({} strategies per coalition)",
        details.len(),
        payoff_matrix.size()
    );
    let pure = find_pure_equilibria(&payoff_matrix);
    log::debug!("{} pure equilibria", pure.len());
    let mixed = replicator_dynamics(&payoff_matrix, config);
    NashOutcome::Solved(SecurityEquilibria {
        pure,
        mixed,
        payoff_matrix,
    })
}
