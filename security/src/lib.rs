//! equilibrium Security - Defender/attacker coalition game
//!
//! This crate turns a system description (functional and topological
//! dependencies between subsystems, plus CVSS-like vulnerability records) into
//! per-vulnerability payoff terms, builds the `2^k x 2^k` patch/exploit game
//! over all vulnerability subsets, and solves it exactly (pure equilibria) and
//! approximately (replicator dynamics).
//!
//! The game is bounded by [`payoff::MAX_VULNERABILITIES`]; larger inputs are
//! reported as unavailable rather than allocated.

pub mod config;
pub mod error;
pub mod interpret;
pub mod nash;
pub mod payoff;
pub mod risk;
pub mod roster;
pub mod vulnerability;

pub use config::{Analysis, SystemConfig};
pub use error::SecurityError;
pub use interpret::{interpret_nash_equilibrium_strategies, StrategyInterpretation};
pub use nash::{
    calculate_nash_equilibrium, calculate_nash_equilibrium_with, find_pure_equilibria,
    replicator_dynamics, MixedEquilibrium, NashOutcome, PureEquilibrium, ReplicatorConfig,
    SecurityEquilibria,
};
pub use payoff::{PayoffCell, PayoffMatrix, MAX_VULNERABILITIES};
pub use risk::compute_risk_scores;
pub use roster::{distribute_profits, Group, Participant, ProfitDistribution};
pub use vulnerability::{
    compute_vulnerability_details, prioritize_patches, PatchPriority, VulnerabilityDetail,
    VulnerabilityRecord,
};
