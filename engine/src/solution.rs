//! Equilibrium results shared by the exact and approximate solvers.

use crate::strategy::{ActionId, StrategyProfile};
use serde::Serialize;

/// Indifference probabilities of the closed-form 2x2 mixed equilibrium:
/// `p` = P(player 0 plays action 0), `q` = P(player 1 plays action 0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Indifference {
    pub p: f64,
    pub q: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SolutionKind {
    Pure {
        #[serde(rename = "actionProfile")]
        action_profile: Vec<ActionId>,
    },
    Mixed { indifference: Indifference },
    Approximate { epsilon: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquilibriumSolution {
    #[serde(flatten)]
    pub kind: SolutionKind,
    pub strategies: StrategyProfile,
    pub payoffs: Vec<f64>,
}

impl EquilibriumSolution {
    pub fn is_pure(&self) -> bool {
        matches!(self.kind, SolutionKind::Pure { .. })
    }

    pub fn is_mixed(&self) -> bool {
        matches!(self.kind, SolutionKind::Mixed { .. })
    }

    /// Winning action per player for pure solutions.
    pub fn action_profile(&self) -> Option<&[ActionId]> {
        match &self.kind {
            SolutionKind::Pure { action_profile } => Some(action_profile),
            _ => None,
        }
    }

    pub fn indifference(&self) -> Option<Indifference> {
        match self.kind {
            SolutionKind::Mixed { indifference } => Some(indifference),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self.kind {
            SolutionKind::Pure { .. } => "pure",
            SolutionKind::Mixed { .. } => "mixed",
            SolutionKind::Approximate { .. } => "approximate",
        }
    }
}
