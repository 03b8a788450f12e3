//! Per-player mixed strategies and helpers on probability vectors.

use serde::{Deserialize, Serialize};

/// Player index (0-based). Player 0 is the row player in 2-player games.
pub type PlayerId = usize;

/// Action index (0-based) within a player's action set.
pub type ActionId = usize;

/// A mixed strategy for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStrategy {
    pub player: PlayerId,
    pub distribution: Vec<f64>,
}

/// One strategy per player, ordered by player index.
pub type StrategyProfile = Vec<PlayerStrategy>;

impl PlayerStrategy {
    pub fn new(player: PlayerId, distribution: Vec<f64>) -> Self {
        PlayerStrategy { player, distribution }
    }

    /// Probability 1 on `action`, 0 elsewhere.
    pub fn pure(player: PlayerId, action: ActionId, actions: usize) -> Self {
        let mut distribution = vec![0.0_f64; actions];
        distribution[action] = 1.0;
        PlayerStrategy { player, distribution }
    }

    /// Uniform over `actions`.
    pub fn uniform(player: PlayerId, actions: usize) -> Self {
        PlayerStrategy {
            player,
            distribution: vec![1.0 / actions as f64; actions],
        }
    }

    pub fn sum(&self) -> f64 {
        self.distribution.iter().sum()
    }

    /// The action carrying all the mass, if the strategy is pure.
    pub fn pure_action(&self) -> Option<ActionId> {
        let mut found = None;
        for (a, &p) in self.distribution.iter().enumerate() {
            if p == 1.0 && found.is_none() {
                found = Some(a);
            } else if p != 0.0 {
                return None;
            }
        }
        found
    }
}

/// Rescale `distribution` to sum to 1. A non-positive (or non-finite) sum
/// leaves the vector untouched.
pub fn normalize(distribution: &mut [f64]) {
    let sum: f64 = distribution.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        for p in distribution.iter_mut() {
            *p /= sum;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pure_strategy_shape() {
        let s = PlayerStrategy::pure(1, 2, 3);
        assert_eq!(s.distribution, vec![0.0, 0.0, 1.0]);
        assert_eq!(s.pure_action(), Some(2));
    }

    #[test]
    fn test_mixed_is_not_pure() {
        let s = PlayerStrategy::new(0, vec![0.5, 0.5]);
        assert_eq!(s.pure_action(), None);
    }

    #[test]
    fn test_normalize_sums_to_one() {
        let mut d = vec![2.0, 1.0, 1.0];
        normalize(&mut d);
        assert!((d.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((d[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_zero_sum_is_noop() {
        let mut d = vec![0.0, 0.0];
        normalize(&mut d);
        assert_eq!(d, vec![0.0, 0.0]);
    }
}
