//! Classic 2-player games used as presets and as solver fixtures.
//!
//!   prisoners     Prisoner's Dilemma   [Cooperate, Defect]
//!   coordination  Coordination Game    [Strategy A, Strategy B]
//!   chicken       Chicken Game         [Stay, Swerve]
//!   rps           Rock Paper Scissors  [Rock, Paper, Scissors]
//!
//! Matrices are `[row][col]` with player 0 choosing the row.

use crate::game::{Game, Matrix};

/// Preset keys accepted by [`preset`].
pub const PRESET_KEYS: [&str; 4] = ["prisoners", "coordination", "chicken", "rps"];

fn build(name: &str, a: Matrix, b: Matrix, names: &[&str]) -> Game {
    Game::bimatrix(name, [a, b], names.iter().map(|s| s.to_string()).collect())
        .unwrap_or_else(|e| panic!("preset {} is malformed: {}", name, e))
}

/// Unique pure equilibrium at (Defect, Defect) with payoffs [1, 1].
pub fn prisoners_dilemma() -> Game {
    build(
        "Prisoner's Dilemma",
        vec![vec![3.0, 0.0], vec![5.0, 1.0]],
        vec![vec![3.0, 5.0], vec![0.0, 1.0]],
        &["Cooperate", "Defect"],
    )
}

/// Two pure equilibria on the diagonal plus the 50/50 mixed one.
pub fn coordination() -> Game {
    build(
        "Coordination Game",
        vec![vec![5.0, 0.0], vec![0.0, 5.0]],
        vec![vec![5.0, 0.0], vec![0.0, 5.0]],
        &["Strategy A", "Strategy B"],
    )
}

pub fn chicken() -> Game {
    build(
        "Chicken Game",
        vec![vec![0.0, 7.0], vec![2.0, 1.0]],
        vec![vec![0.0, 2.0], vec![7.0, 1.0]],
        &["Stay", "Swerve"],
    )
}

/// Cyclic zero-sum game: no pure equilibrium.
pub fn rock_paper_scissors() -> Game {
    build(
        "Rock Paper Scissors",
        vec![
            vec![0.0, -1.0, 1.0],
            vec![1.0, 0.0, -1.0],
            vec![-1.0, 1.0, 0.0],
        ],
        vec![
            vec![0.0, 1.0, -1.0],
            vec![-1.0, 0.0, 1.0],
            vec![1.0, -1.0, 0.0],
        ],
        &["Rock", "Paper", "Scissors"],
    )
}

/// Look up a preset by key (see [`PRESET_KEYS`]).
pub fn preset(key: &str) -> Option<Game> {
    match key {
        "prisoners" => Some(prisoners_dilemma()),
        "coordination" => Some(coordination()),
        "chicken" => Some(chicken()),
        "rps" | "rockPaperScissors" => Some(rock_paper_scissors()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_key_resolves() {
        for key in PRESET_KEYS {
            let game = preset(key).expect("preset exists");
            assert_eq!(game.players(), 2);
            assert_eq!(game.action_names().len(), game.actions());
        }
        assert!(preset("poker").is_none());
    }

    #[test]
    fn test_rps_is_zero_sum() {
        let game = rock_paper_scissors();
        for profile in game.profiles() {
            assert_eq!(game.payoff(0, &profile) + game.payoff(1, &profile), 0.0);
        }
    }
}
