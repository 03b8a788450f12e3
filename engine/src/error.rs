//! Construction-time validation errors for games.

use thiserror::Error;

/// Reasons a game description is rejected at construction.
///
/// Solving never produces these: once a `Game` exists it is well-formed, and
/// "no equilibrium" outcomes are reported as values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    #[error("a game needs at least 2 players, got {0}")]
    TooFewPlayers(usize),
    #[error("each player needs at least 2 actions, got {0}")]
    TooFewActions(usize),
    #[error("expected {expected} payoff tables (one per player), got {actual}")]
    PayoffCount { expected: usize, actual: usize },
    #[error("payoff matrix for player {player} must be {actions}x{actions}, row {row} has {len} entries")]
    NotSquare {
        player: usize,
        actions: usize,
        row: usize,
        len: usize,
    },
    #[error("payoff matrix for player {player} has {rows} rows, expected {actions}")]
    RowCount {
        player: usize,
        rows: usize,
        actions: usize,
    },
    #[error("payoff tensor for player {player} has {len} entries, expected {expected}")]
    TensorLength {
        player: usize,
        len: usize,
        expected: usize,
    },
    #[error("payoff for player {player} at flat index {index} is not finite")]
    NonFinitePayoff { player: usize, index: usize },
    #[error("expected {expected} action names, got {actual}")]
    ActionNames { expected: usize, actual: usize },
    #[error("game with {players} players and {actions} actions is too large to enumerate")]
    TooLarge { players: usize, actions: usize },
    #[error("epsilon must be finite and non-negative, got {0}")]
    InvalidEpsilon(f64),
    #[error("expected {expected} strategies (one per player), got {actual}")]
    StrategyCount { expected: usize, actual: usize },
    #[error("strategy for player {player} has {len} entries, expected {expected}")]
    StrategyLength {
        player: usize,
        len: usize,
        expected: usize,
    },
    #[error("strategy for player {player} is not a probability distribution (sum {sum})")]
    NotADistribution { player: usize, sum: f64 },
}
