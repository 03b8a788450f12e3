//! Normal-form game definitions
//!
//! A `Game` is an immutable, validated description of a finite normal-form
//! game with a uniform action count. Payoffs are stored as one dense tensor
//! per player, row-major with player 0 as the most significant index, so a
//! 2-player game's tensor is exactly its payoff matrix `[row][col]`.
//!
//! Games are separate from solver state: solvers borrow them immutably, which
//! lets several solvers run against the same game concurrently.

use crate::error::GameError;
use crate::strategy::{ActionId, PlayerId, PlayerStrategy};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Upper bound on `actions^players`; larger games are rejected at construction.
pub const MAX_PROFILES: usize = 1 << 24;

/// Payoff matrix of one player in a 2-player game: `matrix[row][col]`.
pub type Matrix = Vec<Vec<f64>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GameFile", into = "GameFile")]
pub struct Game {
    name: String,
    players: usize,
    actions: usize,
    /// payoffs[player][flat profile index]
    payoffs: Vec<Vec<f64>>,
    action_names: Vec<String>,
}

impl Game {
    /// 2-player game from the row player's matrix `A` and column player's matrix `B`.
    pub fn bimatrix(
        name: impl Into<String>,
        matrices: [Matrix; 2],
        action_names: Vec<String>,
    ) -> Result<Self, GameError> {
        Self::from_matrices(name, matrices.into(), Some(action_names))
    }

    /// 2-player game from a list of matrices (one per player). Missing
    /// action names default to `Action 1..n`.
    pub fn from_matrices(
        name: impl Into<String>,
        matrices: Vec<Matrix>,
        action_names: Option<Vec<String>>,
    ) -> Result<Self, GameError> {
        if matrices.len() != 2 {
            return Err(GameError::PayoffCount {
                expected: 2,
                actual: matrices.len(),
            });
        }
        let actions = matrices[0].len();
        let mut tensors = Vec::with_capacity(2);
        for (player, matrix) in matrices.into_iter().enumerate() {
            if matrix.len() != actions {
                return Err(GameError::RowCount {
                    player,
                    rows: matrix.len(),
                    actions,
                });
            }
            for (row, r) in matrix.iter().enumerate() {
                if r.len() != actions {
                    return Err(GameError::NotSquare {
                        player,
                        actions,
                        row,
                        len: r.len(),
                    });
                }
            }
            tensors.push(matrix.into_iter().flatten().collect());
        }
        Self::from_tensors(name, 2, actions, tensors, action_names)
    }

    /// N-player game from flat payoff tensors of length `actions^players`.
    pub fn from_tensors(
        name: impl Into<String>,
        players: usize,
        actions: usize,
        payoffs: Vec<Vec<f64>>,
        action_names: Option<Vec<String>>,
    ) -> Result<Self, GameError> {
        if players < 2 {
            return Err(GameError::TooFewPlayers(players));
        }
        if actions < 2 {
            return Err(GameError::TooFewActions(actions));
        }
        let expected = profile_count(players, actions)?;
        if payoffs.len() != players {
            return Err(GameError::PayoffCount {
                expected: players,
                actual: payoffs.len(),
            });
        }
        for (player, tensor) in payoffs.iter().enumerate() {
            if tensor.len() != expected {
                return Err(GameError::TensorLength {
                    player,
                    len: tensor.len(),
                    expected,
                });
            }
            if let Some(index) = tensor.iter().position(|u| !u.is_finite()) {
                return Err(GameError::NonFinitePayoff { player, index });
            }
        }
        let action_names = action_names.unwrap_or_else(|| default_action_names(actions));
        if action_names.len() != actions {
            return Err(GameError::ActionNames {
                expected: actions,
                actual: action_names.len(),
            });
        }
        Ok(Game {
            name: name.into(),
            players,
            actions,
            payoffs,
            action_names,
        })
    }

    /// "Custom Game" with integer payoffs drawn uniformly from `[-5, 4]`.
    pub fn random<R: Rng + ?Sized>(
        players: usize,
        actions: usize,
        rng: &mut R,
    ) -> Result<Self, GameError> {
        if players < 2 {
            return Err(GameError::TooFewPlayers(players));
        }
        if actions < 2 {
            return Err(GameError::TooFewActions(actions));
        }
        let n = profile_count(players, actions)?;
        let payoffs = (0..players)
            .map(|_| (0..n).map(|_| rng.random_range(-5..5) as f64).collect())
            .collect();
        Self::from_tensors("Custom Game", players, actions, payoffs, None)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn players(&self) -> usize {
        self.players
    }

    pub fn actions(&self) -> usize {
        self.actions
    }

    pub fn action_names(&self) -> &[String] {
        &self.action_names
    }

    /// Number of pure strategy profiles, `actions^players`.
    pub fn profile_count(&self) -> usize {
        self.payoffs[0].len()
    }

    /// Flat tensor index of a pure profile.
    pub fn index(&self, profile: &[ActionId]) -> usize {
        debug_assert_eq!(profile.len(), self.players);
        profile.iter().fold(0, |acc, &a| acc * self.actions + a)
    }

    /// Payoff of `player` under the pure `profile`.
    pub fn payoff(&self, player: PlayerId, profile: &[ActionId]) -> f64 {
        self.payoffs[player][self.index(profile)]
    }

    /// Player's payoff matrix; only defined for 2-player games.
    pub fn matrix(&self, player: PlayerId) -> Option<Matrix> {
        if self.players != 2 {
            return None;
        }
        Some(
            self.payoffs[player]
                .chunks(self.actions)
                .map(|row| row.to_vec())
                .collect(),
        )
    }

    /// Odometer over every pure profile, last player varying fastest.
    pub fn profiles(&self) -> Profiles {
        Profiles {
            players: self.players,
            actions: self.actions,
            next: Some(vec![0; self.players]),
        }
    }

    /// Expected payoff of every player under independent mixed strategies.
    ///
    /// For 2 players this is the bilinear form `Σ_i Σ_j x[i] y[j] M[i][j]`.
    pub fn expected_payoffs(&self, strategies: &[PlayerStrategy]) -> Vec<f64> {
        let mut payoffs = vec![0.0_f64; self.players];
        for profile in self.profiles() {
            let weight = joint_probability(strategies, &profile, None);
            if weight == 0.0 {
                continue;
            }
            let index = self.index(&profile);
            for (player, total) in payoffs.iter_mut().enumerate() {
                *total += weight * self.payoffs[player][index];
            }
        }
        payoffs
    }

    /// Expected payoff to `player` for committing to `action` while every
    /// opponent keeps its mixed strategy.
    pub fn action_payoff(
        &self,
        player: PlayerId,
        action: ActionId,
        strategies: &[PlayerStrategy],
    ) -> f64 {
        if self.players == 2 {
            let other = &strategies[1 - player].distribution;
            return other
                .iter()
                .enumerate()
                .map(|(j, &q)| {
                    let profile = if player == 0 { [action, j] } else { [j, action] };
                    q * self.payoff(player, &profile)
                })
                .sum();
        }
        self.profiles()
            .filter(|profile| profile[player] == action)
            .map(|profile| {
                joint_probability(strategies, &profile, Some(player))
                    * self.payoff(player, &profile)
            })
            .sum()
    }

    /// `"P1: Defect, P2: Defect"`
    pub fn format_profile(&self, profile: &[ActionId]) -> String {
        profile
            .iter()
            .enumerate()
            .map(|(player, &a)| format!("P{}: {}", player + 1, self.action_names[a]))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Product of each player's probability for its action in `profile`,
/// optionally skipping one player.
fn joint_probability(
    strategies: &[PlayerStrategy],
    profile: &[ActionId],
    skip: Option<PlayerId>,
) -> f64 {
    profile
        .iter()
        .enumerate()
        .filter(|(player, _)| Some(*player) != skip)
        .map(|(player, &a)| strategies[player].distribution[a])
        .product()
}

fn profile_count(players: usize, actions: usize) -> Result<usize, GameError> {
    u32::try_from(players)
        .ok()
        .and_then(|p| actions.checked_pow(p))
        .filter(|&n| n <= MAX_PROFILES)
        .ok_or(GameError::TooLarge { players, actions })
}

fn default_action_names(actions: usize) -> Vec<String> {
    (1..=actions).map(|i| format!("Action {}", i)).collect()
}

/// Iterator over pure profiles in odometer order.
#[derive(Debug, Clone)]
pub struct Profiles {
    players: usize,
    actions: usize,
    next: Option<Vec<ActionId>>,
}

impl Iterator for Profiles {
    type Item = Vec<ActionId>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        let mut successor = current.clone();
        for digit in (0..self.players).rev() {
            successor[digit] += 1;
            if successor[digit] < self.actions {
                self.next = Some(successor);
                break;
            }
            successor[digit] = 0;
        }
        Some(current)
    }
}

/// Wire shape of a game: the `{name, players, actions, matrices,
/// actionNames}` object, with `tensors` for games of more than 2 players.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameFile {
    #[serde(default)]
    name: Option<String>,
    players: usize,
    actions: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    matrices: Option<BTreeMap<usize, Matrix>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tensors: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    action_names: Option<Vec<String>>,
}

impl TryFrom<GameFile> for Game {
    type Error = GameError;

    fn try_from(file: GameFile) -> Result<Self, Self::Error> {
        let name = file.name.unwrap_or_else(|| "Custom Game".to_string());
        let game = match (file.matrices, file.tensors) {
            (Some(matrices), _) => {
                Self::from_matrices(name, matrices.into_values().collect(), file.action_names)?
            }
            (None, Some(tensors)) => Self::from_tensors(
                name,
                file.players,
                file.actions,
                tensors,
                file.action_names,
            )?,
            (None, None) => {
                return Err(GameError::PayoffCount {
                    expected: file.players,
                    actual: 0,
                })
            }
        };
        if game.players != file.players {
            return Err(GameError::PayoffCount {
                expected: file.players,
                actual: game.players,
            });
        }
        if game.actions != file.actions {
            return Err(GameError::RowCount {
                player: 0,
                rows: game.actions,
                actions: file.actions,
            });
        }
        Ok(game)
    }
}

impl From<Game> for GameFile {
    fn from(game: Game) -> Self {
        let (matrices, tensors) = if game.players == 2 {
            let matrices = (0..2)
                .filter_map(|p| game.matrix(p).map(|m| (p, m)))
                .collect();
            (Some(matrices), None)
        } else {
            (None, Some(game.payoffs))
        };
        GameFile {
            name: Some(game.name),
            players: game.players,
            actions: game.actions,
            matrices,
            tensors,
            action_names: Some(game.action_names),
        }
    }
}
