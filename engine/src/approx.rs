//! Approximate equilibrium search by smoothed best-response dynamics
//!
//! Each round visits the players in index order. A player computes its best
//! pure reply to the opponents' current mixed strategies, and if the reply
//! beats its current expected payoff by more than ε it blends its strategy
//! toward a soft version of that reply (0.9 on the best action, the rest
//! spread evenly). A round in which nobody moves by more than ε has
//! converged to an ε-Nash equilibrium.
//!
//! Strategy state is owned by the solver; the game is only borrowed, and every
//! history/metrics snapshot is a deep copy so later updates never alter it.

use crate::cancel::CancelToken;
use crate::error::GameError;
use crate::game::Game;
use crate::solution::{EquilibriumSolution, SolutionKind};
use crate::strategy::{normalize, ActionId, PlayerId, PlayerStrategy, StrategyProfile};
use crate::trace::{now_ms, BestResponse, HistoryEntry, Metrics, Observer};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Mass placed on the best action in the soft best-response target.
const BEST_RESPONSE_MASS: f64 = 0.9;
const MIN_LEARNING_RATE: f64 = 0.01;
const MAX_LEARNING_RATE: f64 = 0.2;
/// Allowed deviation from 1 of a caller-supplied distribution's sum.
const DISTRIBUTION_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApproxConfig {
    /// Convergence threshold on per-player improvement.
    pub epsilon: f64,
    pub max_iterations: usize,
    /// Seed for the random initial strategies; OS entropy when `None`.
    pub seed: Option<u64>,
}

impl ApproxConfig {
    /// A NaN or negative epsilon would make every round look converged.
    pub fn validate(&self) -> Result<(), GameError> {
        if self.epsilon.is_finite() && self.epsilon >= 0.0 {
            Ok(())
        } else {
            Err(GameError::InvalidEpsilon(self.epsilon))
        }
    }
}

impl Default for ApproxConfig {
    fn default() -> Self {
        ApproxConfig {
            epsilon: 0.01,
            max_iterations: 200,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproxReport {
    pub solution: EquilibriumSolution,
    #[serde(serialize_with = "crate::trace::as_millis")]
    pub time: Duration,
    /// Completed rounds.
    pub iterations: usize,
    pub converged: bool,
    pub history: Vec<HistoryEntry>,
    pub metrics: Metrics,
    pub cancelled: bool,
}

/// Result of one player's update.
#[derive(Debug, Clone)]
struct Update {
    improvement: f64,
    learning_rate: f64,
    best_response: BestResponse,
}

/// Blend rate for a given improvement: `clamp(improvement / 10, 0.01, 0.2)`.
pub fn learning_rate(improvement: f64) -> f64 {
    (improvement / 10.0).clamp(MIN_LEARNING_RATE, MAX_LEARNING_RATE)
}

/// Soft best response over `actions` centred on `best`.
pub fn soft_best_response(best: ActionId, actions: usize) -> Vec<f64> {
    let rest = (1.0 - BEST_RESPONSE_MASS) / (actions - 1) as f64;
    (0..actions)
        .map(|a| if a == best { BEST_RESPONSE_MASS } else { rest })
        .collect()
}

pub struct ApproximateSolver<'g> {
    game: &'g Game,
    config: ApproxConfig,
    strategies: StrategyProfile,
}

impl<'g> ApproximateSolver<'g> {
    /// Solver starting from normalized random distributions.
    pub fn new(game: &'g Game, config: ApproxConfig) -> Result<Self, GameError> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_rng(&mut rand::rng()),
        };
        let strategies = (0..game.players())
            .map(|player| {
                let mut distribution: Vec<f64> =
                    (0..game.actions()).map(|_| rng.random::<f64>()).collect();
                normalize(&mut distribution);
                PlayerStrategy::new(player, distribution)
            })
            .collect();
        Ok(ApproximateSolver {
            game,
            config,
            strategies,
        })
    }

    /// Solver starting from the given profile: one distribution per player,
    /// each over `game.actions()` actions, non-negative and summing to 1.
    pub fn from_strategies(
        game: &'g Game,
        config: ApproxConfig,
        strategies: StrategyProfile,
    ) -> Result<Self, GameError> {
        config.validate()?;
        if strategies.len() != game.players() {
            return Err(GameError::StrategyCount {
                expected: game.players(),
                actual: strategies.len(),
            });
        }
        for (player, strategy) in strategies.iter().enumerate() {
            let len = strategy.distribution.len();
            if len != game.actions() {
                return Err(GameError::StrategyLength {
                    player,
                    len,
                    expected: game.actions(),
                });
            }
            let sum = strategy.sum();
            let valid = strategy.distribution.iter().all(|p| p.is_finite() && *p >= 0.0)
                && (sum - 1.0).abs() <= DISTRIBUTION_TOLERANCE;
            if !valid {
                return Err(GameError::NotADistribution { player, sum });
            }
        }
        Ok(ApproximateSolver {
            game,
            config,
            strategies,
        })
    }

    pub fn config(&self) -> &ApproxConfig {
        &self.config
    }

    pub fn strategies(&self) -> &StrategyProfile {
        &self.strategies
    }

    /// Expected payoff of every player under the current profile.
    pub fn current_payoffs(&self) -> Vec<f64> {
        self.game.expected_payoffs(&self.strategies)
    }

    /// Expected payoff of `player` under the current profile.
    pub fn player_payoff(&self, player: PlayerId) -> f64 {
        self.strategies[player]
            .distribution
            .iter()
            .enumerate()
            .map(|(a, &p)| p * self.game.action_payoff(player, a, &self.strategies))
            .sum()
    }

    /// Best pure reply to the opponents' current strategies; first maximum wins.
    pub fn best_response(&self, player: PlayerId) -> BestResponse {
        let action_payoffs: Vec<f64> = (0..self.game.actions())
            .map(|a| self.game.action_payoff(player, a, &self.strategies))
            .collect();
        let mut best_action = 0;
        let mut payoff = f64::NEG_INFINITY;
        for (a, &u) in action_payoffs.iter().enumerate() {
            if u > payoff {
                payoff = u;
                best_action = a;
            }
        }
        BestResponse {
            best_action,
            payoff,
            strategy: soft_best_response(best_action, self.game.actions()),
            action_payoffs,
        }
    }

    /// Gain available to `player` from switching to its best pure reply.
    pub fn improvement(&self, player: PlayerId) -> f64 {
        self.best_response(player).payoff - self.player_payoff(player)
    }

    fn update_player_strategy(&mut self, player: PlayerId) -> Update {
        let current = self.player_payoff(player);
        let best_response = self.best_response(player);
        let improvement = best_response.payoff - current;
        let mut rate = 0.0;
        if improvement > self.config.epsilon {
            rate = learning_rate(improvement);
            let dist = &mut self.strategies[player].distribution;
            for (p, &target) in dist.iter_mut().zip(best_response.strategy.iter()) {
                *p = (1.0 - rate) * *p + rate * target;
            }
            normalize(dist);
        }
        Update {
            improvement,
            learning_rate: rate,
            best_response,
        }
    }

    /// Run rounds until convergence, `max_iterations`, or cancellation.
    pub fn solve<O: Observer + ?Sized>(&mut self, cancel: &CancelToken, observer: &mut O) -> ApproxReport {
        let start = Instant::now();
        let players = self.game.players();
        let max = self.config.max_iterations;
        log::info!(
            "approximate search over {} (epsilon {}, at most {} rounds)",
            self.game.name(),
            self.config.epsilon,
            max
        );

        let mut history = Vec::new();
        let mut metrics = Metrics::default();
        history.push(HistoryEntry {
            iteration: 0,
            player: None,
            strategies: self.strategies.clone(),
            payoffs: self.current_payoffs(),
            improvement: None,
            improvements: Vec::new(),
            total_improvement: 0.0,
            learning_rate: 0.0,
            best_response: None,
            action: "Initialized strategies".to_string(),
            progress: 0.0,
            timestamp: now_ms(),
        });

        let mut iteration = 0;
        let mut converged = false;
        while iteration < max && !converged && cancel.is_running() {
            let mut round_converged = true;
            let mut total_improvement = 0.0;
            let mut improvements = Vec::with_capacity(players);
            let mut interrupted = false;

            for player in 0..players {
                if cancel.is_cancelled() {
                    interrupted = true;
                    break;
                }
                let update = self.update_player_strategy(player);
                improvements.push(update.improvement);
                total_improvement += update.improvement;
                if update.improvement > self.config.epsilon {
                    round_converged = false;
                }
                let progress = (iteration as f64 + (player + 1) as f64 / players as f64) / max as f64 * 100.0;
                let entry = HistoryEntry {
                    iteration: iteration + 1,
                    player: Some(player),
                    strategies: self.strategies.clone(),
                    payoffs: self.current_payoffs(),
                    improvement: Some(update.improvement),
                    improvements: improvements.clone(),
                    total_improvement,
                    learning_rate: update.learning_rate,
                    action: format!("Player {} updates (Δ = {:.4})", player + 1, update.improvement),
                    best_response: Some(update.best_response),
                    progress,
                    timestamp: now_ms(),
                };
                observer.history(&entry);
                history.push(entry);
            }
            if interrupted {
                break;
            }

            converged = round_converged;
            metrics.improvements.push(total_improvement);
            metrics.payoff_history.push(self.current_payoffs());
            metrics.strategy_history.push(self.strategies.clone());
            observer.metrics(&metrics);

            iteration += 1;
            observer.progress(iteration as f64 / max as f64 * 100.0);
            log::debug!("round {} total improvement {:.6}", iteration, total_improvement);
        }

        let cancelled = cancel.is_cancelled();
        if converged {
            log::info!("converged after {} rounds", iteration);
        } else if !cancelled {
            log::warn!("no convergence within {} rounds", max);
        }
        ApproxReport {
            solution: EquilibriumSolution {
                kind: SolutionKind::Approximate {
                    epsilon: self.config.epsilon,
                },
                strategies: self.strategies.clone(),
                payoffs: self.current_payoffs(),
            },
            time: start.elapsed(),
            iterations: iteration,
            converged,
            history,
            metrics,
            cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets;

    fn config(epsilon: f64, max_iterations: usize, seed: u64) -> ApproxConfig {
        ApproxConfig {
            epsilon,
            max_iterations,
            seed: Some(seed),
        }
    }

    #[test]
    fn test_initial_strategies_are_distributions() {
        let game = presets::rock_paper_scissors();
        let solver = ApproximateSolver::new(&game, config(0.01, 10, 3)).unwrap();
        for s in solver.strategies() {
            assert_eq!(s.distribution.len(), 3);
            assert!((s.sum() - 1.0).abs() < 1e-12);
            assert!(s.distribution.iter().all(|&p| p >= 0.0));
        }
    }

    #[test]
    fn test_soft_best_response_shape() {
        let target = soft_best_response(1, 3);
        assert!((target[1] - 0.9).abs() < 1e-12);
        assert!((target[0] - 0.05).abs() < 1e-12);
        assert!((target.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_learning_rate_clamped() {
        assert_eq!(learning_rate(5.0), 0.2);
        assert_eq!(learning_rate(0.05), 0.01);
        assert!((learning_rate(1.0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_first_round_update_values() {
        let game = presets::prisoners_dilemma();
        let start = vec![PlayerStrategy::pure(0, 0, 2), PlayerStrategy::pure(1, 0, 2)];
        let mut solver = ApproximateSolver::from_strategies(&game, config(0.01, 1, 0), start).unwrap();
        let report = solver.solve(&CancelToken::new(), &mut ());

        // player 0: improvement 5 - 3 = 2, rate 0.2 toward [0.1, 0.9]
        let p0 = &report.history[1];
        assert!((p0.improvement.unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(p0.learning_rate, 0.2);
        assert!((p0.strategies[0].distribution[0] - 0.82).abs() < 1e-12);

        // player 1 replies to [0.82, 0.18]: 4.28 - 2.46 = 1.82, rate 0.182
        let p1 = &report.history[2];
        assert!((p1.improvement.unwrap() - 1.82).abs() < 1e-12);
        assert!((p1.learning_rate - 0.182).abs() < 1e-12);
        assert!((p1.strategies[1].distribution[0] - 0.8362).abs() < 1e-12);
        // the earlier snapshot is untouched by the later update
        assert!((p0.strategies[1].distribution[0] - 1.0).abs() < 1e-12);

        assert_eq!(report.iterations, 1);
        assert!(!report.converged);
    }

    #[test]
    fn test_converged_implies_epsilon_nash() {
        let game = presets::prisoners_dilemma();
        let mut solver = ApproximateSolver::new(&game, config(0.5, 500, 7)).unwrap();
        let report = solver.solve(&CancelToken::new(), &mut ());
        assert!(report.converged);
        for player in 0..2 {
            assert!(solver.improvement(player) <= 0.5);
        }
        // both players lean toward defecting
        for s in &report.solution.strategies {
            assert!(s.distribution[1] > 0.5);
        }
    }

    #[test]
    fn test_history_distributions_sum_to_one() {
        let game = presets::rock_paper_scissors();
        let mut solver = ApproximateSolver::new(&game, config(0.01, 50, 11)).unwrap();
        let report = solver.solve(&CancelToken::new(), &mut ());
        for entry in &report.history {
            for s in &entry.strategies {
                assert!((s.sum() - 1.0).abs() < 1e-9);
            }
        }
        assert_eq!(report.metrics.improvements.len(), report.iterations);
        assert_eq!(report.metrics.strategy_history.len(), report.iterations);
        assert_eq!(report.history.len(), 1 + 2 * report.iterations);
    }

    #[test]
    fn test_seeded_runs_are_deterministic() {
        let game = presets::chicken();
        let a = ApproximateSolver::new(&game, config(0.01, 100, 99)).unwrap().solve(&CancelToken::new(), &mut ());
        let b = ApproximateSolver::new(&game, config(0.01, 100, 99)).unwrap().solve(&CancelToken::new(), &mut ());
        assert_eq!(a.iterations, b.iterations);
        assert_eq!(a.converged, b.converged);
        assert_eq!(a.solution.strategies, b.solution.strategies);
    }

    #[test]
    fn test_indifferent_game_converges_immediately() {
        let flat = vec![vec![1.0; 3]; 3];
        let game = Game::bimatrix(
            "flat",
            [flat.clone(), flat],
            vec!["X".into(), "Y".into(), "Z".into()],
        )
        .unwrap();
        let mut solver = ApproximateSolver::new(&game, config(0.01, 100, 5)).unwrap();
        let before = solver.strategies().clone();
        let report = solver.solve(&CancelToken::new(), &mut ());
        assert!(report.converged);
        assert_eq!(report.iterations, 1);
        assert_eq!(solver.strategies(), &before);
        assert!(report.history.iter().all(|e| e.learning_rate == 0.0));
    }

    #[test]
    fn test_cancel_before_solve() {
        let game = presets::coordination();
        let token = CancelToken::new();
        token.stop();
        let report = ApproximateSolver::new(&game, config(0.01, 100, 1)).unwrap().solve(&token, &mut ());
        assert_eq!(report.iterations, 0);
        assert!(!report.converged);
        assert!(report.cancelled);
        assert_eq!(report.history.len(), 1);
        assert!((report.solution.strategies[0].sum() - 1.0).abs() < 1e-12);
    }

    struct StopAfterRounds {
        token: CancelToken,
        rounds: usize,
    }

    impl Observer for StopAfterRounds {
        fn metrics(&mut self, metrics: &Metrics) {
            if metrics.improvements.len() >= self.rounds {
                self.token.stop();
            }
        }
    }

    #[test]
    fn test_cancel_between_rounds() {
        let game = presets::rock_paper_scissors();
        let token = CancelToken::new();
        let mut observer = StopAfterRounds {
            token: token.clone(),
            rounds: 3,
        };
        let report = ApproximateSolver::new(&game, config(1e-9, 100, 2)).unwrap().solve(&token, &mut observer);
        assert_eq!(report.iterations, 3);
        assert!(report.cancelled);
    }

    #[test]
    fn test_three_player_game_runs() {
        let tensor: Vec<f64> = (0..8).map(|i| if i == 0 || i == 7 { 1.0 } else { 0.0 }).collect();
        let game = Game::from_tensors("unanimity", 3, 2, vec![tensor; 3], None).unwrap();
        let mut solver = ApproximateSolver::new(&game, config(0.01, 200, 8)).unwrap();
        let report = solver.solve(&CancelToken::new(), &mut ());
        assert_eq!(report.solution.payoffs.len(), 3);
        assert!(report.solution.payoffs.iter().all(|u| u.is_finite()));
        if report.converged {
            for player in 0..3 {
                assert!(solver.improvement(player) <= 0.01);
            }
        }
    }

    #[test]
    fn test_progress_never_exceeds_hundred() {
        let game = presets::prisoners_dilemma();
        let report = ApproximateSolver::new(&game, config(0.01, 20, 4)).unwrap().solve(&CancelToken::new(), &mut ());
        let progress: Vec<f64> = report.history.iter().map(|e| e.progress).collect();
        assert!(progress.windows(2).all(|w| w[0] <= w[1]));
        assert!(progress.iter().all(|&p| (0.0..=100.0 + 1e-9).contains(&p)));
    }

    struct StopAfterFirstPlayer {
        token: CancelToken,
        round: usize,
    }

    impl Observer for StopAfterFirstPlayer {
        fn history(&mut self, entry: &HistoryEntry) {
            if entry.iteration == self.round && entry.player == Some(0) {
                self.token.stop();
            }
        }
    }

    #[test]
    fn test_cancel_inside_round_discards_partial_round() {
        let game = presets::rock_paper_scissors();
        let token = CancelToken::new();
        let mut observer = StopAfterFirstPlayer {
            token: token.clone(),
            round: 2,
        };
        let report = ApproximateSolver::new(&game, config(1e-9, 100, 2))
            .unwrap()
            .solve(&token, &mut observer);
        assert!(report.cancelled);
        assert!(!report.converged);
        assert_eq!(report.iterations, 1);
        assert_eq!(report.metrics.improvements.len(), 1);
        // initial snapshot, both players of round 1, player 0 of round 2
        assert_eq!(report.history.len(), 4);
        assert_eq!(report.history[3].player, Some(0));
    }

    #[test]
    fn test_invalid_epsilon_rejected() {
        let game = presets::prisoners_dilemma();
        for epsilon in [f64::NAN, f64::INFINITY, -0.1] {
            let err = ApproximateSolver::new(&game, config(epsilon, 10, 1)).err();
            assert!(matches!(err, Some(GameError::InvalidEpsilon(_))));
        }
        assert!(ApproximateSolver::new(&game, config(0.0, 10, 1)).is_ok());
    }

    #[test]
    fn test_from_strategies_validates_profile() {
        let game = presets::prisoners_dilemma();
        let cfg = config(0.01, 10, 1);

        let one = vec![PlayerStrategy::uniform(0, 2)];
        assert!(matches!(
            ApproximateSolver::from_strategies(&game, cfg, one).err(),
            Some(GameError::StrategyCount { expected: 2, actual: 1 })
        ));

        let short = vec![PlayerStrategy::uniform(0, 2), PlayerStrategy::uniform(1, 3)];
        assert!(matches!(
            ApproximateSolver::from_strategies(&game, cfg, short).err(),
            Some(GameError::StrategyLength { player: 1, len: 3, expected: 2 })
        ));

        let unnormalized = vec![PlayerStrategy::uniform(0, 2), PlayerStrategy::new(1, vec![0.7, 0.7])];
        assert!(matches!(
            ApproximateSolver::from_strategies(&game, cfg, unnormalized).err(),
            Some(GameError::NotADistribution { player: 1, .. })
        ));

        let negative = vec![PlayerStrategy::new(0, vec![1.5, -0.5]), PlayerStrategy::uniform(1, 2)];
        assert!(matches!(
            ApproximateSolver::from_strategies(&game, cfg, negative).err(),
            Some(GameError::NotADistribution { player: 0, .. })
        ));
    }
}
