//! Exact equilibrium search: exhaustive pure-profile testing for any number of
//! players, plus the closed-form interior mixed equilibrium of 2x2 games.
//!
//! Both phases append to a trace and notify the observer synchronously. The
//! cancel token is polled before each phase and each candidate profile; a
//! cancelled solve returns whatever equilibria it had already found.

use crate::cancel::CancelToken;
use crate::game::{Game, Matrix};
use crate::solution::{EquilibriumSolution, Indifference, SolutionKind};
use crate::strategy::{ActionId, PlayerStrategy, StrategyProfile};
use crate::trace::{now_ms, Observer, Phase, SearchStep, StepKind};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Deviation tolerance: a unilateral deviation only breaks an equilibrium
/// if it gains more than this.
pub const EPSILON: f64 = 1e-10;

/// Outcome of solving the 2x2 indifference equations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClosedForm {
    /// A denominator vanished: indifference lines are parallel.
    Degenerate,
    /// Solved, but `p` or `q` is outside `[0, 1]` or NaN.
    OutOfRange { p: f64, q: f64 },
    Interior(Indifference),
}

/// Indifference probabilities for a 2x2 bimatrix game `(A, B)`.
///
/// `p` is the probability that player 0 plays action 0, `q` the probability
/// that player 1 plays action 0.
pub fn closed_form_2x2(a: &Matrix, b: &Matrix, epsilon: f64) -> ClosedForm {
    let denom_p = b[0][0] - b[0][1] - b[1][0] + b[1][1];
    let denom_q = a[0][0] - a[1][0] - a[0][1] + a[1][1];
    if denom_p.abs() < epsilon || denom_q.abs() < epsilon {
        return ClosedForm::Degenerate;
    }
    let p = (b[1][1] - b[0][1]) / denom_p;
    let q = (a[1][1] - a[1][0]) / denom_q;
    if is_probability(p) && is_probability(q) {
        ClosedForm::Interior(Indifference { p, q })
    } else {
        ClosedForm::OutOfRange { p, q }
    }
}

fn is_probability(x: f64) -> bool {
    (0.0..=1.0).contains(&x)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactReport {
    pub solutions: Vec<EquilibriumSolution>,
    /// Wall time of the solve (serialized in milliseconds).
    #[serde(serialize_with = "crate::trace::as_millis")]
    pub time: Duration,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub search_steps: Vec<SearchStep>,
    pub cancelled: bool,
}

impl ExactReport {
    pub fn pure(&self) -> impl Iterator<Item = &EquilibriumSolution> {
        self.solutions.iter().filter(|s| s.is_pure())
    }

    pub fn mixed(&self) -> Option<&EquilibriumSolution> {
        self.solutions.iter().find(|s| s.is_mixed())
    }
}

/// Mutable state of one solve: found solutions, the trace, and the callbacks.
struct Search<'a, O: Observer + ?Sized> {
    solutions: Vec<EquilibriumSolution>,
    steps: Vec<SearchStep>,
    observer: &'a mut O,
    cancel: &'a CancelToken,
}

impl<O: Observer + ?Sized> Search<'_, O> {
    fn running(&self) -> bool {
        self.cancel.is_running()
    }

    fn record(
        &mut self,
        kind: StepKind,
        phase: Phase,
        message: String,
        progress: f64,
        candidate: Option<Vec<ActionId>>,
        solution: Option<EquilibriumSolution>,
    ) {
        let step = SearchStep {
            kind,
            phase,
            message,
            candidate,
            solution,
            progress,
            timestamp: now_ms(),
            solutions_found: self.solutions.len(),
        };
        self.observer.step(&step);
        self.steps.push(step);
    }
}

/// Exhaustive solver over a borrowed game.
#[derive(Debug, Clone, Copy)]
pub struct ExactSolver<'g> {
    game: &'g Game,
    epsilon: f64,
}

impl<'g> ExactSolver<'g> {
    pub fn new(game: &'g Game) -> Self {
        ExactSolver {
            game,
            epsilon: EPSILON,
        }
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn game(&self) -> &'g Game {
        self.game
    }

    /// Run both phases. The mixed phase only runs for 2-player games.
    pub fn solve<O: Observer + ?Sized>(&self, cancel: &CancelToken, observer: &mut O) -> ExactReport {
        let start = Instant::now();
        log::info!(
            "exact search over {} ({} players, {} actions, {} profiles)",
            self.game.name(),
            self.game.players(),
            self.game.actions(),
            self.game.profile_count()
        );
        let mut search = Search {
            solutions: Vec::new(),
            steps: Vec::new(),
            observer,
            cancel,
        };
        self.find_pure_strategies(&mut search);
        if self.game.players() == 2 {
            self.find_mixed_strategies(&mut search);
        }
        let cancelled = cancel.is_cancelled();
        if cancelled {
            log::info!("exact search stopped with {} solutions", search.solutions.len());
        } else {
            search.observer.progress(100.0);
            log::info!("exact search found {} solutions", search.solutions.len());
        }
        ExactReport {
            solutions: search.solutions,
            time: start.elapsed(),
            kind: "exact",
            search_steps: search.steps,
            cancelled,
        }
    }

    /// No player gains more than `epsilon` by deviating unilaterally from `profile`.
    pub fn is_pure_nash_equilibrium(&self, profile: &[ActionId]) -> bool {
        let mut test = profile.to_vec();
        for player in 0..self.game.players() {
            let current = self.game.payoff(player, profile);
            for action in 0..self.game.actions() {
                test[player] = action;
                if self.game.payoff(player, &test) > current + self.epsilon {
                    return false;
                }
            }
            test[player] = profile[player];
        }
        true
    }

    fn pure_profile(&self, profile: &[ActionId]) -> StrategyProfile {
        profile
            .iter()
            .enumerate()
            .map(|(player, &a)| PlayerStrategy::pure(player, a, self.game.actions()))
            .collect()
    }

    fn find_pure_strategies<O: Observer + ?Sized>(&self, search: &mut Search<'_, O>) {
        if !search.running() {
            return;
        }
        search.record(
            StepKind::Phase,
            Phase::PureSearch,
            "Searching for pure strategy equilibria...".to_string(),
            10.0,
            None,
            None,
        );
        let total = self.game.profile_count() as f64;
        for (i, profile) in self.game.profiles().enumerate() {
            if !search.running() {
                return;
            }
            let progress = 10.0 + (i as f64 / total) * 40.0;
            search.record(
                StepKind::Testing,
                Phase::PureTesting,
                format!("Testing: {}", self.game.format_profile(&profile)),
                progress,
                Some(profile.clone()),
                None,
            );
            search.observer.progress(progress);

            if self.is_pure_nash_equilibrium(&profile) {
                let strategies = self.pure_profile(&profile);
                let payoffs = self.game.expected_payoffs(&strategies);
                log::debug!("pure equilibrium {:?} payoffs {:?}", profile, payoffs);
                let solution = EquilibriumSolution {
                    kind: SolutionKind::Pure {
                        action_profile: profile.clone(),
                    },
                    strategies,
                    payoffs,
                };
                search.solutions.push(solution.clone());
                search.record(
                    StepKind::Found,
                    Phase::FoundPure,
                    format!("Found pure Nash: {}", self.game.format_profile(&profile)),
                    progress,
                    None,
                    Some(solution),
                );
            }
        }
    }

    fn find_mixed_strategies<O: Observer + ?Sized>(&self, search: &mut Search<'_, O>) {
        if !search.running() {
            return;
        }
        search.record(
            StepKind::Phase,
            Phase::MixedSearch,
            "Searching for mixed strategy equilibria...".to_string(),
            50.0,
            None,
            None,
        );
        if self.game.actions() == 2 {
            self.solve_2x2_mixed_strategy(search);
        } else {
            search.record(
                StepKind::Warning,
                Phase::MixedComplete,
                format!(
                    "Closed-form mixed search needs 2 actions per player, game has {}",
                    self.game.actions()
                ),
                80.0,
                None,
                None,
            );
        }
    }

    fn solve_2x2_mixed_strategy<O: Observer + ?Sized>(&self, search: &mut Search<'_, O>) {
        if !search.running() {
            return;
        }
        search.record(
            StepKind::Calculating,
            Phase::MixedCalculation,
            "Calculating indifference probabilities...".to_string(),
            60.0,
            None,
            None,
        );
        search.observer.progress(60.0);

        let (Some(a), Some(b)) = (self.game.matrix(0), self.game.matrix(1)) else {
            return;
        };
        match closed_form_2x2(&a, &b, self.epsilon) {
            ClosedForm::Degenerate => {
                log::warn!("degenerate 2x2 indifference system in {}", self.game.name());
                search.record(
                    StepKind::Warning,
                    Phase::MixedComplete,
                    "No mixed strategy equilibrium found".to_string(),
                    80.0,
                    None,
                    None,
                );
            }
            ClosedForm::OutOfRange { p, q } => {
                search.record(
                    StepKind::Warning,
                    Phase::MixedComplete,
                    format!("No interior mixed equilibrium (p = {:.4}, q = {:.4})", p, q),
                    80.0,
                    None,
                    None,
                );
            }
            ClosedForm::Interior(indifference) => {
                let Indifference { p, q } = indifference;
                let strategies = vec![
                    PlayerStrategy::new(0, vec![p, 1.0 - p]),
                    PlayerStrategy::new(1, vec![q, 1.0 - q]),
                ];
                let payoffs = self.game.expected_payoffs(&strategies);
                if payoffs.iter().any(|u| !u.is_finite()) {
                    search.record(
                        StepKind::Error,
                        Phase::Error,
                        "Error in mixed strategy calculation".to_string(),
                        80.0,
                        None,
                        None,
                    );
                    return;
                }
                log::debug!("mixed equilibrium p = {} q = {}", p, q);
                let solution = EquilibriumSolution {
                    kind: SolutionKind::Mixed { indifference },
                    strategies,
                    payoffs,
                };
                search.solutions.push(solution.clone());
                search.record(
                    StepKind::Found,
                    Phase::FoundMixed,
                    "Found mixed strategy equilibrium".to_string(),
                    80.0,
                    None,
                    Some(solution),
                );
            }
        }
    }
}
