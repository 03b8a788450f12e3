//! Progress traces emitted while solving
//!
//! Traces are append-only records owned by the solve call and returned with
//! its report. Solvers never read them back. Callers wanting live progress
//! pass an [`Observer`]; a `Sender<Event>` works as one for cross-thread
//! streaming.

use crate::solution::EquilibriumSolution;
use crate::strategy::{ActionId, StrategyProfile};
use serde::Serialize;
use std::sync::mpsc::Sender;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch (0 if the clock is before it).
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Serialize a duration as fractional milliseconds.
pub(crate) fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64() * 1e3)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Phase,
    Testing,
    Found,
    Calculating,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    PureSearch,
    PureTesting,
    FoundPure,
    MixedSearch,
    MixedCalculation,
    MixedComplete,
    FoundMixed,
    Error,
}

/// One record of the exact solver's search.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStep {
    #[serde(rename = "type")]
    pub kind: StepKind,
    pub phase: Phase,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate: Option<Vec<ActionId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<EquilibriumSolution>,
    pub progress: f64,
    pub timestamp: u64,
    pub solutions_found: usize,
}

/// The best pure reply a player found during one update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BestResponse {
    pub best_action: ActionId,
    pub payoff: f64,
    pub action_payoffs: Vec<f64>,
    /// Soft target: 0.9 on `best_action`, the rest spread evenly.
    pub strategy: Vec<f64>,
}

/// One record of the approximate solver's trajectory.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub iteration: usize,
    /// Updating player; `None` for the initial snapshot.
    pub player: Option<usize>,
    pub strategies: StrategyProfile,
    pub payoffs: Vec<f64>,
    pub improvement: Option<f64>,
    /// Improvements of the players updated so far in this round.
    pub improvements: Vec<f64>,
    pub total_improvement: f64,
    /// Blend rate actually applied (0 when the player did not move).
    pub learning_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_response: Option<BestResponse>,
    pub action: String,
    pub progress: f64,
    pub timestamp: u64,
}

/// Per-round convergence metrics of the approximate solver.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub improvements: Vec<f64>,
    pub payoff_history: Vec<Vec<f64>>,
    pub strategy_history: Vec<StrategyProfile>,
}

/// Synchronous callbacks invoked by the solvers. All methods default to no-ops.
pub trait Observer {
    fn progress(&mut self, _percent: f64) {}
    fn step(&mut self, _step: &SearchStep) {}
    fn history(&mut self, _entry: &HistoryEntry) {}
    fn metrics(&mut self, _metrics: &Metrics) {}
}

impl Observer for () {}

#[derive(Debug, Clone)]
pub enum Event {
    Progress(f64),
    Step(SearchStep),
    History(HistoryEntry),
    Metrics(Metrics),
}

/// Forwards every callback as an [`Event`]. A dropped receiver is ignored;
/// the solve keeps running.
impl Observer for Sender<Event> {
    fn progress(&mut self, percent: f64) {
        let _ = self.send(Event::Progress(percent));
    }
    fn step(&mut self, step: &SearchStep) {
        let _ = self.send(Event::Step(step.clone()));
    }
    fn history(&mut self, entry: &HistoryEntry) {
        let _ = self.send(Event::History(entry.clone()));
    }
    fn metrics(&mut self, metrics: &Metrics) {
        let _ = self.send(Event::Metrics(metrics.clone()));
    }
}
