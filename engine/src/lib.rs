//! equilibrium Engine - Normal-form games and equilibrium solvers
//!
//! This crate contains the validated `Game` model, the exact solver (pure
//! profile enumeration plus the closed-form 2x2 mixed equilibrium), and the
//! approximate smoothed best-response solver, together with the trace and
//! cancellation types they share.
//!
//! The engine is platform-agnostic and has zero UI dependencies.

pub mod approx;
pub mod cancel;
pub mod error;
pub mod exact;
pub mod game;
pub mod presets;
pub mod solution;
pub mod strategy;
pub mod trace;

pub use approx::{ApproxConfig, ApproxReport, ApproximateSolver};
pub use cancel::CancelToken;
pub use error::GameError;
pub use exact::{ExactReport, ExactSolver};
pub use game::Game;
pub use solution::{EquilibriumSolution, Indifference, SolutionKind};
pub use strategy::{ActionId, PlayerId, PlayerStrategy, StrategyProfile};
pub use trace::{Event, HistoryEntry, Metrics, Observer, SearchStep};
