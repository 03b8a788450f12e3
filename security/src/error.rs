use thiserror::Error;

/// Malformed security-model inputs. Missing players or vulnerabilities are
/// not errors; they yield `NashOutcome::Unavailable`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SecurityError {
    #[error("{matrix} matrix has {rows} rows, expected at least {expected}")]
    MatrixRows {
        matrix: &'static str,
        rows: usize,
        expected: usize,
    },
    #[error("{matrix} matrix row {row} contains a non-finite entry")]
    NonFinite { matrix: &'static str, row: usize },
    #[error("vulnerability {id} references subsystem {subsystem}, but only {known} risk scores exist")]
    UnknownSubsystem {
        id: String,
        subsystem: usize,
        known: usize,
    },
    #[error("vulnerability {id}: {field} = {value} is outside {range}")]
    ScoreOutOfRange {
        id: String,
        field: &'static str,
        value: f64,
        range: &'static str,
    },
    #[error("weight {name} = {value} must be finite and non-negative")]
    InvalidWeight { name: &'static str, value: f64 },
}
