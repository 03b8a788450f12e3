//! Subsystem risk from functional dependencies and network topology.

use crate::error::SecurityError;

/// `risk[s] = w1 * Σ functional[s] + w2 * Σ topology[s]` for the first
/// `num_subsystems` rows.
pub fn compute_risk_scores(
    functional: &[Vec<f64>],
    topology: &[Vec<f64>],
    num_subsystems: usize,
    w1: f64,
    w2: f64,
) -> Result<Vec<f64>, SecurityError> {
    check_weight("w1", w1)?;
    check_weight("w2", w2)?;
    check_rows("functional", functional, num_subsystems)?;
    check_rows("topology", topology, num_subsystems)?;

    let scores = (0..num_subsystems)
        .map(|s| {
            let functional_dependency: f64 = functional[s].iter().sum();
            let topological_dependency: f64 = topology[s].iter().sum();
            w1 * functional_dependency + w2 * topological_dependency
        })
        .collect();
    log::debug!("risk scores {:?}", scores);
    Ok(scores)
}

pub(crate) fn check_weight(name: &'static str, value: f64) -> Result<(), SecurityError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SecurityError::InvalidWeight { name, value })
    }
}

fn check_rows(matrix: &'static str, rows: &[Vec<f64>], expected: usize) -> Result<(), SecurityError> {
    if rows.len() < expected {
        return Err(SecurityError::MatrixRows {
            matrix,
            rows: rows.len(),
            expected,
        });
    }
    if let Some(row) = rows[..expected]
        .iter()
        .position(|r| r.iter().any(|v| !v.is_finite()))
    {
        return Err(SecurityError::NonFinite { matrix, row });
    }
    Ok(())
}
