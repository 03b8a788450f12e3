//! Combinatorial payoff matrix of the patch/exploit game
//!
//! Strategies are bitmasks over the vulnerability list: bit `i` of a defender
//! mask means "vulnerability i is patched", bit `i` of an attacker mask means
//! "vulnerability i is exploited". The matrix is `2^k x 2^k` cells of 16 bytes,
//! so `k` is capped at [`MAX_VULNERABILITIES`] (2^20 cells, 16 MiB).

use crate::vulnerability::VulnerabilityDetail;
use rayon::prelude::*;
use serde::{Serialize, Serializer};

/// Subset of vulnerabilities, one bit per vulnerability.
pub type Mask = usize;

/// Largest vulnerability count the combinatorial game accepts.
pub const MAX_VULNERABILITIES: usize = 10;

/// Bits past the width of [`Mask`] are never set.
pub fn is_set(mask: Mask, bit: usize) -> bool {
    bit < Mask::BITS as usize && (mask >> bit) & 1 == 1
}

/// `[defenderPayoff, attackerPayoff]` for one (defender mask, attacker mask) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PayoffCell(pub f64, pub f64);

impl PayoffCell {
    pub fn defender(&self) -> f64 {
        self.0
    }

    pub fn attacker(&self) -> f64 {
        self.1
    }
}

/// Payoffs when the defender patches `def_mask` and the attacker exploits `att_mask`.
///
/// Patching costs `cD`; a patched vulnerability that is attacked returns `iA`
/// to the defender and costs the attacker `cA`. An unpatched vulnerability
/// that is attacked costs the defender `iA` and earns the attacker `prA`.
pub fn strategy_payoff(details: &[VulnerabilityDetail], def_mask: Mask, att_mask: Mask) -> PayoffCell {
    let mut defender = 0.0;
    let mut attacker = 0.0;
    for (i, vul) in details.iter().enumerate() {
        let patched = is_set(def_mask, i);
        let exploited = is_set(att_mask, i);
        if patched {
            defender -= vul.c_d;
            if exploited {
                defender += vul.i_a;
                attacker -= vul.c_a;
            }
        } else if exploited {
            defender -= vul.i_a;
            attacker += vul.pr_a;
        }
    }
    PayoffCell(defender, attacker)
}

/// Dense `2^k x 2^k` grid indexed `[defender mask][attacker mask]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PayoffMatrix {
    vulnerabilities: usize,
    rows: Vec<Vec<PayoffCell>>,
}

impl PayoffMatrix {
    /// Build the full matrix, computing rows in parallel. `None` when
    /// `details.len()` exceeds [`MAX_VULNERABILITIES`]; nothing is allocated
    /// in that case.
    pub fn build(details: &[VulnerabilityDetail]) -> Option<Self> {
        if details.len() > MAX_VULNERABILITIES {
            return None;
        }
        let size = 1usize << details.len();
        let rows = (0..size)
            .into_par_iter()
            .map(|def| (0..size).map(|att| strategy_payoff(details, def, att)).collect())
            .collect();
        Some(PayoffMatrix {
            vulnerabilities: details.len(),
            rows,
        })
    }

    pub fn vulnerabilities(&self) -> usize {
        self.vulnerabilities
    }

    /// Strategies per side, `2^k`.
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, def_mask: Mask, att_mask: Mask) -> PayoffCell {
        self.rows[def_mask][att_mask]
    }

    pub fn rows(&self) -> &[Vec<PayoffCell>] {
        &self.rows
    }

    /// Defender payoffs as a plain matrix.
    pub fn defender_matrix(&self) -> Vec<Vec<f64>> {
        self.project(PayoffCell::defender)
    }

    /// Attacker payoffs as a plain matrix.
    pub fn attacker_matrix(&self) -> Vec<Vec<f64>> {
        self.project(PayoffCell::attacker)
    }

    fn project(&self, f: fn(&PayoffCell) -> f64) -> Vec<Vec<f64>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(f).collect())
            .collect()
    }
}

impl Serialize for PayoffMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.rows.serialize(serializer)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn detail(subsystem: usize, i_a: f64, c_d: f64, c_a: f64, pr_a: f64) -> VulnerabilityDetail {
        VulnerabilityDetail {
            id: format!("VUL-{}", subsystem + 1),
            subsystem_index: subsystem,
            i_a,
            c_d,
            c_a,
            pr_a,
            vul_severity: 0.0,
        }
    }

    #[test]
    fn test_matrix_dimensions_and_origin() {
        for k in 0..=4 {
            let details: Vec<_> = (0..k).map(|i| detail(i, 3.0, 1.0, 2.0, 4.0)).collect();
            let matrix = PayoffMatrix::build(&details).unwrap();
            assert_eq!(matrix.size(), 1 << k);
            assert!(matrix.rows().iter().all(|row| row.len() == 1 << k));
            assert_eq!(matrix.cell(0, 0), PayoffCell(0.0, 0.0));
        }
    }

    #[test]
    fn test_single_vulnerability_cells() {
        let matrix = PayoffMatrix::build(&[detail(0, 10.0, 2.0, 3.0, 5.0)]).unwrap();
        assert_eq!(matrix.cell(0, 1), PayoffCell(-10.0, 5.0));
        assert_eq!(matrix.cell(1, 0), PayoffCell(-2.0, 0.0));
        assert_eq!(matrix.cell(1, 1), PayoffCell(8.0, -3.0));
    }

    #[test]
    fn test_cells_add_per_vulnerability() {
        let details = vec![detail(0, 10.0, 2.0, 3.0, 5.0), detail(1, 4.0, 1.0, 1.0, 2.0)];
        let matrix = PayoffMatrix::build(&details).unwrap();
        // patch vul 0, attack both: (-2 + 10) + (-4) ; (-3) + 2
        assert_eq!(matrix.cell(0b01, 0b11), PayoffCell(4.0, -1.0));
    }

    #[test]
    fn test_serializes_as_nested_pairs() {
        let matrix = PayoffMatrix::build(&[detail(0, 10.0, 2.0, 3.0, 5.0)]).unwrap();
        let json = serde_json::to_string(&matrix).unwrap();
        assert_eq!(json, "[[[0.0,0.0],[-10.0,5.0]],[[-2.0,0.0],[8.0,-3.0]]]");
    }

    #[test]
    fn test_build_stops_at_vulnerability_limit() {
        let at_limit: Vec<_> = (0..MAX_VULNERABILITIES).map(|i| detail(i, 1.0, 1.0, 1.0, 1.0)).collect();
        let matrix = PayoffMatrix::build(&at_limit).unwrap();
        assert_eq!(matrix.size(), 1 << MAX_VULNERABILITIES);

        let over: Vec<_> = (0..=MAX_VULNERABILITIES).map(|i| detail(i, 1.0, 1.0, 1.0, 1.0)).collect();
        assert!(PayoffMatrix::build(&over).is_none());
        let huge: Vec<_> = (0..70).map(|i| detail(i, 1.0, 1.0, 1.0, 1.0)).collect();
        assert!(PayoffMatrix::build(&huge).is_none());
    }

    #[test]
    fn test_bits_past_mask_width_are_clear() {
        assert!(is_set(usize::MAX, Mask::BITS as usize - 1));
        assert!(!is_set(usize::MAX, Mask::BITS as usize));
        assert!(!is_set(usize::MAX, 200));
        assert!(is_set(0b100, 2));
        assert!(!is_set(0b100, 1));
    }
}
