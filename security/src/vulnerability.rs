//! Per-vulnerability payoff terms and patch prioritization
//!
//! Scoring convention (all monotone in the inputs):
//!
//!   exploitability = k4 * exploitScore + k5 * exploitExists
//!   reach          = exploitability / (10 * k4 + k5)     in [0, 1]
//!   iA             = impactScore * (1 + risk)
//!   cD             = 1 + impactScore / 2
//!   cA             = 1 + (10 - exploitScore) / (1 + k5 * exploitExists)
//!   prA            = iA * reach - cA
//!   vulSeverity    = impactScore * exploitability * (1 + risk)
//!
//! Higher impact, exploitability or subsystem risk raises the attacker's
//! profit; a public exploit (weighted by k5) cuts the attacker's cost.

use crate::error::SecurityError;
use crate::risk::check_weight;
use serde::{Deserialize, Serialize};

/// Raw CVSS-like record as entered or imported for a subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub subsystem_index: usize,
    /// CVSS impact, `[0, 10]`.
    pub impact_score: f64,
    /// CVSS exploitability, `[0, 10]`.
    pub exploit_score: f64,
    /// 1 when a public exploit exists, else 0.
    pub exploit_exists: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityDetail {
    pub id: String,
    pub subsystem_index: usize,
    /// Attacker's impact: damage done by a successful exploit.
    #[serde(rename = "iA")]
    pub i_a: f64,
    /// Defender's cost of patching.
    #[serde(rename = "cD")]
    pub c_d: f64,
    /// Attacker's cost of exploiting.
    #[serde(rename = "cA")]
    pub c_a: f64,
    /// Attacker's net profit from an unpatched exploit.
    #[serde(rename = "prA")]
    pub pr_a: f64,
    pub vul_severity: f64,
}

/// Derive payoff terms for every record. `risk_scores` is indexed by subsystem.
pub fn compute_vulnerability_details(
    records: &[VulnerabilityRecord],
    risk_scores: &[f64],
    k4: f64,
    k5: f64,
) -> Result<Vec<VulnerabilityDetail>, SecurityError> {
    check_weight("k4", k4)?;
    check_weight("k5", k5)?;
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let id = record
                .id
                .clone()
                .unwrap_or_else(|| format!("VUL-{}", i + 1));
            validate(&id, record)?;
            let risk = *risk_scores.get(record.subsystem_index).ok_or_else(|| {
                SecurityError::UnknownSubsystem {
                    id: id.clone(),
                    subsystem: record.subsystem_index,
                    known: risk_scores.len(),
                }
            })?;

            let exists = f64::from(record.exploit_exists);
            let exploitability = k4 * record.exploit_score + k5 * exists;
            let scale = 10.0 * k4 + k5;
            let reach = if scale > 0.0 { exploitability / scale } else { 0.0 };
            let i_a = record.impact_score * (1.0 + risk);
            let c_d = 1.0 + record.impact_score / 2.0;
            let c_a = 1.0 + (10.0 - record.exploit_score) / (1.0 + k5 * exists);
            Ok(VulnerabilityDetail {
                id,
                subsystem_index: record.subsystem_index,
                i_a,
                c_d,
                c_a,
                pr_a: i_a * reach - c_a,
                vul_severity: record.impact_score * exploitability * (1.0 + risk),
            })
        })
        .collect()
}

fn validate(id: &str, record: &VulnerabilityRecord) -> Result<(), SecurityError> {
    let scores = [
        ("impactScore", record.impact_score),
        ("exploitScore", record.exploit_score),
    ];
    for (field, value) in scores {
        if !(0.0..=10.0).contains(&value) {
            return Err(SecurityError::ScoreOutOfRange {
                id: id.to_string(),
                field,
                value,
                range: "[0, 10]",
            });
        }
    }
    if record.exploit_exists > 1 {
        return Err(SecurityError::ScoreOutOfRange {
            id: id.to_string(),
            field: "exploitExists",
            value: f64::from(record.exploit_exists),
            range: "{0, 1}",
        });
    }
    Ok(())
}

/// A vulnerability ranked by damage prevented per unit of patching effort.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchPriority {
    pub rank: usize,
    pub ratio: f64,
    #[serde(flatten)]
    pub detail: VulnerabilityDetail,
}

/// Order vulnerabilities by `iA / (cD + 0.01)`, highest first. Ties keep
/// input order.
pub fn prioritize_patches(details: &[VulnerabilityDetail]) -> Vec<PatchPriority> {
    let mut ranked: Vec<(f64, &VulnerabilityDetail)> = details
        .iter()
        .map(|d| (d.i_a / (d.c_d + 0.01), d))
        .collect();
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
    ranked
        .into_iter()
        .enumerate()
        .map(|(i, (ratio, detail))| PatchPriority {
            rank: i + 1,
            ratio,
            detail: detail.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(subsystem: usize, impact: f64, exploit: f64, exists: u8) -> VulnerabilityRecord {
        VulnerabilityRecord {
            id: None,
            subsystem_index: subsystem,
            impact_score: impact,
            exploit_score: exploit,
            exploit_exists: exists,
        }
    }

    #[test]
    fn test_detail_formulas() {
        let records = vec![record(0, 5.0, 7.0, 1), record(1, 4.0, 3.0, 0)];
        let details = compute_vulnerability_details(&records, &[2.0, 1.0], 1.0, 2.0).unwrap();

        let a = &details[0];
        assert_eq!(a.id, "VUL-1");
        assert!((a.i_a - 15.0).abs() < 1e-12);
        assert!((a.c_d - 3.5).abs() < 1e-12);
        assert!((a.c_a - 2.0).abs() < 1e-12);
        assert!((a.pr_a - 9.25).abs() < 1e-12);
        assert!((a.vul_severity - 135.0).abs() < 1e-12);

        let b = &details[1];
        assert!((b.i_a - 8.0).abs() < 1e-12);
        assert!((b.c_a - 8.0).abs() < 1e-12);
        assert!((b.pr_a + 6.0).abs() < 1e-12);
        assert!((b.vul_severity - 24.0).abs() < 1e-12);
    }

    #[test]
    fn test_profit_grows_with_exploitability_and_risk() {
        let risk = [1.0, 3.0];
        let base = compute_vulnerability_details(&[record(0, 5.0, 4.0, 0)], &risk, 1.0, 2.0).unwrap();
        let easier = compute_vulnerability_details(&[record(0, 5.0, 8.0, 0)], &risk, 1.0, 2.0).unwrap();
        let exploited = compute_vulnerability_details(&[record(0, 5.0, 4.0, 1)], &risk, 1.0, 2.0).unwrap();
        let riskier = compute_vulnerability_details(&[record(1, 5.0, 4.0, 0)], &risk, 1.0, 2.0).unwrap();
        assert!(easier[0].pr_a > base[0].pr_a);
        assert!(exploited[0].pr_a > base[0].pr_a);
        assert!(exploited[0].c_a < base[0].c_a);
        assert!(riskier[0].pr_a > base[0].pr_a);
    }

    #[test]
    fn test_zero_weights_do_not_divide_by_zero() {
        let details = compute_vulnerability_details(&[record(0, 5.0, 4.0, 1)], &[0.0], 0.0, 0.0).unwrap();
        assert!(details[0].pr_a.is_finite());
        assert_eq!(details[0].vul_severity, 0.0);
    }

    #[test]
    fn test_unknown_subsystem() {
        let err = compute_vulnerability_details(&[record(3, 5.0, 4.0, 1)], &[0.0], 1.0, 2.0).unwrap_err();
        assert!(matches!(err, SecurityError::UnknownSubsystem { subsystem: 3, known: 1, .. }));
    }

    #[test]
    fn test_out_of_range_score() {
        let err = compute_vulnerability_details(&[record(0, 11.0, 4.0, 1)], &[0.0], 1.0, 2.0).unwrap_err();
        assert!(matches!(err, SecurityError::ScoreOutOfRange { field: "impactScore", .. }));
        let err = compute_vulnerability_details(&[record(0, 1.0, 4.0, 2)], &[0.0], 1.0, 2.0).unwrap_err();
        assert!(matches!(err, SecurityError::ScoreOutOfRange { field: "exploitExists", .. }));
    }

    #[test]
    fn test_priority_order() {
        let records = vec![record(0, 2.0, 5.0, 0), record(1, 8.0, 5.0, 0), record(2, 5.0, 5.0, 0)];
        let details = compute_vulnerability_details(&records, &[0.0, 0.0, 0.0], 1.0, 2.0).unwrap();
        let order: Vec<usize> = prioritize_patches(&details)
            .iter()
            .map(|p| p.detail.subsystem_index)
            .collect();
        // iA / cD = 2/2, 8/5, 5/3.5
        assert_eq!(order, vec![1, 2, 0]);
        assert_eq!(prioritize_patches(&details)[0].rank, 1);
    }

    #[test]
    fn test_record_json_shape() {
        let json = r#"{ "subsystemIndex": 2, "impactScore": 7, "exploitScore": 8, "exploitExists": 1 }"#;
        let r: VulnerabilityRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r, record(2, 7.0, 8.0, 1));
    }
}
