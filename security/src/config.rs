//! System description and the end-to-end analysis pipeline.

use crate::error::SecurityError;
use crate::interpret::{interpret_nash_equilibrium_strategies, StrategyInterpretation};
use crate::nash::{calculate_nash_equilibrium_with, NashOutcome, ReplicatorConfig};
use crate::risk::compute_risk_scores;
use crate::roster::{distribute_profits, Participant, ProfitDistribution};
use crate::vulnerability::{
    compute_vulnerability_details, prioritize_patches, PatchPriority, VulnerabilityDetail,
    VulnerabilityRecord,
};
use serde::{Deserialize, Serialize};

/// A system under analysis, as loaded from a JSON description.
///
/// Missing weights take the defaults `w1 = 1`, `w2 = 1`, `k4 = 1`, `k5 = 2`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemConfig {
    pub num_subsystems: usize,
    pub functional_matrix: Vec<Vec<f64>>,
    pub topology_matrix: Vec<Vec<f64>>,
    #[serde(default = "one")]
    pub w1: f64,
    #[serde(default = "one")]
    pub w2: f64,
    #[serde(default = "one")]
    pub k4: f64,
    #[serde(default = "two")]
    pub k5: f64,
    #[serde(default)]
    pub vulnerabilities: Vec<VulnerabilityRecord>,
    #[serde(default)]
    pub players: Vec<Participant>,
    #[serde(default)]
    pub replicator: ReplicatorConfig,
}

fn one() -> f64 {
    1.0
}

fn two() -> f64 {
    2.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub risk_scores: Vec<f64>,
    pub vulnerability_details: Vec<VulnerabilityDetail>,
    pub patch_priority: Vec<PatchPriority>,
    pub profit_distribution: Option<ProfitDistribution>,
    pub nash: NashOutcome,
    pub interpretation: Option<StrategyInterpretation>,
}

impl SystemConfig {
    /// Risk scores, vulnerability terms, patch order, profit split and the
    /// coalition equilibria with their reading.
    pub fn analyze(&self) -> Result<Analysis, SecurityError> {
        let risk_scores = compute_risk_scores(
            &self.functional_matrix,
            &self.topology_matrix,
            self.num_subsystems,
            self.w1,
            self.w2,
        )?;
        let vulnerability_details =
            compute_vulnerability_details(&self.vulnerabilities, &risk_scores, self.k4, self.k5)?;
        let patch_priority = prioritize_patches(&vulnerability_details);
        let profit_distribution = distribute_profits(&vulnerability_details, &self.players);
        let nash = calculate_nash_equilibrium_with(&vulnerability_details, &self.players, self.replicator);
        let interpretation = interpret_nash_equilibrium_strategies(&nash, &vulnerability_details);
        Ok(Analysis {
            risk_scores,
            vulnerability_details,
            patch_priority,
            profit_distribution,
            nash,
            interpretation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYSTEM: &str = r#"{
        "numSubsystems": 3,
        "functionalMatrix": [[0, 1, 0], [1, 0, 1], [0, 1, 0]],
        "topologyMatrix": [[0, 1, 1], [1, 0, 0], [1, 0, 0]],
        "vulnerabilities": [
            { "id": "CVE-A", "subsystemIndex": 0, "impactScore": 5, "exploitScore": 7, "exploitExists": 1 },
            { "subsystemIndex": 2, "impactScore": 4, "exploitScore": 3, "exploitExists": 0 }
        ],
        "players": [
            { "id": 1, "name": "Defender Alpha", "group": "defenders" },
            { "id": 2, "name": "Attacker X", "group": "attackers" }
        ]
    }"#;

    #[test]
    fn test_defaults_applied() {
        let config: SystemConfig = serde_json::from_str(SYSTEM).unwrap();
        assert_eq!((config.w1, config.w2, config.k4, config.k5), (1.0, 1.0, 1.0, 2.0));
        assert_eq!(config.replicator, ReplicatorConfig::default());
        assert_eq!(config.vulnerabilities[0].id.as_deref(), Some("CVE-A"));
    }

    #[test]
    fn test_full_analysis() {
        let mut config: SystemConfig = serde_json::from_str(SYSTEM).unwrap();
        config.replicator.iterations = 100;
        let analysis = config.analyze().unwrap();
        assert_eq!(analysis.risk_scores, vec![3.0, 3.0, 2.0]);
        assert_eq!(analysis.vulnerability_details[1].id, "VUL-2");
        assert_eq!(analysis.patch_priority.len(), 2);
        assert!(analysis.profit_distribution.is_some());
        assert!(analysis.nash.has_nash());
        assert!(analysis.interpretation.is_some());

        let value = serde_json::to_value(&analysis).unwrap();
        assert_eq!(value["nash"]["hasNash"], true);
        assert_eq!(value["vulnerabilityDetails"][0]["id"], "CVE-A");
    }

    #[test]
    fn test_no_players_is_not_an_error() {
        let mut config: SystemConfig = serde_json::from_str(SYSTEM).unwrap();
        config.players.clear();
        let analysis = config.analyze().unwrap();
        assert!(!analysis.nash.has_nash());
        assert!(analysis.interpretation.is_none());
        assert!(analysis.profit_distribution.is_none());
    }

    #[test]
    fn test_bad_subsystem_is_an_error() {
        let mut config: SystemConfig = serde_json::from_str(SYSTEM).unwrap();
        config.vulnerabilities[1].subsystem_index = 5;
        assert!(matches!(
            config.analyze(),
            Err(SecurityError::UnknownSubsystem { subsystem: 5, .. })
        ));
    }
}
