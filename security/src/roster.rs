//! Participants and coalition profit sharing.

use crate::vulnerability::VulnerabilityDetail;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    Defenders,
    Attackers,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: u32,
    pub name: String,
    pub group: Group,
    #[serde(default = "active_by_default")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

fn active_by_default() -> bool {
    true
}

impl Participant {
    pub fn new(id: u32, name: impl Into<String>, group: Group) -> Self {
        Participant {
            id,
            name: name.into(),
            group,
            active: true,
            role: None,
        }
    }
}

/// Active members of `group`, in roster order.
pub fn active_members(players: &[Participant], group: Group) -> Vec<&Participant> {
    players
        .iter()
        .filter(|p| p.group == group && p.active)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitShare {
    pub id: u32,
    pub name: String,
    pub group: Group,
    pub profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitDistribution {
    /// Σ prA over all vulnerabilities.
    pub total_attacker_profit: f64,
    /// Σ (iA - cD) over all vulnerabilities.
    pub total_defender_profit: f64,
    pub shares: Vec<ProfitShare>,
}

/// Split each coalition's total evenly among its active members. `None`
/// when either coalition is empty or there are no vulnerabilities.
pub fn distribute_profits(
    details: &[VulnerabilityDetail],
    players: &[Participant],
) -> Option<ProfitDistribution> {
    let attackers = active_members(players, Group::Attackers);
    let defenders = active_members(players, Group::Defenders);
    if attackers.is_empty() || defenders.is_empty() || details.is_empty() {
        return None;
    }
    let total_attacker_profit: f64 = details.iter().map(|v| v.pr_a).sum();
    let total_defender_profit: f64 = details.iter().map(|v| v.i_a - v.c_d).sum();
    let attacker_share = total_attacker_profit / attackers.len() as f64;
    let defender_share = total_defender_profit / defenders.len() as f64;

    let shares = players
        .iter()
        .filter(|p| p.active)
        .map(|p| ProfitShare {
            id: p.id,
            name: p.name.clone(),
            group: p.group,
            profit: match p.group {
                Group::Attackers => attacker_share,
                Group::Defenders => defender_share,
            },
        })
        .collect();
    Some(ProfitDistribution {
        total_attacker_profit,
        total_defender_profit,
        shares,
    })
}
