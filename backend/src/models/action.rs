//! Planned interventions and their KPI links

use serde::{Deserialize, Serialize};

/// Link between an action and a KPI it moves
///
/// `impact_score` is a multiplicative rate applied to the KPI's baseline
/// (0.1 = +10% of baseline at full completion and certain success), not an
/// absolute increment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiImpact {
    pub kpi_id: String,
    pub impact_score: f64,
}

/// A planned intervention
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Unique action identifier
    pub id: String,

    /// Short business code (e.g. "A-12")
    #[serde(default)]
    pub code: String,

    #[serde(default)]
    pub title: String,

    /// KPIs this action moves
    #[serde(default)]
    pub impacts: Vec<KpiImpact>,

    /// Monetary benefit at full completion (derived from impacts when absent)
    #[serde(default)]
    pub expected_benefit: Option<f64>,

    /// Monetary cost (derived from resource use when absent)
    #[serde(default)]
    pub estimated_cost: Option<f64>,
}

impl Action {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            code: id.clone(),
            id,
            title: String::new(),
            impacts: Vec::new(),
            expected_benefit: None,
            estimated_cost: None,
        }
    }

    /// Builder: add a KPI link
    pub fn with_impact(mut self, kpi_id: impl Into<String>, impact_score: f64) -> Self {
        self.impacts.push(KpiImpact {
            kpi_id: kpi_id.into(),
            impact_score,
        });
        self
    }

    /// Builder: explicit benefit and cost estimates
    pub fn with_economics(mut self, expected_benefit: f64, estimated_cost: f64) -> Self {
        self.expected_benefit = Some(expected_benefit);
        self.estimated_cost = Some(estimated_cost);
        self
    }

    /// Impact score on a KPI (0 when the action does not touch it)
    ///
    /// Multiple links to the same KPI are summed.
    pub fn impact_on(&self, kpi_id: &str) -> f64 {
        self.impacts
            .iter()
            .filter(|i| i.kpi_id == kpi_id && i.impact_score.is_finite())
            .map(|i| i.impact_score)
            .sum()
    }

    /// Sum of absolute impact scores over all linked KPIs
    pub fn total_impact(&self) -> f64 {
        self.impacts
            .iter()
            .filter(|i| i.impact_score.is_finite())
            .map(|i| i.impact_score.abs())
            .sum()
    }
}

/// Lookup of actions by id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionCatalogue {
    actions: std::collections::BTreeMap<String, Action>,
}

impl ActionCatalogue {
    /// Build from a list; later duplicates replace earlier ones
    pub fn from_actions(actions: &[Action]) -> Self {
        Self {
            actions: actions.iter().map(|a| (a.id.clone(), a.clone())).collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Action> {
        self.actions.get(id)
    }
}
