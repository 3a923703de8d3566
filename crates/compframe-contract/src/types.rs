//! Numeric contract data model
//!
//! Defines the authoritative numeric dataset produced by the contract phase:
//! - Per-role compensation records
//! - Accelerator tiers and ramp schedules
//! - Company-level aggregates
//!
//! Generator output is non-deterministic, so every derived field is optional
//! and unknown keys are preserved through a flattened `extra` map. The
//! validator and backfiller are responsible for turning a "compact" contract
//! into a complete one.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Minimum on-target earnings for SDR roles, in currency units.
pub const SDR_OTE_FLOOR: f64 = 70_000.0;

/// The authoritative numeric dataset for one pipeline run.
///
/// Mutated only during the validate/fix/backfill stage; all downstream
/// consumers treat it as read-only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NumericalContract {
    /// Per-role records, ordered, keyed by unique `role_key`
    #[serde(default)]
    pub roles: Vec<ContractRole>,
    /// Aggregate totals derived from `roles`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_level: Option<CompanyLevel>,
    /// Generator fields outside the known schema
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NumericalContract {
    /// Find a role by its key
    #[must_use]
    pub fn role(&self, role_key: &str) -> Option<&ContractRole> {
        self.roles.iter().find(|r| r.role_key == role_key)
    }

    /// Find a role by display name or key
    #[must_use]
    pub fn role_by_name_or_key(&self, reference: &str) -> Option<&ContractRole> {
        self.roles
            .iter()
            .find(|r| r.role_name.as_deref() == Some(reference) || r.role_key == reference)
    }
}

/// One compensation-plan unit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractRole {
    /// Unique key (e.g. `enterprise_ae`)
    pub role_key: String,
    /// Human-readable name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    /// Base role family (`sdr`, `ae`, `am`, `csm`, `se`, `manager`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headcount: Option<f64>,
    /// On-target earnings; must equal `base_salary + target_variable`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ote: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ote_range_low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ote_range_high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_salary: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_variable: Option<f64>,
    /// Base percentage of pay mix; `base_pct + variable_pct` must equal 100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pay_mix_display: Option<String>,
    /// Performance measures; weights must sum to 100
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub measures: Vec<Measure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_quota: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quarterly_quota: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota_display: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota_variable_multiple: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota_methodology: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission_rate_display: Option<String>,
    /// Payout multiplier bands above 100% attainment, ordered by threshold
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accelerator_tiers: Vec<AcceleratorTier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_decelerator: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decelerator_tiers: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cap_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cap_detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ramp_months: Option<u32>,
    /// Month-by-month ramp; synthesized from `ramp_months` when omitted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ramp_schedule: Vec<RampMonth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draw_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_clawback: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clawback_window_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clawback_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payout_frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payout_lag_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spif_eligible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earnings_at_80pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earnings_at_100pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earnings_at_120pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earnings_at_150pct: Option<f64>,
    /// Generator fields outside the known schema
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContractRole {
    /// Display name for findings: role name, falling back to the key
    #[inline]
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.role_name.as_deref().unwrap_or(&self.role_key)
    }

    /// Headcount weight used in aggregate sums; missing or zero counts as 1
    #[inline]
    #[must_use]
    pub fn headcount_weight(&self) -> f64 {
        self.headcount.filter(|h| *h != 0.0).unwrap_or(1.0)
    }

    /// Whether this is an SDR-family role (subject to the OTE floor)
    #[inline]
    #[must_use]
    pub fn is_sdr(&self) -> bool {
        self.base_role.as_deref() == Some("sdr")
    }
}

/// A performance measure with its weight in the plan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Measure {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_display: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement_period: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One attainment band with its payout multiplier
///
/// An open-ended top band has no `max_attainment_pct`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcceleratorTier {
    pub min_attainment_pct: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attainment_pct: Option<f64>,
    pub multiplier: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplier_display: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One month of a new-hire ramp schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RampMonth {
    pub month: u32,
    pub quota_pct: f64,
    pub guarantee_pct: f64,
}

/// Company-level aggregate totals, headcount-weighted across roles
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyLevel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_ote_at_target: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_base_salary: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_variable_at_target: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cost_80pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cost_120pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cost_150pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_headcount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_quota_capacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_revenue: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_of_sales_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_of_sales_display: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiscal_year_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_effective_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_subtotals: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The five formatting groups, each owning a disjoint slice of the final
/// document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GroupId {
    /// Roles & cost model (the primary numeric group)
    A,
    /// Strategy & benchmarking
    B,
    /// Operations
    C,
    /// Diagnostics & scenarios
    D,
    /// Communication & slides
    E,
}

impl GroupId {
    /// All groups in execution order
    pub const ALL: [GroupId; 5] = [GroupId::A, GroupId::B, GroupId::C, GroupId::D, GroupId::E];

    /// Human-readable group name
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            GroupId::A => "Roles & Cost Model",
            GroupId::B => "Strategy & Benchmarking",
            GroupId::C => "Operations",
            GroupId::D => "Diagnostics & Scenarios",
            GroupId::E => "Communication & Slides",
        }
    }

    /// Single-letter identifier
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupId::A => "A",
            GroupId::B => "B",
            GroupId::C => "C",
            GroupId::D => "D",
            GroupId::E => "E",
        }
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headcount_weight_defaults_to_one() {
        let role = ContractRole::default();
        assert_eq!(role.headcount_weight(), 1.0);

        let zeroed = ContractRole {
            headcount: Some(0.0),
            ..ContractRole::default()
        };
        assert_eq!(zeroed.headcount_weight(), 1.0);

        let staffed = ContractRole {
            headcount: Some(4.0),
            ..ContractRole::default()
        };
        assert_eq!(staffed.headcount_weight(), 4.0);
    }

    #[test]
    fn role_lookup_by_name_or_key() {
        let contract = NumericalContract {
            roles: vec![ContractRole {
                role_key: "smb_ae".to_string(),
                role_name: Some("SMB Account Executive".to_string()),
                ..ContractRole::default()
            }],
            ..NumericalContract::default()
        };

        assert!(contract.role_by_name_or_key("smb_ae").is_some());
        assert!(contract.role_by_name_or_key("SMB Account Executive").is_some());
        assert!(contract.role_by_name_or_key("enterprise_ae").is_none());
    }

    #[test]
    fn compact_contract_deserializes() {
        // Compact mode omits display fields, ramp schedules and null fields
        let json = serde_json::json!({
            "roles": [{
                "role_key": "sdr",
                "base_role": "sdr",
                "ote": 75000,
                "base_pct": 65,
                "variable_pct": 35,
                "ramp_months": 2
            }],
            "company_level": { "total_headcount": 6 }
        });

        let contract: NumericalContract = serde_json::from_value(json).unwrap();
        assert_eq!(contract.roles.len(), 1);
        assert!(contract.roles[0].ramp_schedule.is_empty());
        assert!(contract.roles[0].pay_mix_display.is_none());
        assert_eq!(contract.company_level.unwrap().total_headcount, Some(6.0));
    }

    #[test]
    fn unknown_fields_preserved_through_roundtrip() {
        let json = serde_json::json!({
            "roles": [{ "role_key": "ae", "ote": 150000, "territory_notes": "west" }]
        });

        let contract: NumericalContract = serde_json::from_value(json).unwrap();
        assert_eq!(
            contract.roles[0].extra.get("territory_notes"),
            Some(&Value::String("west".to_string()))
        );

        let back = serde_json::to_value(&contract).unwrap();
        assert_eq!(back["roles"][0]["territory_notes"], "west");
    }

    #[test]
    fn group_id_display() {
        assert_eq!(GroupId::A.to_string(), "A");
        assert_eq!(GroupId::E.name(), "Communication & Slides");
    }
}
