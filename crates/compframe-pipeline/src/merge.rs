//! Document merge
//!
//! Assembles the final recommendations document from whichever group
//! fragments survived. Each group owns a disjoint set of output keys, so
//! the merge is commutative over which groups succeeded. Missing groups
//! degrade: the numeric sections are re-derived from the contract, the
//! metadata section falls back to phase 1, and the narrative sections are
//! simply omitted.

use crate::groups::GroupResults;
use compframe_contract::{ContractRole, GroupId, NumericalContract};
use serde_json::{json, Map, Value};

/// Version tag attached to every merged document
pub const PIPELINE_VERSION: u32 = 3;

/// Placeholder for rationale fields in contract-derived fallback content
const FALLBACK_RATIONALE: &str = "See numerical contract.";

/// Output keys each group owns in the final document
fn owned_keys(group: GroupId) -> &'static [&'static str] {
    match group {
        GroupId::A => &["roles", "cost_model"],
        GroupId::B => &["executive_briefing", "benchmarking", "baseline_comparison"],
        GroupId::C => &[
            "crediting_rules",
            "quota_methodology",
            "governance",
            "payout_mechanics",
            "cross_role_alignment",
            "spif_suggestions",
        ],
        GroupId::D => &[
            "anti_patterns_detected",
            "scenarios",
            "global_warnings",
            "assumptions",
        ],
        GroupId::E => &[
            "plan_name",
            "summary",
            "confidence_level",
            "confidence_note",
            "implementation",
            "transition_plan",
            "slide_content",
        ],
    }
}

fn accelerator_fallback(role: &ContractRole) -> Value {
    if role.accelerator_tiers.is_empty() {
        return json!({
            "structure": "No accelerators defined",
            "rationale": FALLBACK_RATIONALE,
        });
    }

    let bands: Vec<String> = role
        .accelerator_tiers
        .iter()
        .map(|tier| match tier.max_attainment_pct {
            Some(max) => format!(
                "{}x from {}% to {}%",
                tier.multiplier, tier.min_attainment_pct, max
            ),
            None => format!("{}x above {}%", tier.multiplier, tier.min_attainment_pct),
        })
        .collect();

    json!({
        "structure": bands.join("; "),
        "above_target_multiplier": role.accelerator_tiers.last().map(|t| t.multiplier),
        "threshold_pct": 100,
        "rationale": FALLBACK_RATIONALE,
    })
}

fn fallback_role(role: &ContractRole) -> Value {
    json!({
        "role_name": role.display_name(),
        "ote": {
            "recommended": role.ote,
            "range_low": role.ote_range_low,
            "range_high": role.ote_range_high,
            "rationale": FALLBACK_RATIONALE,
        },
        "pay_mix": {
            "base_pct": role.base_pct,
            "variable_pct": role.variable_pct,
            "display": role.pay_mix_display,
            "rationale": FALLBACK_RATIONALE,
        },
        "measures": role.measures,
        "quota": {
            "annual": role.annual_quota,
            "display": role.quota_display,
            "methodology": role.quota_methodology,
            "period": role.quota_period,
            "rationale": FALLBACK_RATIONALE,
        },
        "accelerators": accelerator_fallback(role),
        "ramp": {
            "months": role.ramp_months,
            "schedule": role.ramp_schedule,
            "rationale": FALLBACK_RATIONALE,
        },
        "cap_policy": role.cap_policy,
        "clawback": {
            "enabled": role.has_clawback,
            "window_days": role.clawback_window_days,
            "type": role.clawback_type,
        },
        "decelerators": {
            "enabled": role.has_decelerator,
            "tiers": role.decelerator_tiers,
        },
        "payout_frequency": role.payout_frequency,
    })
}

/// Minimal roles object derived purely from the contract
fn fallback_roles(contract: &NumericalContract) -> Value {
    let mut roles = Map::new();
    for role in &contract.roles {
        roles.insert(role.role_key.clone(), fallback_role(role));
    }
    Value::Object(roles)
}

/// Minimal cost model derived purely from the contract
fn fallback_cost_model(contract: &NumericalContract) -> Value {
    let company = contract.company_level.clone().unwrap_or_default();
    let headcount = company.total_headcount.unwrap_or(0.0);
    json!({
        "total_ote_at_target": company.total_ote_at_target,
        "base_salary_total": company.total_base_salary,
        "variable_at_target_total": company.total_variable_at_target,
        "total_cost_80pct": company.total_cost_80pct,
        "total_cost_120pct": company.total_cost_120pct,
        "total_cost_150pct": company.total_cost_150pct,
        "cost_of_sales": company.cost_of_sales_display,
        "headcount_summary": format!("{headcount} total positions"),
        "rationale": FALLBACK_RATIONALE,
    })
}

/// Merge the surviving group fragments into the final document.
///
/// `phase1_output` supplies the metadata fallback and the top-level hoists;
/// the contract supplies the numeric fallback and the reserved
/// `_numerical_contract` key.
#[must_use]
pub fn merge_document(
    phase1_output: &Value,
    contract: &NumericalContract,
    groups: &GroupResults,
) -> Value {
    let mut doc = Map::new();

    for group in GroupId::ALL {
        let Some(fragment) = groups.outputs.get(&group).and_then(Value::as_object) else {
            continue;
        };
        for key in owned_keys(group) {
            if let Some(value) = fragment.get(*key) {
                doc.insert((*key).to_string(), value.clone());
            }
        }
    }

    // Numeric sections always exist, even with zero surviving groups
    if !doc.contains_key("roles") {
        tracing::warn!("roles group missing; deriving roles from contract");
        doc.insert("roles".to_string(), fallback_roles(contract));
    }
    if !doc.contains_key("cost_model") {
        doc.insert("cost_model".to_string(), fallback_cost_model(contract));
    }

    // Metadata falls back to phase 1, then to fixed defaults
    let strategic = phase1_output.get("strategic_analysis");
    if !doc.contains_key("plan_name") {
        let plan_name = strategic
            .and_then(|s| s.get("plan_name"))
            .and_then(Value::as_str)
            .unwrap_or("Compensation Plan");
        doc.insert("plan_name".to_string(), Value::from(plan_name));
    }
    if !doc.contains_key("summary") {
        if let Some(summary) = strategic.and_then(|s| s.get("summary")) {
            doc.insert("summary".to_string(), summary.clone());
        }
    }
    if !doc.contains_key("confidence_level") {
        let confidence = strategic
            .and_then(|s| s.get("confidence_level"))
            .and_then(Value::as_str)
            .unwrap_or("Medium");
        doc.insert("confidence_level".to_string(), Value::from(confidence));
    }
    if !doc.contains_key("confidence_note") {
        if let Some(note) = strategic.and_then(|s| s.get("confidence_note")) {
            doc.insert("confidence_note".to_string(), note.clone());
        }
    }

    // Convenience hoists
    if !doc.contains_key("comp_philosophy") {
        let philosophy = groups
            .outputs
            .get(&GroupId::E)
            .and_then(|e| e.get("comp_philosophy"))
            .or_else(|| strategic.and_then(|s| s.get("comp_philosophy")));
        if let Some(philosophy) = philosophy {
            doc.insert("comp_philosophy".to_string(), philosophy.clone());
        }
    }
    if let Some(readiness) = strategic.and_then(|s| s.get("readiness_assessment")) {
        doc.entry("readiness_assessment".to_string())
            .or_insert_with(|| readiness.clone());
    }

    // Bookkeeping
    doc.insert(
        "_numerical_contract".to_string(),
        serde_json::to_value(contract).unwrap_or_default(),
    );
    doc.insert("_pipeline_version".to_string(), json!(PIPELINE_VERSION));
    let completed: Vec<&str> = groups.outputs.keys().map(GroupId::as_str).collect();
    let failed: Vec<&str> = groups.failed.iter().map(GroupId::as_str).collect();
    doc.insert("_groups_completed".to_string(), json!(completed));
    doc.insert("_groups_failed".to_string(), json!(failed));

    Value::Object(doc)
}
