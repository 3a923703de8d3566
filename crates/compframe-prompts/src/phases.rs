//! Analysis-phase prompt builders
//!
//! Pure functions producing the system/user prompt pair for each of the
//! three sequential analysis phases. Phase 1 decides strategy without
//! numbers, phase 2 locks every number into the contract, phase 3 explains
//! and operationalizes what the first two decided.

use crate::context::WorkloadMetadata;
use serde_json::Value;

/// Plan counts above this trigger compact contract output
pub const COMPACT_MODE_THRESHOLD: u32 = 6;

/// A system/user prompt pair
#[derive(Debug, Clone)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

/// Prompts for phase 1: strategic foundation, qualitative decisions only
#[must_use]
pub fn build_phase1_prompts(context: &str, metadata: &WorkloadMetadata) -> PromptPair {
    let system = "You are a compensation plan strategist. This is PHASE 1 of a 3-phase \
analysis pipeline: make every qualitative design decision before any number exists.

Assess organizational readiness, pick stage-appropriate defaults, diagnose any baseline plan, \
detect anti-patterns, and define the role architecture with strategic direction for each role.

Respond with VALID JSON ONLY, shaped as:
{
  \"strategic_analysis\": {
    \"plan_name\": \"...\", \"summary\": \"...\",
    \"confidence_level\": \"High|Medium|Low\", \"confidence_note\": \"...\",
    \"comp_philosophy\": \"...\", \"key_design_decisions\": [],
    \"anti_patterns_detected\": [],
    \"readiness_assessment\": { \"score\": 0, \"level\": \"High|Medium|Low\", \"flags\": [] }
  },
  \"role_architecture\": {
    \"roles\": [{
      \"role_key\": \"...\", \"role_name\": \"...\",
      \"segment\": null, \"variant\": null, \"base_role\": \"sdr|ae|am|csm|se|manager\",
      \"headcount\": 0, \"pay_mix_direction\": \"...\", \"measure_strategy\": \"...\",
      \"quota_approach\": \"...\", \"accelerator_approach\": \"...\", \"ramp_approach\": \"...\",
      \"cap_approach\": \"...\", \"clawback_approach\": \"...\", \"payout_approach\": \"...\"
    }],
    \"cross_role_notes\": {}
  }
}

Do NOT include OTE or quota amounts; those come in phase 2. Be definitive; no hedging."
        .to_string();

    let multi_note = if metadata.is_multi_segment || metadata.has_variants {
        format!(
            "\n\nThis organization requires {} distinct comp plans ({}{}{}). Create a separate \
role_architecture entry for EACH combination.",
            metadata.plan_count,
            if metadata.is_multi_segment { "multi-segment" } else { "" },
            if metadata.is_multi_segment && metadata.has_variants { " + " } else { "" },
            if metadata.has_variants { "role variants" } else { "" },
        )
    } else {
        String::new()
    };

    let user = format!(
        "Analyze this company's compensation needs and produce the STRATEGIC FOUNDATION.\n\n\
{context}{multi_note}\n\nRespond with VALID JSON ONLY."
    );

    PromptPair { system, user }
}

/// Prompts for phase 2: the numeric contract, every value locked
#[must_use]
pub fn build_phase2_prompts(
    context: &str,
    phase1_output: &Value,
    metadata: &WorkloadMetadata,
) -> PromptPair {
    let system = "You are a compensation numerical engine. This is PHASE 2 of a 3-phase \
analysis pipeline. Phase 1 already made all strategic decisions; your ONLY job is to lock every \
numerical value into the numerical_contract. You do NOT make strategic decisions.

Rules: pay mix percentages sum to 100. base_salary + target_variable = OTE exactly. Measure \
weights sum to 100 per role. Earnings at 100% = OTE. SDR OTE floor is $70K. Quota:variable \
multiple 3.5-5x for AEs. For tiered accelerators, earnings above target use the weighted rate \
across tiers. Company totals = sum of role values x headcount.

Respond with VALID JSON ONLY, shaped as:
{
  \"numerical_contract\": {
    \"roles\": [{
      \"role_key\": \"...\", \"role_name\": \"...\", \"base_role\": \"...\", \"headcount\": 0,
      \"ote\": 0, \"ote_range_low\": 0, \"ote_range_high\": 0,
      \"base_salary\": 0, \"target_variable\": 0, \"base_pct\": 50, \"variable_pct\": 50,
      \"measures\": [{ \"name\": \"...\", \"weight_pct\": 100, \"measurement_period\": \"quarterly\" }],
      \"annual_quota\": null, \"quota_methodology\": \"...\", \"quota_period\": \"...\",
      \"accelerator_tiers\": [{ \"min_attainment_pct\": 100, \"max_attainment_pct\": 120, \"multiplier\": 1.25 }],
      \"cap_policy\": \"uncapped\", \"ramp_months\": 3,
      \"ramp_schedule\": [{ \"month\": 1, \"quota_pct\": 33, \"guarantee_pct\": 100 }],
      \"payout_frequency\": \"monthly\",
      \"earnings_at_80pct\": 0, \"earnings_at_100pct\": 0,
      \"earnings_at_120pct\": 0, \"earnings_at_150pct\": 0
    }],
    \"company_level\": {
      \"total_ote_at_target\": 0, \"total_base_salary\": 0, \"total_variable_at_target\": 0,
      \"total_cost_80pct\": 0, \"total_cost_120pct\": 0, \"total_cost_150pct\": 0,
      \"total_headcount\": 0
    }
  }
}"
    .to_string();

    let role_architecture = phase1_output
        .get("role_architecture")
        .map(|v| serde_json::to_string_pretty(v).unwrap_or_default())
        .unwrap_or_default();

    let compact_note = if metadata.plan_count > COMPACT_MODE_THRESHOLD {
        format!(
            "\n\nCOMPACT OUTPUT MODE ({} plans detected):\n\
To fit all plans within output limits:\n\
- OMIT all _display fields. Derived client-side.\n\
- OMIT ramp_schedule arrays. Just provide ramp_months and draw_type.\n\
- OMIT fields that are null or false entirely.\n\
This is critical: with {} plans, be token-efficient or output will be truncated.",
            metadata.plan_count, metadata.plan_count
        )
    } else {
        String::new()
    };

    let user = format!(
        "Produce the COMPLETE numerical contract for this company.\n\n\
[ROLE ARCHITECTURE FROM PHASE 1]\n{role_architecture}\n\n\
[INTAKE CONTEXT]\n{context}{compact_note}\n\n\
Every number is FINAL. Respond with VALID JSON ONLY."
    );

    PromptPair { system, user }
}

/// Prompts for phase 3: rationale and operational design
#[must_use]
pub fn build_phase3_prompts(
    context: &str,
    phase1_output: &Value,
    phase2_output: &Value,
    _metadata: &WorkloadMetadata,
) -> PromptPair {
    let system = "You are a compensation plan analyst. This is PHASE 3 of a 3-phase analysis \
pipeline. All strategic decisions and numbers are already locked. Your job:
1. Explain WHY each number was chosen (role-by-role rationale)
2. Design operational processes (crediting, quota setting, governance, payout, transition)
3. Model what-if scenarios with concrete numeric adjustments
4. Document warnings and assumptions

Respond with VALID JSON ONLY, shaped as:
{
  \"role_analysis\": { \"ROLE_KEY\": { \"ote_rationale\": \"...\", \"pay_mix_rationale\": \"...\",
    \"measure_rationale\": \"...\", \"quota_rationale\": \"...\", \"accelerator_rationale\": \"...\",
    \"ramp_rationale\": \"...\" } },
  \"operational_analysis\": { \"crediting_rules\": {}, \"quota_methodology\": {}, \"governance\": {},
    \"payout_mechanics\": {}, \"cross_role_alignment\": {}, \"implementation\": {},
    \"transition_plan\": {}, \"spif_suggestions\": [] },
  \"scenarios\": [], \"global_warnings\": [], \"assumptions\": []
}"
    .to_string();

    let strategy = phase1_output
        .get("strategic_analysis")
        .map(|v| serde_json::to_string_pretty(v).unwrap_or_default())
        .unwrap_or_default();
    let contract = phase2_output
        .get("numerical_contract")
        .map(|v| serde_json::to_string_pretty(v).unwrap_or_default())
        .unwrap_or_default();

    let user = format!(
        "Produce the rationale and operational design for this plan.\n\n\
[STRATEGIC ANALYSIS FROM PHASE 1]\n{strategy}\n\n\
[NUMERICAL CONTRACT FROM PHASE 2]\n{contract}\n\n\
[INTAKE CONTEXT]\n{context}\n\nRespond with VALID JSON ONLY."
    );

    PromptPair { system, user }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata(plan_count: u32) -> WorkloadMetadata {
        WorkloadMetadata {
            plan_count,
            is_multi_segment: false,
            has_variants: false,
        }
    }

    #[test]
    fn phase1_omits_multi_note_for_single_plan() {
        let prompts = build_phase1_prompts("intake", &metadata(1));
        assert!(prompts.system.contains("PHASE 1"));
        assert!(!prompts.user.contains("distinct comp plans"));
    }

    #[test]
    fn phase1_notes_multi_segment_workloads() {
        let meta = WorkloadMetadata {
            plan_count: 4,
            is_multi_segment: true,
            has_variants: true,
        };
        let prompts = build_phase1_prompts("intake", &meta);
        assert!(prompts.user.contains("4 distinct comp plans"));
        assert!(prompts.user.contains("multi-segment + role variants"));
    }

    #[test]
    fn phase2_includes_role_architecture() {
        let phase1 = json!({ "role_architecture": { "roles": [{ "role_key": "ae" }] } });
        let prompts = build_phase2_prompts("intake", &phase1, &metadata(2));
        assert!(prompts.system.contains("PHASE 2"));
        assert!(prompts.user.contains("\"role_key\": \"ae\""));
        assert!(!prompts.user.contains("COMPACT OUTPUT MODE"));
    }

    #[test]
    fn phase2_compact_mode_above_threshold() {
        let prompts = build_phase2_prompts("intake", &json!({}), &metadata(8));
        assert!(prompts.user.contains("COMPACT OUTPUT MODE (8 plans detected)"));
    }

    #[test]
    fn phase3_embeds_both_prior_phases() {
        let phase1 = json!({ "strategic_analysis": { "plan_name": "Growth Plan" } });
        let phase2 = json!({ "numerical_contract": { "roles": [] } });
        let prompts = build_phase3_prompts("intake", &phase1, &phase2, &metadata(1));
        assert!(prompts.system.contains("PHASE 3"));
        assert!(prompts.user.contains("Growth Plan"));
        assert!(prompts.user.contains("[NUMERICAL CONTRACT FROM PHASE 2]"));
    }
}
