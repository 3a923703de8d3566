//! Formatting-group prompt builders
//!
//! The five groups do not make decisions; they format the analysis layer's
//! locked output into disjoint slices of the final document. Every figure
//! must come from the numerical contract, which the user prompt embeds
//! verbatim under a consistency header.

use crate::phases::PromptPair;
use compframe_contract::GroupId;
use serde_json::Value;

const NUMERICAL_CONSISTENCY_HEADER: &str = "CRITICAL: NUMERICAL CONSISTENCY REQUIREMENT

The numerical_contract below is the SOLE source of truth for all figures.
You MUST:
1. Use ONLY values from the numerical_contract. Do not round, approximate, recalculate, or derive independently.
2. Use \"_display\" formatted versions in prose.
3. Reference roles by their exact role_name from the contract.
4. If you need a number NOT in the contract, derive it explicitly from contract values and show the math.
";

/// What each group produces, for the shared system prompt
fn output_description(group: GroupId) -> &'static str {
    match group {
        GroupId::A => "the \"roles\" object (one entry per comp plan) and \"cost_model\" object",
        GroupId::B => {
            "the \"executive_briefing\", \"benchmarking\" and \"baseline_comparison\" objects"
        }
        GroupId::C => {
            "the operational objects: \"crediting_rules\", \"quota_methodology\", \"governance\", \
             \"payout_mechanics\", \"cross_role_alignment\" and \"spif_suggestions\""
        }
        GroupId::D => {
            "the diagnostic outputs: \"anti_patterns_detected\", \"scenarios\", \
             \"global_warnings\" and \"assumptions\""
        }
        GroupId::E => {
            "the communication outputs: \"plan_name\", \"summary\", \"confidence_level\", \
             \"confidence_note\", \"implementation\", \"transition_plan\" and \"slide_content\""
        }
    }
}

/// Analysis slices each group needs in its user prompt
fn analysis_sections(group: GroupId) -> &'static [&'static str] {
    match group {
        GroupId::A => &["role_analysis"],
        GroupId::B => &["strategic_analysis"],
        GroupId::C => &["operational_analysis"],
        GroupId::D => &["strategic_analysis", "scenarios", "global_warnings", "assumptions"],
        GroupId::E => &["strategic_analysis", "operational_analysis"],
    }
}

/// Prompts for one formatting group.
///
/// `analysis_output` is the merged phase output: the numerical contract plus
/// the strategic and operational analyses.
#[must_use]
pub fn build_group_prompts(group: GroupId, context: &str, analysis_output: &Value) -> PromptPair {
    let system = format!(
        "You are a compensation plan formatting engine, GROUP {group} of a multi-stage pipeline.

The analysis layer (already complete) produced a numerical contract and narrative analysis with \
all decisions locked. Your job is to format that into specific deliverable sections.

You produce: {description}

RULES:
- Use ONLY the numbers from the numerical_contract. Never invent or recalculate figures.
- Write at consulting-grade quality.
- Every claim must be traceable to the analysis or intake data.
- Respond with VALID JSON ONLY. No markdown, no explanation outside JSON.",
        description = output_description(group),
    );

    let contract = analysis_output
        .get("numerical_contract")
        .map(|v| serde_json::to_string_pretty(v).unwrap_or_default())
        .unwrap_or_default();

    let mut sections = String::new();
    for name in analysis_sections(group) {
        if let Some(section) = analysis_output.get(*name) {
            sections.push_str(&format!(
                "\n[{}]\n{}\n",
                name.to_uppercase(),
                serde_json::to_string_pretty(section).unwrap_or_default()
            ));
        }
    }

    let user = format!(
        "{NUMERICAL_CONSISTENCY_HEADER}\n\
[NUMERICAL CONTRACT]\n{contract}\n\
{sections}\n\
[INTAKE CONTEXT]\n{context}\n\n\
Generate {description} using the analysis above. Respond with VALID JSON ONLY.",
        description = output_description(group),
    );

    PromptPair { system, user }
}
