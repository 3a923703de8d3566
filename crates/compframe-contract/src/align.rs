//! Group output validation and force-alignment
//!
//! Formatting groups restate contract numbers in prose-heavy fragments, and
//! a non-deterministic generator sometimes drifts from the contract. This
//! module checks each fragment for field-level agreement and, for the
//! primary roles group, overwrites disagreeing numbers with
//! contract-authoritative values. Numbers only; prose is never touched.

use crate::findings::Severity;
use crate::types::{GroupId, NumericalContract};
use serde_json::{Map, Value};

/// Tolerance for a group's restated OTE, in currency units
const OTE_TOLERANCE: f64 = 1.0;
/// Tolerance for a group's restated base percentage, in points
const PAY_MIX_POINT_TOLERANCE: f64 = 1.0;
/// Tolerance for a group's restated company OTE total
const COMPANY_TOTAL_TOLERANCE: f64 = 100.0;

/// One disagreement between a group fragment and the contract
#[derive(Debug, Clone)]
pub struct GroupFinding {
    pub group: GroupId,
    pub severity: Severity,
    pub message: String,
    /// Dotted field path within the fragment, when field-specific
    pub field: Option<String>,
    /// Role key, when role-specific
    pub role: Option<String>,
    pub expected: Option<f64>,
    pub actual: Option<f64>,
}

impl GroupFinding {
    fn critical(group: GroupId, message: impl Into<String>) -> Self {
        Self {
            group,
            severity: Severity::Critical,
            message: message.into(),
            field: None,
            role: None,
            expected: None,
            actual: None,
        }
    }

    fn warning(group: GroupId, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::critical(group, message)
        }
    }

    fn mismatch(
        group: GroupId,
        role: Option<&str>,
        field: &str,
        expected: f64,
        actual: f64,
    ) -> Self {
        let context = role.map(|r| format!(" for role \"{r}\"")).unwrap_or_default();
        Self {
            group,
            severity: Severity::Critical,
            message: format!("{field}{context} is {actual}, contract says {expected}"),
            field: Some(field.to_string()),
            role: role.map(str::to_string),
            expected: Some(expected),
            actual: Some(actual),
        }
    }
}

/// Result of validating one group fragment against the contract
#[derive(Debug, Clone, Default)]
pub struct GroupValidation {
    /// True iff there are zero critical findings
    pub valid: bool,
    pub errors: Vec<GroupFinding>,
}

impl GroupValidation {
    fn from_findings(errors: Vec<GroupFinding>) -> Self {
        let valid = !errors.iter().any(|f| f.severity == Severity::Critical);
        Self { valid, errors }
    }
}

fn num_at<'v>(value: &'v Value, path: &[&str]) -> Option<f64> {
    let mut current = value;
    for segment in path {
        current = current.get(segment)?;
    }
    current.as_f64().filter(|n| *n != 0.0)
}

/// Validate a group fragment against the numeric contract.
///
/// The roles group gets full field-level checks; the slides group gets
/// role-reference checks; other groups only need to be present objects.
#[must_use]
pub fn validate_group_output(
    group: GroupId,
    output: &Value,
    contract: &NumericalContract,
) -> GroupValidation {
    let Some(fragment) = output.as_object() else {
        return GroupValidation::from_findings(vec![GroupFinding::critical(
            group,
            "Group output is null or not an object",
        )]);
    };

    let mut errors = Vec::new();

    if group == GroupId::A {
        if let Some(roles) = fragment.get("roles").and_then(Value::as_object) {
            for (role_key, role_data) in roles {
                let Some(contract_role) = contract.role(role_key) else {
                    errors.push(GroupFinding::warning(
                        group,
                        format!("Role \"{role_key}\" in output not found in numerical contract"),
                    ));
                    continue;
                };

                if let (Some(actual), Some(expected)) = (
                    num_at(role_data, &["ote", "recommended"]),
                    contract_role.ote.filter(|o| *o != 0.0),
                ) {
                    if (actual - expected).abs() > OTE_TOLERANCE {
                        errors.push(GroupFinding::mismatch(
                            group,
                            Some(role_key),
                            "ote.recommended",
                            expected,
                            actual,
                        ));
                    }
                }

                if let (Some(actual), Some(expected)) = (
                    role_data
                        .get("pay_mix")
                        .and_then(|m| m.get("base_pct"))
                        .and_then(Value::as_f64),
                    contract_role.base_pct,
                ) {
                    if (actual - expected).abs() > PAY_MIX_POINT_TOLERANCE {
                        errors.push(GroupFinding::mismatch(
                            group,
                            Some(role_key),
                            "pay_mix.base_pct",
                            expected,
                            actual,
                        ));
                    }
                }
            }

            // Every contract role must appear in the fragment
            for contract_role in &contract.roles {
                if !roles.contains_key(&contract_role.role_key) {
                    errors.push(GroupFinding::critical(
                        group,
                        format!(
                            "Contract role \"{}\" missing from roles group output",
                            contract_role.role_key
                        ),
                    ));
                }
            }
        }

        if let (Some(cost_model), Some(company)) =
            (fragment.get("cost_model"), contract.company_level.as_ref())
        {
            if let (Some(actual), Some(expected)) = (
                num_at(cost_model, &["total_ote_at_target"]),
                company.total_ote_at_target.filter(|t| *t != 0.0),
            ) {
                if (actual - expected).abs() > COMPANY_TOTAL_TOLERANCE {
                    errors.push(GroupFinding::mismatch(
                        group,
                        None,
                        "cost_model.total_ote_at_target",
                        expected,
                        actual,
                    ));
                }
            }
        }
    }

    if group == GroupId::E {
        if let Some(appendix) = fragment
            .get("slide_content")
            .and_then(|s| s.get("appendix_attainment"))
            .and_then(Value::as_array)
        {
            for entry in appendix {
                if let Some(reference) = entry.get("role").and_then(Value::as_str) {
                    if contract.role_by_name_or_key(reference).is_none() {
                        errors.push(GroupFinding::warning(
                            group,
                            format!("Slide attainment role \"{reference}\" not found in contract"),
                        ));
                    }
                }
            }
        }
    }

    GroupValidation::from_findings(errors)
}

fn set_or_remove(object: &mut Map<String, Value>, key: &str, value: Option<f64>) {
    match value {
        Some(v) => {
            object.insert(key.to_string(), Value::from(v));
        }
        None => {
            object.remove(key);
        }
    }
}

/// Overwrite a roles-group fragment's numeric fields with contract values.
///
/// Applied only when validation of the primary roles group fails. For every
/// contract role present in the fragment, the OTE value and range, pay-mix
/// percentages, role display name and payout frequency are replaced
/// verbatim; the cost model gets the contract's company-level totals.
/// Rationale text and measure descriptions are left untouched.
#[must_use]
pub fn force_align_roles_group(output: &Value, contract: &NumericalContract) -> Value {
    let mut aligned = output.clone();

    let Some(roles) = aligned.get_mut("roles").and_then(Value::as_object_mut) else {
        return aligned;
    };

    for contract_role in &contract.roles {
        let Some(role) = roles
            .get_mut(&contract_role.role_key)
            .and_then(Value::as_object_mut)
        else {
            continue;
        };

        if let Some(ote) = role.get_mut("ote").and_then(Value::as_object_mut) {
            set_or_remove(ote, "recommended", contract_role.ote);
            set_or_remove(ote, "range_low", contract_role.ote_range_low);
            set_or_remove(ote, "range_high", contract_role.ote_range_high);
        }

        if let Some(pay_mix) = role.get_mut("pay_mix").and_then(Value::as_object_mut) {
            set_or_remove(pay_mix, "base_pct", contract_role.base_pct);
            set_or_remove(pay_mix, "variable_pct", contract_role.variable_pct);
        }

        if let Some(name) = &contract_role.role_name {
            role.insert("role_name".to_string(), Value::from(name.clone()));
        }
        if let Some(frequency) = &contract_role.payout_frequency {
            role.insert("payout_frequency".to_string(), Value::from(frequency.clone()));
        }
    }

    if let (Some(cost_model), Some(company)) = (
        aligned.get_mut("cost_model").and_then(Value::as_object_mut),
        contract.company_level.as_ref(),
    ) {
        set_or_remove(cost_model, "total_ote_at_target", company.total_ote_at_target);
        set_or_remove(cost_model, "total_cost_80pct", company.total_cost_80pct);
        set_or_remove(cost_model, "total_cost_120pct", company.total_cost_120pct);
        set_or_remove(cost_model, "total_cost_150pct", company.total_cost_150pct);
        set_or_remove(cost_model, "base_salary_total", company.total_base_salary);
        set_or_remove(
            cost_model,
            "variable_at_target_total",
            company.total_variable_at_target,
        );
    }

    aligned
}
