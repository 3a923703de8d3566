//! Contract validator
//!
//! Checks the numeric contract for internal arithmetic consistency and
//! returns typed findings without mutating the input. Criticals carry a
//! repair payload where the correction is mechanical.

use crate::findings::{ContractValidation, Finding};
use crate::types::{NumericalContract, SDR_OTE_FLOOR};
use std::collections::HashSet;

/// Tolerance for `base_salary + target_variable == ote`, in currency units
pub const OTE_SUM_TOLERANCE: f64 = 1.0;
/// Tolerance for `base_pct + variable_pct == 100`, in points
pub const PAY_MIX_TOLERANCE: f64 = 0.5;
/// Tolerance for measure weights summing to 100, in points
pub const MEASURE_WEIGHT_TOLERANCE: f64 = 1.0;
/// Tolerance for company-level totals, in currency units
pub const COMPANY_TOTAL_TOLERANCE: f64 = 100.0;

/// Generator zeros and omissions are treated alike for currency fields
#[inline]
fn nonzero(v: Option<f64>) -> Option<f64> {
    v.filter(|x| *x != 0.0)
}

/// Validate a numeric contract for internal consistency.
///
/// Pure function: the contract is not mutated. `valid` is true iff there
/// are zero critical findings; warnings never affect validity.
#[must_use]
pub fn validate_contract(contract: &NumericalContract) -> ContractValidation {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if contract.roles.is_empty() {
        errors.push(Finding::critical("roles", "Numerical contract has no roles"));
        return ContractValidation::from_findings(errors, warnings);
    }

    let mut seen_keys: HashSet<&str> = HashSet::new();
    let mut calculated_total_ote = 0.0;
    let mut calculated_total_base = 0.0;
    let mut calculated_total_variable = 0.0;

    for role in &contract.roles {
        let prefix = format!("Role \"{}\"", role.display_name());

        if !seen_keys.insert(role.role_key.as_str()) {
            warnings.push(Finding::warning(
                format!("{}.role_key", role.role_key),
                format!("{prefix}: duplicate role_key in contract"),
            ));
        }

        // OTE = base + variable
        if let (Some(ote), Some(base), Some(variable)) = (
            nonzero(role.ote),
            nonzero(role.base_salary),
            nonzero(role.target_variable),
        ) {
            let sum = base + variable;
            if (sum - ote).abs() > OTE_SUM_TOLERANCE {
                let mut finding = Finding::critical(
                    format!("{}.ote", role.role_key),
                    format!(
                        "{prefix}: base_salary (${base}) + target_variable (${variable}) = ${sum}, but OTE is ${ote}"
                    ),
                );
                if let (Some(base_pct), Some(variable_pct)) = (role.base_pct, role.variable_pct) {
                    finding = finding.with_fix([
                        ("base_salary", (ote * base_pct / 100.0).round()),
                        ("target_variable", (ote * variable_pct / 100.0).round()),
                    ]);
                }
                errors.push(finding);
            }
        }

        // Pay mix sums to 100
        if let (Some(base_pct), Some(variable_pct)) = (role.base_pct, role.variable_pct) {
            let mix_sum = base_pct + variable_pct;
            if (mix_sum - 100.0).abs() > PAY_MIX_TOLERANCE {
                errors.push(Finding::critical(
                    format!("{}.pay_mix", role.role_key),
                    format!(
                        "{prefix}: base_pct ({base_pct}) + variable_pct ({variable_pct}) = {mix_sum}, should be 100"
                    ),
                ));
            }
        }

        // Measure weights sum to 100
        if !role.measures.is_empty() {
            let weight_sum: f64 = role
                .measures
                .iter()
                .map(|m| m.weight_pct.unwrap_or(0.0))
                .sum();
            if (weight_sum - 100.0).abs() > MEASURE_WEIGHT_TOLERANCE {
                errors.push(Finding::critical(
                    format!("{}.measures", role.role_key),
                    format!("{prefix}: measure weights sum to {weight_sum}, should be 100"),
                ));
            }
        }

        // Earnings at 100% = OTE
        if let (Some(at_100), Some(ote)) = (nonzero(role.earnings_at_100pct), nonzero(role.ote)) {
            if (at_100 - ote).abs() > OTE_SUM_TOLERANCE {
                errors.push(
                    Finding::critical(
                        format!("{}.earnings_at_100pct", role.role_key),
                        format!(
                            "{prefix}: earnings_at_100pct (${at_100}) should equal OTE (${ote})"
                        ),
                    )
                    .with_fix([("earnings_at_100pct", ote)]),
                );
            }
        }

        // Earnings at 80% should be less than OTE
        if let (Some(at_80), Some(ote)) = (nonzero(role.earnings_at_80pct), nonzero(role.ote)) {
            if at_80 >= ote {
                warnings.push(Finding::warning(
                    format!("{}.earnings_at_80pct", role.role_key),
                    format!(
                        "{prefix}: earnings at 80% (${at_80}) should be less than OTE (${ote})"
                    ),
                ));
            }
        }

        // Earnings progression should be monotonic
        if let (Some(at_80), Some(at_100), Some(at_120), Some(at_150)) = (
            nonzero(role.earnings_at_80pct),
            nonzero(role.earnings_at_100pct),
            nonzero(role.earnings_at_120pct),
            nonzero(role.earnings_at_150pct),
        ) {
            if at_80 > at_100 || at_100 > at_120 || at_120 > at_150 {
                warnings.push(Finding::warning(
                    format!("{}.earnings", role.role_key),
                    format!("{prefix}: earnings progression is not monotonically increasing"),
                ));
            }
        }

        // Quota:variable multiple sanity band
        if let (Some(quota), Some(variable)) = (nonzero(role.annual_quota), role.target_variable) {
            if variable > 0.0 {
                let multiple = quota / variable;
                if !(3.0..=7.0).contains(&multiple) {
                    warnings.push(Finding::warning(
                        format!("{}.quota_multiple", role.role_key),
                        format!(
                            "{prefix}: quota:variable multiple is {multiple:.1}x (typical range: 3.5-5x)"
                        ),
                    ));
                }
            }
        }

        // SDR OTE floor
        if role.is_sdr() {
            if let Some(ote) = nonzero(role.ote) {
                if ote < SDR_OTE_FLOOR {
                    errors.push(
                        Finding::critical(
                            format!("{}.ote", role.role_key),
                            format!("{prefix}: SDR OTE (${ote}) is below $70K minimum floor"),
                        )
                        .with_fix([("ote", SDR_OTE_FLOOR)]),
                    );
                }
            }
        }

        // Headcount must be positive
        if let Some(headcount) = role.headcount {
            if headcount <= 0.0 {
                warnings.push(Finding::warning(
                    format!("{}.headcount", role.role_key),
                    format!("{prefix}: headcount is {headcount}, should be positive"),
                ));
            }
        }

        let weight = role.headcount_weight();
        calculated_total_ote += role.ote.unwrap_or(0.0) * weight;
        calculated_total_base += role.base_salary.unwrap_or(0.0) * weight;
        calculated_total_variable += role.target_variable.unwrap_or(0.0) * weight;
    }

    // Company-level totals must match the headcount-weighted sums
    if let Some(company) = &contract.company_level {
        if let Some(total_ote) = nonzero(company.total_ote_at_target) {
            if (total_ote - calculated_total_ote).abs() > COMPANY_TOTAL_TOLERANCE {
                errors.push(
                    Finding::critical(
                        "company_level.total_ote_at_target",
                        format!(
                            "Company total OTE (${total_ote}) doesn't match sum of role OTEs (${calculated_total_ote})"
                        ),
                    )
                    .with_fix([("total_ote_at_target", calculated_total_ote)]),
                );
            }
        }

        if let Some(total_base) = nonzero(company.total_base_salary) {
            if (total_base - calculated_total_base).abs() > COMPANY_TOTAL_TOLERANCE {
                errors.push(
                    Finding::critical(
                        "company_level.total_base_salary",
                        format!(
                            "Company total base (${total_base}) doesn't match sum of role bases (${calculated_total_base})"
                        ),
                    )
                    .with_fix([("total_base_salary", calculated_total_base)]),
                );
            }
        }

        if let Some(total_variable) = nonzero(company.total_variable_at_target) {
            if (total_variable - calculated_total_variable).abs() > COMPANY_TOTAL_TOLERANCE {
                errors.push(
                    Finding::critical(
                        "company_level.total_variable_at_target",
                        format!(
                            "Company total variable (${total_variable}) doesn't match sum of role variables (${calculated_total_variable})"
                        ),
                    )
                    .with_fix([("total_variable_at_target", calculated_total_variable)]),
                );
            }
        }
    }

    ContractValidation::from_findings(errors, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContractRole, CompanyLevel, Measure};

    fn role(key: &str) -> ContractRole {
        ContractRole {
            role_key: key.to_string(),
            role_name: Some(key.to_uppercase()),
            ote: Some(150_000.0),
            base_salary: Some(75_000.0),
            target_variable: Some(75_000.0),
            base_pct: Some(50.0),
            variable_pct: Some(50.0),
            headcount: Some(2.0),
            earnings_at_100pct: Some(150_000.0),
            ..ContractRole::default()
        }
    }

    #[test]
    fn empty_contract_is_invalid() {
        let validation = validate_contract(&NumericalContract::default());
        assert!(!validation.valid);
        assert_eq!(validation.errors.len(), 1);
        assert_eq!(validation.errors[0].field, "roles");
    }

    #[test]
    fn consistent_role_passes() {
        let contract = NumericalContract {
            roles: vec![role("ae")],
            ..NumericalContract::default()
        };
        let validation = validate_contract(&contract);
        assert!(validation.valid, "errors: {:?}", validation.error_messages());
    }

    #[test]
    fn ote_sum_mismatch_is_critical_with_fix() {
        let mut bad = role("ae");
        bad.base_salary = Some(80_000.0);
        // 80k + 75k = 155k != 150k
        let contract = NumericalContract {
            roles: vec![bad],
            ..NumericalContract::default()
        };

        let validation = validate_contract(&contract);
        assert!(!validation.valid);
        let finding = &validation.errors[0];
        assert_eq!(finding.field, "ae.ote");
        let fix = finding.fix.as_ref().unwrap();
        assert_eq!(fix["base_salary"], 75_000.0);
    }

    #[test]
    fn pay_mix_must_sum_to_100() {
        let mut bad = role("ae");
        bad.base_pct = Some(55.0);
        // 55 + 50 = 105
        let contract = NumericalContract {
            roles: vec![bad],
            ..NumericalContract::default()
        };

        let validation = validate_contract(&contract);
        assert!(validation
            .errors
            .iter()
            .any(|f| f.field == "ae.pay_mix"));
    }

    #[test]
    fn measure_weights_checked_within_tolerance() {
        let mut r = role("ae");
        r.measures = vec![
            Measure {
                name: "ARR".to_string(),
                weight_pct: Some(70.0),
                ..Measure::default()
            },
            Measure {
                name: "Pipeline".to_string(),
                weight_pct: Some(29.5),
                ..Measure::default()
            },
        ];
        // 99.5 is within the 1-point tolerance
        let contract = NumericalContract {
            roles: vec![r.clone()],
            ..NumericalContract::default()
        };
        assert!(validate_contract(&contract).valid);

        r.measures[1].weight_pct = Some(20.0);
        let contract = NumericalContract {
            roles: vec![r],
            ..NumericalContract::default()
        };
        let validation = validate_contract(&contract);
        assert!(validation.errors.iter().any(|f| f.field == "ae.measures"));
    }

    #[test]
    fn sdr_floor_violation_is_critical() {
        let mut sdr = role("sdr");
        sdr.base_role = Some("sdr".to_string());
        sdr.ote = Some(60_000.0);
        sdr.base_salary = Some(30_000.0);
        sdr.target_variable = Some(30_000.0);
        sdr.earnings_at_100pct = Some(60_000.0);

        let contract = NumericalContract {
            roles: vec![sdr],
            ..NumericalContract::default()
        };
        let validation = validate_contract(&contract);
        assert!(!validation.valid);
        let floor = validation
            .errors
            .iter()
            .find(|f| f.field == "sdr.ote")
            .unwrap();
        assert_eq!(floor.fix.as_ref().unwrap()["ote"], 70_000.0);
    }

    #[test]
    fn quota_multiple_outside_band_warns() {
        let mut r = role("ae");
        r.annual_quota = Some(900_000.0);
        // 900k / 75k = 12x, outside [3, 7]
        let contract = NumericalContract {
            roles: vec![r],
            ..NumericalContract::default()
        };
        let validation = validate_contract(&contract);
        assert!(validation.valid);
        let warning = validation
            .warnings
            .iter()
            .find(|f| f.field == "ae.quota_multiple")
            .unwrap();
        assert!(warning.message.contains("12.0x"));
        assert!(warning.message.contains("3.5-5x"));
    }

    #[test]
    fn nonpositive_headcount_warns_only() {
        let mut r = role("ae");
        r.headcount = Some(-1.0);
        let contract = NumericalContract {
            roles: vec![r],
            ..NumericalContract::default()
        };
        let validation = validate_contract(&contract);
        assert!(validation.valid);
        assert!(validation
            .warnings
            .iter()
            .any(|f| f.field == "ae.headcount"));
    }

    #[test]
    fn company_totals_headcount_weighted() {
        // Two roles, headcount 2 each: total OTE should be 600k
        let contract = NumericalContract {
            roles: vec![role("ae"), role("am")],
            company_level: Some(CompanyLevel {
                total_ote_at_target: Some(500_000.0),
                ..CompanyLevel::default()
            }),
            ..NumericalContract::default()
        };

        let validation = validate_contract(&contract);
        assert!(!validation.valid);
        let finding = validation
            .errors
            .iter()
            .find(|f| f.field == "company_level.total_ote_at_target")
            .unwrap();
        assert_eq!(finding.fix.as_ref().unwrap()["total_ote_at_target"], 600_000.0);
    }

    #[test]
    fn earnings_regression_warns_not_errors() {
        let mut r = role("ae");
        r.earnings_at_80pct = Some(140_000.0);
        r.earnings_at_120pct = Some(130_000.0);
        r.earnings_at_150pct = Some(200_000.0);

        let contract = NumericalContract {
            roles: vec![r],
            ..NumericalContract::default()
        };
        let validation = validate_contract(&contract);
        assert!(validation.valid);
        assert!(validation.warnings.iter().any(|f| f.field == "ae.earnings"));
    }
}
