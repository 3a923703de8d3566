//! Contract auto-fixer
//!
//! Deterministic repair of critical arithmetic errors. Recomputes from role
//! data rather than consuming validator findings, so a fix pass never
//! depends on which checks fired. Returns a new contract; the input is not
//! mutated.

use crate::types::{NumericalContract, SDR_OTE_FLOOR};

/// Blended variable multiplier assumed at 120% attainment when no better
/// figure exists (rough accelerator average).
const APPROX_VARIABLE_MULTIPLIER_120: f64 = 1.3;
/// Blended variable multiplier assumed at 150% attainment.
const APPROX_VARIABLE_MULTIPLIER_150: f64 = 1.8;

/// Repair the mechanically correctable errors in a numeric contract.
///
/// Applies safe math corrections only:
/// - `base_salary`/`target_variable` recomputed from `ote` x `base_pct`,
///   guaranteeing an exact sum rather than one within tolerance
/// - `earnings_at_100pct` pinned to `ote`
/// - the SDR OTE floor raised to exactly $70K, with dependent fields
///   recomputed from the new OTE
/// - company-level totals recomputed headcount-weighted from the fixed roles
///
/// The 120%/150% company cost figures are filled with fixed blended
/// multipliers only when absent; the backfiller's per-role weighted
/// calculation is authoritative when both run.
#[must_use]
pub fn auto_fix_contract(contract: &NumericalContract) -> NumericalContract {
    let mut fixed = contract.clone();

    for role in &mut fixed.roles {
        // OTE = base + variable, exactly
        if let (Some(ote), Some(base_pct)) = (role.ote.filter(|o| *o != 0.0), role.base_pct) {
            let base = (ote * base_pct / 100.0).round();
            role.base_salary = Some(base);
            role.target_variable = Some(ote - base);
        }

        if let Some(ote) = role.ote.filter(|o| *o != 0.0) {
            role.earnings_at_100pct = Some(ote);
        }

        // SDR floor
        if role.is_sdr() {
            if let Some(ote) = role.ote.filter(|o| *o != 0.0) {
                if ote < SDR_OTE_FLOOR {
                    role.ote = Some(SDR_OTE_FLOOR);
                    if let Some(base_pct) = role.base_pct {
                        let base = (SDR_OTE_FLOOR * base_pct / 100.0).round();
                        role.base_salary = Some(base);
                        role.target_variable = Some(SDR_OTE_FLOOR - base);
                    }
                    role.earnings_at_100pct = Some(SDR_OTE_FLOOR);
                }
            }
        }
    }

    // Recompute company-level totals from the fixed roles
    let mut total_ote = 0.0;
    let mut total_base = 0.0;
    let mut total_variable = 0.0;
    let mut total_headcount = 0.0;
    for role in &fixed.roles {
        let weight = role.headcount_weight();
        total_ote += role.ote.unwrap_or(0.0) * weight;
        total_base += role.base_salary.unwrap_or(0.0) * weight;
        total_variable += role.target_variable.unwrap_or(0.0) * weight;
        total_headcount += weight;
    }

    if let Some(company) = &mut fixed.company_level {
        company.total_ote_at_target = Some(total_ote);
        company.total_base_salary = Some(total_base);
        company.total_variable_at_target = Some(total_variable);

        // At 80% attainment base stays fixed and variable pays at 0.8x
        company.total_cost_80pct = Some(total_base + (total_variable * 0.8).round());

        // Above target the true cost depends on accelerator tiers; fill a
        // conservative blended estimate only when the generator omitted it
        if company.total_cost_120pct.filter(|c| *c != 0.0).is_none() {
            company.total_cost_120pct =
                Some(total_base + (total_variable * APPROX_VARIABLE_MULTIPLIER_120).round());
        }
        if company.total_cost_150pct.filter(|c| *c != 0.0).is_none() {
            company.total_cost_150pct =
                Some(total_base + (total_variable * APPROX_VARIABLE_MULTIPLIER_150).round());
        }

        company.total_headcount = Some(total_headcount);
    }

    fixed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CompanyLevel, ContractRole};
    use crate::validate::validate_contract;

    fn sdr_below_floor() -> NumericalContract {
        NumericalContract {
            roles: vec![ContractRole {
                role_key: "sdr".to_string(),
                base_role: Some("sdr".to_string()),
                ote: Some(60_000.0),
                base_pct: Some(65.0),
                variable_pct: Some(35.0),
                base_salary: Some(40_000.0),
                target_variable: Some(21_000.0),
                headcount: Some(3.0),
                ..ContractRole::default()
            }],
            company_level: Some(CompanyLevel::default()),
            ..NumericalContract::default()
        }
    }

    #[test]
    fn sdr_floor_raised_and_split_recomputed() {
        let fixed = auto_fix_contract(&sdr_below_floor());
        let role = &fixed.roles[0];

        assert_eq!(role.ote, Some(70_000.0));
        assert_eq!(role.base_salary, Some(45_500.0));
        assert_eq!(role.target_variable, Some(24_500.0));
        assert_eq!(role.earnings_at_100pct, Some(70_000.0));
        // Exact sum, not merely within tolerance
        assert_eq!(
            role.base_salary.unwrap() + role.target_variable.unwrap(),
            70_000.0
        );
    }

    #[test]
    fn company_totals_recomputed_headcount_weighted() {
        let fixed = auto_fix_contract(&sdr_below_floor());
        let company = fixed.company_level.unwrap();

        assert_eq!(company.total_ote_at_target, Some(210_000.0));
        assert_eq!(company.total_base_salary, Some(136_500.0));
        assert_eq!(company.total_variable_at_target, Some(73_500.0));
        assert_eq!(company.total_headcount, Some(3.0));
        // 80% cost is exact: base + 0.8 x variable
        assert_eq!(company.total_cost_80pct, Some(136_500.0 + 58_800.0));
    }

    #[test]
    fn above_target_costs_filled_only_when_absent() {
        let mut contract = sdr_below_floor();
        contract.company_level.as_mut().unwrap().total_cost_120pct = Some(999_999.0);

        let fixed = auto_fix_contract(&contract);
        let company = fixed.company_level.unwrap();
        assert_eq!(company.total_cost_120pct, Some(999_999.0));
        // 150% was absent and gets the blended estimate
        assert_eq!(
            company.total_cost_150pct,
            Some(136_500.0 + (73_500.0_f64 * 1.8).round())
        );
    }

    #[test]
    fn fix_then_validate_has_no_criticals() {
        let mut contract = sdr_below_floor();
        // Add a broken non-SDR role too
        contract.roles.push(ContractRole {
            role_key: "ae".to_string(),
            ote: Some(150_000.0),
            base_pct: Some(50.0),
            variable_pct: Some(50.0),
            base_salary: Some(90_000.0),
            target_variable: Some(75_000.0),
            earnings_at_100pct: Some(140_000.0),
            headcount: Some(2.0),
            ..ContractRole::default()
        });

        let fixed = auto_fix_contract(&contract);
        let validation = validate_contract(&fixed);
        assert!(validation.valid, "errors: {:?}", validation.error_messages());
    }

    #[test]
    fn fix_is_idempotent() {
        let once = auto_fix_contract(&sdr_below_floor());
        let twice = auto_fix_contract(&once);

        assert_eq!(
            serde_json::to_value(&once).unwrap(),
            serde_json::to_value(&twice).unwrap()
        );
    }

    #[test]
    fn input_not_mutated() {
        let contract = sdr_below_floor();
        let _ = auto_fix_contract(&contract);
        assert_eq!(contract.roles[0].ote, Some(60_000.0));
    }
}
