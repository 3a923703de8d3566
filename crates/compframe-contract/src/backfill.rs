//! Contract backfiller
//!
//! Compact generation mode omits derived and display fields to conserve
//! output tokens. The backfiller completes the contract in place so every
//! downstream consumer sees the full shape: pay splits, display strings,
//! attainment earnings, ramp schedules and company totals.
//!
//! Runs once, after auto-fix and before any group consumes the contract.

use crate::types::{AcceleratorTier, CompanyLevel, NumericalContract, RampMonth};

/// Guarantee step-down for synthesized ramps: full draw in month one,
/// tapering until it ends.
const RAMP_GUARANTEE_LADDER: [f64; 3] = [100.0, 75.0, 50.0];

/// Blended payout multiplier for the attainment span above 100%.
///
/// Attainment above target can cross several accelerator tiers at once, so a
/// single cliff-edge multiplier understates or overstates the payout. This
/// walks the tiers in threshold order, clips each tier's span to the portion
/// between 100% and `attainment_pct`, and weights each tier's multiplier by
/// the width it covers. Any span past the last tier extends that tier's
/// multiplier.
///
/// Returns `1.0` when there are no tiers or attainment is at or below 100%.
#[must_use]
pub fn weighted_effective_multiplier(tiers: &[AcceleratorTier], attainment_pct: f64) -> f64 {
    if tiers.is_empty() || attainment_pct <= 100.0 {
        return 1.0;
    }

    let above_target = attainment_pct - 100.0;
    let mut weighted_sum = 0.0;
    let mut covered = 0.0;

    for tier in tiers {
        let lo = (tier.min_attainment_pct - 100.0).max(0.0);
        let hi = tier
            .max_attainment_pct
            .map_or(above_target, |m| m - 100.0)
            .min(above_target);
        let width = (hi - lo).max(0.0);
        weighted_sum += width * tier.multiplier;
        covered += width;
    }

    if covered < above_target {
        if let Some(last) = tiers.last() {
            weighted_sum += (above_target - covered) * last.multiplier;
        }
    }

    weighted_sum / above_target
}

/// Synthesize a linear ramp schedule from a duration in months.
///
/// Month `m` of `n` ramps quota as `100 * m / n` (capped at 100) and steps
/// the guarantee down 100 -> 75 -> 50 -> 0, with the final month always
/// forced to 0% guarantee.
#[must_use]
pub fn synthesize_ramp(ramp_months: u32) -> Vec<RampMonth> {
    (1..=ramp_months)
        .map(|month| {
            let quota_pct = ((100 * month) / ramp_months).min(100) as f64;
            let guarantee_pct = if month == ramp_months {
                0.0
            } else {
                RAMP_GUARANTEE_LADDER
                    .get(month as usize - 1)
                    .copied()
                    .unwrap_or(0.0)
            };
            RampMonth {
                month,
                quota_pct,
                guarantee_pct,
            }
        })
        .collect()
}

/// Format a multiplier for display, e.g. `1.25x`
#[must_use]
pub fn format_multiplier(multiplier: f64) -> String {
    format!("{multiplier}x")
}

/// Format a currency amount compactly, e.g. `$900K` or `$1.2M`
#[must_use]
pub fn format_compact_currency(amount: f64) -> String {
    if amount.abs() >= 1_000_000.0 {
        let millions = (amount / 100_000.0).round() / 10.0;
        format!("${millions}M")
    } else if amount.abs() >= 1_000.0 {
        format!("${}K", (amount / 1_000.0).round())
    } else {
        format!("${amount}")
    }
}

#[inline]
fn absent(v: Option<f64>) -> bool {
    v.filter(|x| *x != 0.0).is_none()
}

/// Complete a compact contract in place.
///
/// Fills only fields the generator omitted; pre-existing values, including
/// pre-existing company-level totals, are never overridden.
pub fn backfill_contract(contract: &mut NumericalContract) {
    for role in &mut contract.roles {
        let ote = role.ote.filter(|o| *o != 0.0);

        // Pay split from OTE x mix
        if let (Some(ote), Some(base_pct)) = (ote, role.base_pct) {
            if absent(role.base_salary) {
                role.base_salary = Some((ote * base_pct / 100.0).round());
            }
            if absent(role.target_variable) {
                role.target_variable = Some(ote - role.base_salary.unwrap_or(0.0));
            }
        }

        // Display strings
        if role.pay_mix_display.is_none() {
            if let (Some(base_pct), Some(variable_pct)) = (role.base_pct, role.variable_pct) {
                role.pay_mix_display = Some(format!("{base_pct}/{variable_pct}"));
            }
        }
        for measure in &mut role.measures {
            if measure.weight_display.is_none() {
                if let Some(weight) = measure.weight_pct {
                    measure.weight_display = Some(format!("{weight}%"));
                }
            }
        }
        for tier in &mut role.accelerator_tiers {
            if tier.multiplier_display.is_none() {
                tier.multiplier_display = Some(format_multiplier(tier.multiplier));
            }
        }
        if role.quota_display.is_none() {
            if let Some(quota) = role.annual_quota.filter(|q| *q != 0.0) {
                role.quota_display = Some(format!("{} annual", format_compact_currency(quota)));
            }
        }

        // Attainment earnings
        let base = role.base_salary.unwrap_or(0.0);
        let variable = role.target_variable.unwrap_or(0.0);
        if let Some(ote) = ote {
            if absent(role.earnings_at_100pct) {
                role.earnings_at_100pct = Some(ote);
            }
        }
        if absent(role.earnings_at_80pct) && (base != 0.0 || variable != 0.0) {
            role.earnings_at_80pct = Some(base + (variable * 0.8).round());
        }
        if absent(role.earnings_at_120pct) && (base != 0.0 || variable != 0.0) {
            let multiplier = weighted_effective_multiplier(&role.accelerator_tiers, 120.0);
            role.earnings_at_120pct = Some(base + (variable * 1.2 * multiplier).round());
        }
        if absent(role.earnings_at_150pct) && (base != 0.0 || variable != 0.0) {
            let multiplier = weighted_effective_multiplier(&role.accelerator_tiers, 150.0);
            role.earnings_at_150pct = Some(base + (variable * 1.5 * multiplier).round());
        }

        // Ramp schedule from duration
        if role.ramp_schedule.is_empty() {
            if let Some(months) = role.ramp_months.filter(|m| *m > 0) {
                role.ramp_schedule = synthesize_ramp(months);
            }
        }
    }

    // Company totals from the now-complete roles, headcount-weighted.
    // Fill-if-absent only.
    let mut total_ote = 0.0;
    let mut total_base = 0.0;
    let mut total_variable = 0.0;
    let mut total_headcount = 0.0;
    let mut total_cost_80 = 0.0;
    let mut total_cost_120 = 0.0;
    let mut total_cost_150 = 0.0;
    for role in &contract.roles {
        let weight = role.headcount_weight();
        total_ote += role.ote.unwrap_or(0.0) * weight;
        total_base += role.base_salary.unwrap_or(0.0) * weight;
        total_variable += role.target_variable.unwrap_or(0.0) * weight;
        total_headcount += weight;
        total_cost_80 += role.earnings_at_80pct.unwrap_or(0.0) * weight;
        total_cost_120 += role.earnings_at_120pct.unwrap_or(0.0) * weight;
        total_cost_150 += role.earnings_at_150pct.unwrap_or(0.0) * weight;
    }

    let company = contract
        .company_level
        .get_or_insert_with(CompanyLevel::default);
    if absent(company.total_ote_at_target) {
        company.total_ote_at_target = Some(total_ote);
    }
    if absent(company.total_base_salary) {
        company.total_base_salary = Some(total_base);
    }
    if absent(company.total_variable_at_target) {
        company.total_variable_at_target = Some(total_variable);
    }
    if absent(company.total_headcount) {
        company.total_headcount = Some(total_headcount);
    }
    if absent(company.total_cost_80pct) {
        company.total_cost_80pct = Some(total_cost_80);
    }
    if absent(company.total_cost_120pct) {
        company.total_cost_120pct = Some(total_cost_120);
    }
    if absent(company.total_cost_150pct) {
        company.total_cost_150pct = Some(total_cost_150);
    }
    if absent(company.cost_of_sales_pct) {
        if let Some(revenue) = company.target_revenue.filter(|r| *r > 0.0) {
            let pct = (total_ote / revenue * 1000.0).round() / 10.0;
            company.cost_of_sales_pct = Some(pct);
        }
    }
    if company.cost_of_sales_display.is_none() {
        if let Some(pct) = company.cost_of_sales_pct {
            company.cost_of_sales_display = Some(format!("{pct}%"));
        }
    }
}
