//! Token budget policy
//!
//! Maps the workload size (plan count) to a discrete tier, and each tier to
//! per-phase and per-group output budgets. Larger workloads need bigger
//! contract and formatting outputs; budgets are monotone non-decreasing in
//! tier for every unit of work.

use crate::phase::AnalysisPhase;
use compframe_contract::GroupId;

/// Output budget for the prose-light groups (B/C/D) at every tier
const NARRATIVE_GROUP_BUDGET: u32 = 8_192;

/// Workload size tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BudgetTier {
    /// 1-2 plans
    Small,
    /// 3-5 plans
    MidSmall,
    /// 6-12 plans
    Medium,
    /// 13+ plans
    Large,
}

impl BudgetTier {
    /// Tier for a plan count. Total: every count maps to exactly one tier.
    #[must_use]
    pub fn from_plan_count(plan_count: u32) -> Self {
        match plan_count {
            0..=2 => BudgetTier::Small,
            3..=5 => BudgetTier::MidSmall,
            6..=12 => BudgetTier::Medium,
            _ => BudgetTier::Large,
        }
    }

    /// Tier label for logs and status text
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            BudgetTier::Small => "small",
            BudgetTier::MidSmall => "mid-small",
            BudgetTier::Medium => "medium",
            BudgetTier::Large => "large",
        }
    }
}

/// Per-phase and per-group output budgets for one workload
#[derive(Debug, Clone, Copy)]
pub struct TokenBudgets {
    pub tier: BudgetTier,
}

impl TokenBudgets {
    /// Budgets for a workload of `plan_count` plans
    #[must_use]
    pub fn for_plan_count(plan_count: u32) -> Self {
        Self {
            tier: BudgetTier::from_plan_count(plan_count),
        }
    }

    /// Output budget for one analysis phase
    #[must_use]
    pub fn phase(&self, phase: AnalysisPhase) -> u32 {
        use AnalysisPhase::{Contract, Rationale, Strategy};
        use BudgetTier::{Large, Medium, MidSmall, Small};

        match (self.tier, phase) {
            (Small, Strategy | Rationale) => 12_288,
            (Small, Contract) | (MidSmall, Strategy | Contract) => 16_384,
            (MidSmall, Rationale) => 12_288,
            (Medium, Strategy | Contract) => 24_576,
            (Medium, Rationale) => 16_384,
            (Large, Strategy | Contract) => 32_768,
            (Large, Rationale) => 20_480,
        }
    }

    /// Output budget for one formatting group.
    ///
    /// The roles group and the slide-heavy communication group scale with
    /// tier; the narrative groups stay flat.
    #[must_use]
    pub fn group(&self, group: GroupId) -> u32 {
        match group {
            GroupId::A | GroupId::E => match self.tier {
                BudgetTier::Small | BudgetTier::MidSmall => 16_384,
                BudgetTier::Medium => 24_576,
                BudgetTier::Large => 32_768,
            },
            GroupId::B | GroupId::C | GroupId::D => NARRATIVE_GROUP_BUDGET,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIERS: [BudgetTier; 4] = [
        BudgetTier::Small,
        BudgetTier::MidSmall,
        BudgetTier::Medium,
        BudgetTier::Large,
    ];

    #[test]
    fn tier_boundaries() {
        assert_eq!(BudgetTier::from_plan_count(1), BudgetTier::Small);
        assert_eq!(BudgetTier::from_plan_count(2), BudgetTier::Small);
        assert_eq!(BudgetTier::from_plan_count(3), BudgetTier::MidSmall);
        assert_eq!(BudgetTier::from_plan_count(4), BudgetTier::MidSmall);
        assert_eq!(BudgetTier::from_plan_count(5), BudgetTier::MidSmall);
        assert_eq!(BudgetTier::from_plan_count(6), BudgetTier::Medium);
        assert_eq!(BudgetTier::from_plan_count(12), BudgetTier::Medium);
        assert_eq!(BudgetTier::from_plan_count(13), BudgetTier::Large);
        assert_eq!(BudgetTier::from_plan_count(25), BudgetTier::Large);
        assert_eq!(BudgetTier::from_plan_count(100), BudgetTier::Large);
    }

    #[test]
    fn labels() {
        assert_eq!(BudgetTier::Small.label(), "small");
        assert_eq!(BudgetTier::MidSmall.label(), "mid-small");
        assert_eq!(BudgetTier::Medium.label(), "medium");
        assert_eq!(BudgetTier::Large.label(), "large");
    }

    #[test]
    fn budgets_monotone_in_tier() {
        for phase in [
            AnalysisPhase::Strategy,
            AnalysisPhase::Contract,
            AnalysisPhase::Rationale,
        ] {
            let mut previous = 0;
            for tier in TIERS {
                let budget = TokenBudgets { tier }.phase(phase);
                assert!(budget >= previous, "{phase:?} shrank at {tier:?}");
                previous = budget;
            }
        }

        for group in GroupId::ALL {
            let mut previous = 0;
            for tier in TIERS {
                let budget = TokenBudgets { tier }.group(group);
                assert!(budget >= previous, "group {group} shrank at {tier:?}");
                previous = budget;
            }
        }
    }

    #[test]
    fn four_plans_select_mid_small() {
        let budgets = TokenBudgets::for_plan_count(4);
        assert_eq!(budgets.tier, BudgetTier::MidSmall);
        assert_eq!(budgets.phase(AnalysisPhase::Strategy), 16_384);
        assert_eq!(budgets.phase(AnalysisPhase::Rationale), 12_288);
        assert_eq!(budgets.group(GroupId::A), 16_384);
        assert_eq!(budgets.group(GroupId::C), 8_192);
    }

    #[test]
    fn large_tier_scales_primary_groups_only() {
        let budgets = TokenBudgets::for_plan_count(20);
        assert_eq!(budgets.group(GroupId::A), 32_768);
        assert_eq!(budgets.group(GroupId::E), 32_768);
        assert_eq!(budgets.group(GroupId::B), 8_192);
        assert_eq!(budgets.group(GroupId::D), 8_192);
    }
}
