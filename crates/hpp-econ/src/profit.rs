//! Target-profit sales volume and profit projection.

use crate::ceil_units;
use hpp_core::numfmt::amount;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

/// Inputs for solving the monthly sales volume that reaches a profit goal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SalesTarget {
    pub selling_price: Decimal,
    pub variable_cost_per_unit: Decimal,
    /// Sum of the monthly fixed cost lines.
    pub total_fixed_cost_per_month: Decimal,
    /// Allocated fixed cost per unit, possibly with manual overrides.
    pub fixed_cost_per_unit: Decimal,
    pub target_sales_per_month: Decimal,
    /// Desired net profit per month.
    pub target_profit: Decimal,
}

impl SalesTarget {
    /// Monthly fixed cost used by the solver. When a per-unit allocation and
    /// a sales target are both positive their product wins, so manual
    /// allocations carry through; otherwise the plain monthly total.
    pub fn monthly_fixed_cost(&self) -> Decimal {
        if self.fixed_cost_per_unit > Decimal::ZERO && self.target_sales_per_month > Decimal::ZERO
        {
            self.fixed_cost_per_unit
                .saturating_mul(self.target_sales_per_month)
        } else {
            self.total_fixed_cost_per_month
        }
    }
}

/// Revenue, cost and profit for a given monthly volume.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitProjection {
    pub units: u64,
    #[serde(serialize_with = "amount::or_zero::serialize")]
    pub revenue: Decimal,
    #[serde(serialize_with = "amount::or_zero::serialize")]
    pub total_cost: Decimal,
    #[serde(serialize_with = "amount::or_zero::serialize")]
    pub net_profit: Decimal,
}

/// Volume needed for a profit goal, with the resulting projection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesPlan {
    #[serde(serialize_with = "amount::or_zero::serialize")]
    pub contribution_margin: Decimal,
    #[serde(serialize_with = "amount::or_zero::serialize")]
    pub fixed_cost_per_month: Decimal,
    pub units_per_month: u64,
    /// Daily pace, not rounded.
    #[serde(serialize_with = "amount::or_zero::serialize")]
    pub units_per_day: Decimal,
    #[serde(serialize_with = "amount::or_zero::serialize")]
    pub potential_revenue: Decimal,
    #[serde(serialize_with = "amount::or_zero::serialize")]
    pub total_production_cost: Decimal,
    #[serde(serialize_with = "amount::or_zero::serialize")]
    pub projected_net_profit: Decimal,
}

/// Profit for selling `units` in a month.
pub fn project_profit(
    selling_price: Decimal,
    variable_cost_per_unit: Decimal,
    fixed_cost_per_month: Decimal,
    units: u64,
) -> ProfitProjection {
    let qty = Decimal::from(units);
    let revenue = selling_price.saturating_mul(qty);
    let total_cost = variable_cost_per_unit
        .saturating_mul(qty)
        .saturating_add(fixed_cost_per_month);
    ProfitProjection {
        units,
        revenue,
        total_cost,
        net_profit: revenue.saturating_sub(total_cost),
    }
}

/// Monthly sales volume reaching `target.target_profit`.
///
/// `None` when the contribution margin or the profit goal is not positive;
/// that is the "not enough data" state, not an error. The projected profit
/// is never below the goal because the volume is rounded up.
pub fn solve_target_sales(target: &SalesTarget, days_per_month: u32) -> Option<SalesPlan> {
    let contribution_margin = target
        .selling_price
        .saturating_sub(target.variable_cost_per_unit);
    if contribution_margin <= Decimal::ZERO || target.target_profit <= Decimal::ZERO {
        debug!(%contribution_margin, target_profit = %target.target_profit, "no sales plan");
        return None;
    }
    let fixed = target.monthly_fixed_cost();
    let needed = fixed
        .saturating_add(target.target_profit)
        .checked_div(contribution_margin)?;
    let units_per_month = ceil_units(needed);
    let projection = project_profit(
        target.selling_price,
        target.variable_cost_per_unit,
        fixed,
        units_per_month,
    );
    let units_per_day = Decimal::from(units_per_month)
        .checked_div(Decimal::from(days_per_month))
        .unwrap_or(Decimal::ZERO);
    Some(SalesPlan {
        contribution_margin,
        fixed_cost_per_month: fixed,
        units_per_month,
        units_per_day,
        potential_revenue: projection.revenue,
        total_production_cost: projection.total_cost,
        projected_net_profit: projection.net_profit,
    })
}

/// Units needed to earn `target_profit` at a fixed profit per unit.
/// Zero when the per-unit profit is not positive.
pub fn sales_needed(target_profit: Decimal, profit_per_unit: Decimal) -> u64 {
    if profit_per_unit <= Decimal::ZERO {
        return 0;
    }
    target_profit
        .checked_div(profit_per_unit)
        .map(ceil_units)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn example() -> SalesTarget {
        SalesTarget {
            selling_price: Decimal::from(20_000),
            variable_cost_per_unit: Decimal::from(5_000),
            total_fixed_cost_per_month: Decimal::from(3_000_000),
            target_profit: Decimal::from(5_000_000),
            ..Default::default()
        }
    }

    #[test]
    fn solves_example_plan() {
        let plan = solve_target_sales(&example(), 30).unwrap();
        assert_eq!(plan.contribution_margin, Decimal::from(15_000));
        assert_eq!(plan.units_per_month, 534);
        assert_eq!(plan.units_per_day, Decimal::new(178, 1));
        assert_eq!(plan.potential_revenue, Decimal::from(10_680_000));
        assert_eq!(plan.total_production_cost, Decimal::from(5_670_000));
        assert_eq!(plan.projected_net_profit, Decimal::from(5_010_000));
    }

    #[test]
    fn allocation_times_target_replaces_total() {
        let target = SalesTarget {
            fixed_cost_per_unit: Decimal::from(2_000),
            target_sales_per_month: Decimal::from(1_000),
            ..example()
        };
        assert_eq!(target.monthly_fixed_cost(), Decimal::from(2_000_000));
        let plan = solve_target_sales(&target, 30).unwrap();
        // (2.000.000 + 5.000.000) / 15.000 = 466,67
        assert_eq!(plan.units_per_month, 467);
    }

    #[test]
    fn no_plan_without_margin_or_goal() {
        let mut t = example();
        t.selling_price = Decimal::from(5_000);
        assert_eq!(solve_target_sales(&t, 30), None);
        let mut t = example();
        t.target_profit = Decimal::ZERO;
        assert_eq!(solve_target_sales(&t, 30), None);
    }

    #[test]
    fn projects_profit_for_volume() {
        let p = project_profit(
            Decimal::from(20_000),
            Decimal::from(5_000),
            Decimal::from(3_000_000),
            200,
        );
        assert_eq!(p.revenue, Decimal::from(4_000_000));
        assert_eq!(p.total_cost, Decimal::from(4_000_000));
        assert_eq!(p.net_profit, Decimal::ZERO);
    }

    #[test]
    fn sales_needed_rounds_up() {
        assert_eq!(sales_needed(Decimal::from(5_000_000), Decimal::from(5_500)), 910);
        assert_eq!(sales_needed(Decimal::from(5_000_000), Decimal::ZERO), 0);
        assert_eq!(sales_needed(Decimal::from(5_000_000), Decimal::from(-10)), 0);
        assert_eq!(sales_needed(Decimal::ZERO, Decimal::from(5_500)), 0);
    }

    proptest! {
        #[test]
        fn plan_meets_goal(
            price in 1i64..1_000_000,
            vc in 0i64..1_000_000,
            fixed in 0i64..1_000_000_000,
            goal in 1i64..1_000_000_000,
        ) {
            let t = SalesTarget {
                selling_price: Decimal::from(price),
                variable_cost_per_unit: Decimal::from(vc),
                total_fixed_cost_per_month: Decimal::from(fixed),
                target_profit: Decimal::from(goal),
                ..Default::default()
            };
            match solve_target_sales(&t, 30) {
                Some(plan) => prop_assert!(plan.projected_net_profit >= Decimal::from(goal)),
                None => prop_assert!(price <= vc),
            }
        }
    }
}
