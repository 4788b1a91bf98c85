//! Unit production cost (HPP).

use crate::costs::{allocated_fixed_cost_per_unit, sum_fixed_costs, sum_variable_costs};
use hpp_core::{CostingContext, FixedCostItem, HppBreakdown, VariableCostItem};
use rust_decimal::Decimal;

/// HPP = variable cost per unit + allocated fixed cost per unit.
///
/// Example:
/// let b = compute_hpp(&[], &[], Decimal::ZERO);
/// assert_eq!(b.hpp, Decimal::ZERO);
pub fn compute_hpp(
    variable_costs: &[VariableCostItem],
    fixed_costs: &[FixedCostItem],
    target_sales: Decimal,
) -> HppBreakdown {
    let variable_cost_per_unit = sum_variable_costs(variable_costs);
    let fixed_cost_per_unit = allocated_fixed_cost_per_unit(fixed_costs, target_sales);
    HppBreakdown {
        variable_cost_per_unit,
        fixed_cost_per_unit,
        total_fixed_cost_per_month: sum_fixed_costs(fixed_costs),
        hpp: variable_cost_per_unit.saturating_add(fixed_cost_per_unit),
    }
}

pub fn hpp_for_context(ctx: &CostingContext) -> HppBreakdown {
    compute_hpp(
        &ctx.variable_costs,
        &ctx.fixed_costs,
        ctx.target_sales_per_month,
    )
}
