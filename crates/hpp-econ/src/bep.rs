//! Break-even point.

use crate::ceil_units;
use crate::costs::sum_fixed_costs;
use hpp_core::{BepResult, FixedCostItem};
use rust_decimal::Decimal;

/// Break-even point against a monthly fixed cost total.
///
/// Invalid when the contribution margin (`selling_price -
/// variable_cost_per_unit`) is not positive: such a price never breaks even.
pub fn break_even(
    total_fixed_cost: Decimal,
    selling_price: Decimal,
    variable_cost_per_unit: Decimal,
) -> BepResult {
    let contribution_margin = selling_price.saturating_sub(variable_cost_per_unit);
    if contribution_margin <= Decimal::ZERO {
        return BepResult::invalid();
    }
    let exact = total_fixed_cost
        .checked_div(contribution_margin)
        .unwrap_or(Decimal::ZERO);
    let bep_unit = ceil_units(exact);
    BepResult {
        bep_unit,
        bep_rupiah: Decimal::from(bep_unit).saturating_mul(selling_price),
        is_valid: true,
    }
}

/// Break-even point for itemized fixed costs.
///
/// Example:
/// // 3.000.000 fixed, price 20.000, variable 5.000 -> 200 units
/// let r = compute_bep(&fixed, Decimal::from(20_000), Decimal::from(5_000));
/// assert_eq!(r.bep_unit, 200);
pub fn compute_bep(
    fixed_costs: &[FixedCostItem],
    selling_price: Decimal,
    variable_cost_per_unit: Decimal,
) -> BepResult {
    break_even(
        sum_fixed_costs(fixed_costs),
        selling_price,
        variable_cost_per_unit,
    )
}

/// Days of selling `daily_sales` units needed to reach a valid break-even
/// point. `None` for an invalid BEP or a non-positive daily pace.
pub fn days_to_break_even(bep: &BepResult, daily_sales: Decimal) -> Option<u64> {
    if !bep.is_valid || daily_sales <= Decimal::ZERO {
        return None;
    }
    let days = Decimal::from(bep.bep_unit).checked_div(daily_sales)?;
    Some(ceil_units(days))
}
