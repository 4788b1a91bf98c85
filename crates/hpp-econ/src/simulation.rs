//! Sampled revenue, cost and profit over a range of monthly volumes.

use crate::costs::sum_fixed_costs;
use hpp_core::{FixedCostItem, SimulationRow};
use rust_decimal::Decimal;

/// Default upper bound of the table.
pub const DEFAULT_MAX_UNITS: u64 = 1500;

/// Approximate number of sampled steps.
const SAMPLE_STEPS: u64 = 50;

/// Distance between sampled volumes, never below one unit.
pub fn sample_step(max_units: u64) -> u64 {
    (max_units / SAMPLE_STEPS).max(1)
}

/// Simulation table against a monthly fixed cost total. Rows run from zero
/// to `max_units` inclusive in steps of [`sample_step`].
pub fn simulate_with_total(
    selling_price: Decimal,
    variable_cost_per_unit: Decimal,
    total_fixed_cost: Decimal,
    max_units: u64,
) -> Vec<SimulationRow> {
    let step = sample_step(max_units);
    let capacity = usize::try_from(max_units / step + 1).unwrap_or(0);
    let mut rows = Vec::with_capacity(capacity);
    let mut units = 0u64;
    loop {
        let qty = Decimal::from(units);
        let revenue = qty.saturating_mul(selling_price);
        let variable_cost = qty.saturating_mul(variable_cost_per_unit);
        let total_cost = variable_cost.saturating_add(total_fixed_cost);
        rows.push(SimulationRow {
            units,
            revenue,
            variable_cost,
            fixed_cost: total_fixed_cost,
            total_cost,
            profit: revenue.saturating_sub(total_cost),
        });
        match units.checked_add(step) {
            Some(next) if next <= max_units => units = next,
            _ => break,
        }
    }
    rows
}

/// Simulation table for itemized fixed costs. The fixed cost in every row is
/// the monthly total, not the per-unit allocation.
///
/// Example:
/// let rows = simulate(Decimal::from(20_000), Decimal::from(5_000), &fixed, DEFAULT_MAX_UNITS);
/// assert_eq!(rows.len(), 51);
pub fn simulate(
    selling_price: Decimal,
    variable_cost_per_unit: Decimal,
    fixed_costs: &[FixedCostItem],
    max_units: u64,
) -> Vec<SimulationRow> {
    simulate_with_total(
        selling_price,
        variable_cost_per_unit,
        sum_fixed_costs(fixed_costs),
        max_units,
    )
}
