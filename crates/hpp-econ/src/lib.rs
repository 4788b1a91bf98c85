#![deny(warnings)]

//! Costing models: production cost, pricing and break-even helpers.
//!
//! This crate provides total (never failing) calculators for:
//! - Variable and fixed cost aggregation with per-line allocation overrides
//! - Unit production cost (HPP)
//! - Margin-tier price recommendations with external overrides
//! - Break-even point and days to break even
//! - Target-profit sales volume and profit projection
//! - A sampled revenue/cost/profit simulation table
//!
//! Invalid or missing inputs degrade to zero, `None`, or an `is_valid: false`
//! record instead of an error.

pub mod bep;
pub mod costs;
pub mod hpp;
pub mod pricing;
pub mod profit;
pub mod report;
pub mod simulation;

pub use bep::{break_even, compute_bep, days_to_break_even};
pub use costs::{
    allocated_fixed_cost_per_unit, sum_fixed_costs, sum_variable_costs, variable_item_cost,
};
pub use hpp::{compute_hpp, hpp_for_context};
pub use pricing::{apply_overrides, price_recommendations, profit_per_unit, recommend_prices};
pub use profit::{project_profit, sales_needed, solve_target_sales, SalesPlan, SalesTarget};
pub use report::{evaluate, CostingReport, Evaluation};
pub use simulation::{simulate, simulate_with_total, DEFAULT_MAX_UNITS};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Smallest whole unit count `>= value`; non-positive values give zero.
pub(crate) fn ceil_units(value: Decimal) -> u64 {
    if value <= Decimal::ZERO {
        return 0;
    }
    value.ceil().to_u64().unwrap_or(u64::MAX)
}
