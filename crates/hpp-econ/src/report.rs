//! Single evaluation pass over one product's inputs.
//!
//! Everything is recomputed from scratch on each call; nothing is cached.

use crate::bep::{compute_bep, days_to_break_even};
use crate::hpp::hpp_for_context;
use crate::pricing::{price_recommendations, profit_per_unit};
use crate::profit::{sales_needed, solve_target_sales, SalesPlan, SalesTarget};
use crate::simulation::simulate;
use hpp_core::numfmt::amount;
use hpp_core::{
    BepResult, CalcConfig, CostingContext, HppBreakdown, PriceChoice, PriceOverrides, PriceTiers,
    SimulationRow,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

/// Inputs of one evaluation pass.
#[derive(Clone, Debug)]
pub struct Evaluation<'a> {
    pub context: &'a CostingContext,
    pub price: PriceChoice,
    pub target_profit: Option<Decimal>,
    pub daily_sales: Option<Decimal>,
    pub overrides: Option<&'a PriceOverrides>,
    pub config: CalcConfig,
}

impl<'a> Evaluation<'a> {
    pub fn new(context: &'a CostingContext) -> Self {
        Self {
            context,
            price: PriceChoice::default(),
            target_profit: None,
            daily_sales: None,
            overrides: None,
            config: CalcConfig::default(),
        }
    }

    pub fn price(mut self, price: PriceChoice) -> Self {
        self.price = price;
        self
    }

    pub fn target_profit(mut self, target_profit: Option<Decimal>) -> Self {
        self.target_profit = target_profit;
        self
    }

    pub fn daily_sales(mut self, daily_sales: Option<Decimal>) -> Self {
        self.daily_sales = daily_sales;
        self
    }

    pub fn overrides(mut self, overrides: Option<&'a PriceOverrides>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn config(mut self, config: CalcConfig) -> Self {
        self.config = config;
        self
    }
}

/// Every figure derived from one evaluation pass.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostingReport {
    pub hpp: HppBreakdown,
    pub prices: PriceTiers,
    #[serde(serialize_with = "amount::or_zero::serialize")]
    pub selected_price: Decimal,
    #[serde(serialize_with = "amount::or_zero::serialize")]
    pub profit_per_unit: Decimal,
    pub bep: BepResult,
    pub days_to_bep: Option<u64>,
    /// Units to reach the profit goal at `profit_per_unit`.
    pub sales_needed: u64,
    pub sales_plan: Option<SalesPlan>,
    pub simulation: Vec<SimulationRow>,
}

fn resolve_price(choice: PriceChoice, tiers: &PriceTiers) -> Decimal {
    match choice {
        PriceChoice::Tier(kind) => tiers.get(kind).price,
        PriceChoice::Amount(amount) => amount,
    }
}

/// Run every calculator over one set of inputs.
///
/// Price-dependent figures (BEP, profit, simulation) stay empty until a
/// positive selling price is selected.
pub fn evaluate(input: &Evaluation<'_>) -> CostingReport {
    let ctx = input.context;
    let hpp = hpp_for_context(ctx);
    let prices = price_recommendations(hpp.hpp, input.overrides);
    let selected_price = resolve_price(input.price, &prices);

    if selected_price <= Decimal::ZERO {
        debug!(hpp = %hpp.hpp, "no selling price selected");
        return CostingReport {
            hpp,
            prices,
            selected_price: Decimal::ZERO,
            profit_per_unit: Decimal::ZERO,
            bep: BepResult::invalid(),
            days_to_bep: None,
            sales_needed: 0,
            sales_plan: None,
            simulation: Vec::new(),
        };
    }

    let bep = compute_bep(&ctx.fixed_costs, selected_price, hpp.variable_cost_per_unit);
    let days_to_bep = input
        .daily_sales
        .and_then(|daily| days_to_break_even(&bep, daily));
    let per_unit = profit_per_unit(hpp.hpp, selected_price);
    let goal = input.target_profit.filter(|p| *p > Decimal::ZERO);
    let sales_plan = goal.and_then(|target_profit| {
        let target = SalesTarget {
            selling_price: selected_price,
            variable_cost_per_unit: hpp.variable_cost_per_unit,
            total_fixed_cost_per_month: hpp.total_fixed_cost_per_month,
            fixed_cost_per_unit: hpp.fixed_cost_per_unit,
            target_sales_per_month: ctx.target_sales_per_month,
            target_profit,
        };
        solve_target_sales(&target, input.config.days_per_month)
    });
    let simulation = simulate(
        selected_price,
        hpp.variable_cost_per_unit,
        &ctx.fixed_costs,
        input.config.max_units,
    );

    debug!(
        hpp = %hpp.hpp,
        price = %selected_price,
        bep_unit = bep.bep_unit,
        bep_valid = bep.is_valid,
        "costing evaluated"
    );

    CostingReport {
        hpp,
        prices,
        selected_price,
        profit_per_unit: per_unit,
        bep,
        days_to_bep,
        sales_needed: goal.map_or(0, |g| sales_needed(g, per_unit)),
        sales_plan,
        simulation,
    }
}
